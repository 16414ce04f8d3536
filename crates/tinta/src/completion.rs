//! Single-shot completion for a render job.
//!
//! A render can finish through more than one path: the backend's own result,
//! or a device-lost notification that fires when the GPU context is torn
//! down. Every path holds a clone of the same [`Completion`]; the first
//! `settle` sends the value, later ones are no-ops.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Sending half. Cheap to clone; settles at most once across all clones.
pub struct Completion<T> {
    sender: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

/// Receiving half. Resolves to `None` if every [`Completion`] was dropped
/// without settling.
pub struct CompletionReceiver<T> {
    receiver: oneshot::Receiver<T>,
}

/// Create a linked completion pair.
pub fn completion<T>() -> (Completion<T>, CompletionReceiver<T>) {
    let (tx, rx) = oneshot::channel();
    (
        Completion {
            sender: Arc::new(Mutex::new(Some(tx))),
        },
        CompletionReceiver { receiver: rx },
    )
}

impl<T> Completion<T> {
    /// Deliver `value` if nothing has been delivered yet.
    ///
    /// Returns `true` when this call won. Delivery to a receiver that has
    /// already gone away still counts as settling.
    pub fn settle(&self, value: T) -> bool {
        let Some(tx) = self.sender.lock().take() else {
            return false;
        };
        let _ = tx.send(value);
        true
    }

    pub fn is_settled(&self) -> bool {
        self.sender.lock().is_none()
    }
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T> Future for CompletionReceiver<T> {
    type Output = Option<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(Result::ok)
    }
}
