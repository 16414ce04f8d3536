//! Filter → LUT registry.
//!
//! A pure, statically built table the pipeline consults before doing any GPU
//! work. Swapping LUT assets only touches this table.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::CoreError;
use crate::filter::FilterId;

/// Where a LUT texture comes from.
#[derive(Debug, Clone)]
pub enum LutSource {
    /// LUT image on disk.
    File(PathBuf),
    /// Encoded LUT image bundled in memory (e.g. `include_bytes!`).
    Encoded(Arc<[u8]>),
    /// Procedural look baked at load time.
    Preset(FilterId),
}

/// Registry state for one filter.
#[derive(Debug, Clone)]
pub enum LutSlot {
    /// The filter intentionally has no transform.
    Disabled,
    /// A LUT is expected but none has been bound yet.
    Unbound,
    /// The filter renders through this LUT.
    Bound(LutSource),
}

/// Maps every [`FilterId`] to a [`LutSlot`].
#[derive(Debug, Clone)]
pub struct LutRegistry {
    slots: HashMap<FilterId, LutSlot>,
}

impl LutRegistry {
    /// Every filter except `none` is [`LutSlot::Unbound`].
    pub fn unbound() -> Self {
        let slots = FilterId::all()
            .iter()
            .map(|f| {
                let slot = if f.is_none() {
                    LutSlot::Disabled
                } else {
                    LutSlot::Unbound
                };
                (*f, slot)
            })
            .collect();
        Self { slots }
    }

    /// Every filter except `none` bound to its procedural preset.
    pub fn builtin() -> Self {
        let mut registry = Self::unbound();
        for f in FilterId::all().iter().filter(|f| !f.is_none()) {
            registry
                .slots
                .insert(*f, LutSlot::Bound(LutSource::Preset(*f)));
        }
        registry
    }

    /// Bind `source` to `filter`, returning the previous slot.
    pub fn bind(&mut self, filter: FilterId, source: LutSource) -> Result<LutSlot, CoreError> {
        if filter.is_none() {
            return Err(CoreError::BindNone(filter));
        }
        Ok(self
            .slots
            .insert(filter, LutSlot::Bound(source))
            .unwrap_or(LutSlot::Unbound))
    }

    /// Builder form of [`bind`](Self::bind).
    pub fn with(mut self, filter: FilterId, source: LutSource) -> Result<Self, CoreError> {
        self.bind(filter, source)?;
        Ok(self)
    }

    /// Mark `filter` as expecting a LUT that is not available yet.
    pub fn unbind(&mut self, filter: FilterId) {
        if !filter.is_none() {
            self.slots.insert(filter, LutSlot::Unbound);
        }
    }

    /// Look up the slot for `filter`.
    pub fn resolve(&self, filter: FilterId) -> &LutSlot {
        static DISABLED: LutSlot = LutSlot::Disabled;
        static UNBOUND: LutSlot = LutSlot::Unbound;

        if filter.is_none() {
            return &DISABLED;
        }
        self.slots.get(&filter).unwrap_or(&UNBOUND)
    }
}

impl Default for LutRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
