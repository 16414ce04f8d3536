//! Source and output URI handling.
//!
//! Callers pass either a plain filesystem path or a `file://` URI. URIs are
//! percent-decoded on the way in; plain paths are taken literally. Output
//! URIs follow the same style as the source they were derived from.

use std::path::{Path, PathBuf};

use crate::error::AssetError;

const FILE_SCHEME: &str = "file://";

/// Resolve a source URI to a local path.
pub fn to_path(uri: &str) -> Result<PathBuf, AssetError> {
    if let Some(rest) = strip_scheme_ci(uri, FILE_SCHEME) {
        // file:///abs/path and file://localhost/abs/path
        let rest = rest.strip_prefix("localhost").unwrap_or(rest);
        let decoded = urlencoding::decode(rest).map_err(|e| AssetError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        return Ok(PathBuf::from(decoded.into_owned()));
    }
    if let Some((scheme, _)) = uri.split_once("://") {
        let is_scheme = !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if is_scheme {
            return Err(AssetError::UnsupportedScheme(scheme.to_string()));
        }
    }
    Ok(PathBuf::from(uri))
}

/// Format `path` in the same style as `like`. `file://` output has each path
/// segment percent-encoded.
pub fn from_path(path: &Path, like: &str) -> String {
    if strip_scheme_ci(like, FILE_SCHEME).is_none() {
        return path.display().to_string();
    }
    let raw = path.to_string_lossy();
    let encoded: Vec<_> = raw.split('/').map(urlencoding::encode).collect();
    format!("{FILE_SCHEME}{}", encoded.join("/"))
}

fn strip_scheme_ci<'a>(uri: &'a str, scheme: &str) -> Option<&'a str> {
    let head = uri.get(..scheme.len())?;
    head.eq_ignore_ascii_case(scheme)
        .then(|| &uri[scheme.len()..])
}
