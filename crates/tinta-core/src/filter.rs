//! Cosmetic filter identifiers offered on the photo editor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Identifies a color filter the user can pick before publishing a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterId {
    /// No color transform.
    #[default]
    None,
    /// Warmer tones (orange push, blue pulled down).
    Warm,
    /// Cooler tones (blue push, red pulled down).
    Cool,
    /// Soft magenta tint with lifted shadows.
    Pink,
    /// Golden-hour look: warm highlights, slight desaturation.
    Gold,
    /// Darker, blue-shifted night look.
    Night,
}

impl FilterId {
    /// Lowercase tag used in configs and on the command line.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Warm => "warm",
            Self::Cool => "cool",
            Self::Pink => "pink",
            Self::Gold => "gold",
            Self::Night => "night",
        }
    }

    /// Human-readable label for UI chips.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::None => "Original",
            Self::Warm => "Warm",
            Self::Cool => "Cool",
            Self::Pink => "Pink",
            Self::Gold => "Gold",
            Self::Night => "Night",
        }
    }

    /// Every filter, in picker order.
    pub fn all() -> &'static [Self] {
        const ALL: [FilterId; 6] = [
            FilterId::None,
            FilterId::Warm,
            FilterId::Cool,
            FilterId::Pink,
            FilterId::Gold,
            FilterId::Night,
        ];
        &ALL
    }

    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FilterId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|f| f.tag().eq_ignore_ascii_case(tag))
            .ok_or_else(|| CoreError::UnknownFilter(tag.to_string()))
    }
}
