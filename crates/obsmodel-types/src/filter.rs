//! Filter band identifiers.
//!
//! The camera carries a small wheel of broadband filters. Only a subset is
//! mounted at any time; the rest sit in storage and must be exchanged with a
//! removable filter before they can be used.

use serde::{Deserialize, Serialize};

/// A broadband filter in the camera's filter complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Near-ultraviolet band.
    U,
    /// Green band.
    G,
    /// Red band.
    R,
    /// Near-infrared band.
    I,
    /// Infrared z band.
    Z,
    /// Infrared y band.
    Y,
}

impl Filter {
    /// Every filter in wavelength order.
    pub const ALL: [Self; 6] = [Self::U, Self::G, Self::R, Self::I, Self::Z, Self::Y];

    /// The single-letter band name used in configuration and snapshots.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::U => "u",
            Self::G => "g",
            Self::R => "r",
            Self::I => "i",
            Self::Z => "z",
            Self::Y => "y",
        }
    }
}

impl core::fmt::Display for Filter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a band name does not name a known filter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter band: {name:?}")]
pub struct ParseFilterError {
    /// The rejected band name.
    pub name: String,
}

impl core::str::FromStr for Filter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == s)
            .ok_or_else(|| ParseFilterError { name: s.to_owned() })
    }
}
