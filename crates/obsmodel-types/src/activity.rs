//! Slew activity kinds.
//!
//! Every slew is decomposed into the same fixed set of activities. The set is
//! closed: prerequisite tables name activities through this enum, so a
//! misspelled name fails at deserialization instead of silently creating a
//! new node.

use serde::{Deserialize, Serialize};

/// One activity of a slew, as named in the `slew` configuration section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Telescope altitude motion.
    TelAlt,
    /// Telescope azimuth motion.
    TelAz,
    /// Camera rotator motion.
    TelRot,
    /// Mount settling after altitude/azimuth motion.
    TelSettle,
    /// Open-loop active optics correction.
    TelOpticsOpenLoop,
    /// Closed-loop active optics correction.
    TelOpticsClosedLoop,
    /// Dome (shutter) altitude motion.
    DomAlt,
    /// Dome azimuth motion.
    DomAz,
    /// Dome settling after azimuth motion.
    DomAzSettle,
    /// Filter wheel change.
    Filter,
    /// Readout of the previous exposure.
    Readout,
    /// Terminal node: the next exposure may start.
    Exposures,
}

impl ActivityKind {
    /// All activities, in configuration order.
    pub const ALL: [Self; 12] = [
        Self::TelAlt,
        Self::TelAz,
        Self::TelRot,
        Self::TelSettle,
        Self::TelOpticsOpenLoop,
        Self::TelOpticsClosedLoop,
        Self::DomAlt,
        Self::DomAz,
        Self::DomAzSettle,
        Self::Filter,
        Self::Readout,
        Self::Exposures,
    ];

    /// Configuration name of the activity (`prereq_<name>` keys use it).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TelAlt => "telalt",
            Self::TelAz => "telaz",
            Self::TelRot => "telrot",
            Self::TelSettle => "telsettle",
            Self::TelOpticsOpenLoop => "telopticsopenloop",
            Self::TelOpticsClosedLoop => "telopticsclosedloop",
            Self::DomAlt => "domalt",
            Self::DomAz => "domaz",
            Self::DomAzSettle => "domazsettle",
            Self::Filter => "filter",
            Self::Readout => "readout",
            Self::Exposures => "exposures",
        }
    }
}

impl core::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn serde_names_match_display_names() {
        for kind in ActivityKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn misspelled_activity_fails_to_parse() {
        let result: Result<ActivityKind, _> = serde_json::from_str("\"telaltt\"");
        assert!(result.is_err());
    }
}
