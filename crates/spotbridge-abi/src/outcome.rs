//! Classification codes returned by the streaming step.

use serde::{Deserialize, Serialize};

/// Result of feeding one observation to the detector.
///
/// The engine returns these as non-negative integers from `spot_step`;
/// negative values are error codes and never reach this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Observation is below the excess threshold; model unchanged apart
    /// from the sample counter.
    Normal,
    /// Observation fell in the tail; the tail model absorbed it.
    Excess,
    /// Observation crossed the anomaly threshold.
    Anomaly,
}

impl Outcome {
    /// Maps a non-negative engine code to a classification.
    ///
    /// Returns `None` for codes outside the documented `{0, 1, 2}` set so
    /// the caller can surface a contract violation instead of guessing.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Normal),
            1 => Some(Self::Excess),
            2 => Some(Self::Anomaly),
            _ => None,
        }
    }

    /// The engine-side code for this classification.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Normal => 0,
            Self::Excess => 1,
            Self::Anomaly => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for outcome in [Outcome::Normal, Outcome::Excess, Outcome::Anomaly] {
            assert_eq!(Outcome::from_code(outcome.code()), Some(outcome));
        }
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert_eq!(Outcome::from_code(3), None);
        assert_eq!(Outcome::from_code(-1), None);
    }
}
