//! CONSUMAT modes and the satisfaction/uncertainty transition.

use std::fmt;

use serde::{Deserialize, Serialize};

use gw_core::ConsumatConfig;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DecisionMode {
    /// Satisfied but uncertain: copy a peer.
    Imitation,
    /// Unsatisfied and uncertain: compare own choices against every peer's.
    #[serde(alias = "Social comparison")]
    SocialComparison,
    /// Satisfied and certain: keep last year's choices.
    Repetition,
    /// Unsatisfied and certain: optimize everything.
    Deliberation,
    /// Crop and technology pinned, otherwise deliberate.  Only reachable
    /// through an override.
    #[serde(alias = "FixCrop")]
    Fixed,
}

impl DecisionMode {
    pub const ALL: [DecisionMode; 5] = [
        DecisionMode::Imitation,
        DecisionMode::SocialComparison,
        DecisionMode::Repetition,
        DecisionMode::Deliberation,
        DecisionMode::Fixed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DecisionMode::Imitation        => "Imitation",
            DecisionMode::SocialComparison => "SocialComparison",
            DecisionMode::Repetition       => "Repetition",
            DecisionMode::Deliberation     => "Deliberation",
            DecisionMode::Fixed            => "Fixed",
        }
    }
}

impl fmt::Display for DecisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Thresholds {
    pub satisfaction: f64,
    pub uncertainty:  f64,
}

impl From<&ConsumatConfig> for Thresholds {
    fn from(c: &ConsumatConfig) -> Self {
        Self { satisfaction: c.satisfaction_threshold, uncertainty: c.uncertainty_threshold }
    }
}

/// The mode for satisfaction `s` and uncertainty `u`.
///
/// A value equal to its threshold counts as high.
pub fn transition(s: f64, u: f64, t: Thresholds) -> DecisionMode {
    match (s >= t.satisfaction, u >= t.uncertainty) {
        (true, true)   => DecisionMode::Imitation,
        (false, true)  => DecisionMode::SocialComparison,
        (true, false)  => DecisionMode::Repetition,
        (false, false) => DecisionMode::Deliberation,
    }
}
