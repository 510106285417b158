use serde::{Deserialize, Serialize};

/// Tunables for the fairness rubric. Component weights are fixed; only the
/// rotation window length is configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessConfig {
    pub rotation_window_weeks: u32,
}

impl Default for FairnessConfig {
    fn default() -> Self {
        Self {
            rotation_window_weeks: 4,
        }
    }
}
