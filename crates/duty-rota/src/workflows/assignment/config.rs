use serde::{Deserialize, Serialize};

use super::fairness::FairnessConfig;

/// Knobs for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentConfig {
    /// Weeks of occurred events loaded before the target date.
    pub lookback_weeks: u32,
    /// Weeks away from a role after which its recency component saturates.
    pub rotation_window_weeks: u32,
    /// People with any assignment this many days before the target are deprioritized.
    pub recent_assignment_days: u32,
    /// Attach a fairness breakdown for every selected person to the stats.
    pub include_score_breakdowns: bool,
    /// Fixed seed for reproducible selection; `None` draws from the OS.
    pub random_seed: Option<u64>,
}

impl AssignmentConfig {
    pub fn fairness(&self) -> FairnessConfig {
        FairnessConfig {
            rotation_window_weeks: self.rotation_window_weeks,
        }
    }
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            lookback_weeks: 8,
            rotation_window_weeks: 4,
            recent_assignment_days: 30,
            include_score_breakdowns: false,
            random_seed: None,
        }
    }
}
