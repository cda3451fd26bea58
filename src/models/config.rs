//! Session configuration consumed by the scheduler.

use serde::{Deserialize, Serialize};

pub const MIN_COURTS: u8 = 1;
pub const MAX_COURTS: u8 = 8;

/// How strongly level compatibility is weighed against history-based fairness.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelPriority {
    /// Greedy fairness picks; levels ignored.
    #[default]
    None,
    /// Spread partners/opponents first, levels second.
    Weak,
    /// Levels first, spread second.
    Strong,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_court_count")]
    pub court_count: u8,
    #[serde(default)]
    pub level_priority: LevelPriority,
    /// First-timers are taken in list order for their first match.
    #[serde(default)]
    pub order_first_match_by_list: bool,
}

fn default_court_count() -> u8 {
    2
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            court_count: default_court_count(),
            level_priority: LevelPriority::None,
            order_first_match_by_list: false,
        }
    }
}

impl SessionConfig {
    pub fn is_valid(&self) -> bool {
        (MIN_COURTS..=MAX_COURTS).contains(&self.court_count)
    }
}
