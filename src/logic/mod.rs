//! Match-assignment engine: candidate filtering, selection, scheduling, commits, replanning.

pub mod candidates;
pub mod level_priority;
pub mod random;
pub mod replan;
pub mod scheduler;
pub mod selector;
pub mod state_update;

pub use candidates::eligible_candidates;
pub use level_priority::{select_by_level, LevelWeighting, QuadScore};
pub use random::RandomSource;
pub use replan::{PlanFingerprint, PlanState, ReplanTrigger};
pub use scheduler::schedule_courts;
pub use selector::{first_timers_by_list, select_match, select_unconstrained};
pub use state_update::{commit_match, impute_inactive};
