//! Rotating doubles court organizer: library with the match-assignment engine and session model.

pub mod logic;
pub mod models;
pub mod persistence;

pub use logic::{
    commit_match, eligible_candidates, schedule_courts, select_match, PlanState, RandomSource,
};
pub use models::{
    Court, CourtId, HistoryRecord, LevelPriority, LevelTag, Match, Player, PlayerId, Roster,
    Session, SessionConfig, SessionError,
};
pub use persistence::SnapshotError;
