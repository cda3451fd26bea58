//! Data structures for a rotation session: players, roster, matches, courts, config.

mod config;
mod game;
mod player;
mod roster;
mod session;

pub use config::{LevelPriority, SessionConfig, MAX_COURTS, MIN_COURTS};
pub use game::{Court, CourtId, HistoryRecord, Match};
pub use player::{LevelTag, Player, PlayerId, SkillSymbol};
pub use roster::Roster;
pub use session::{Session, SessionError};
