//! Persistence boundary: versioned JSON snapshots and CSV import/export.
//!
//! Everything here validates and repairs data before it reaches the engine.

mod error;
mod roster_csv;
mod snapshot;

pub use error::SnapshotError;
pub use roster_csv::{export_history_csv, export_roster_csv, import_roster_csv};
pub use snapshot::{from_json, migrate, to_json, SessionSnapshot, CURRENT_SNAPSHOT_VERSION};
