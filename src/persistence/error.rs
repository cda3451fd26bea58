use crate::models::{PlayerId, SessionError};

/// Errors loading or saving session data.
#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    Csv(csv::Error),
    /// Snapshot written by a newer version than this build understands.
    UnsupportedVersion(u32),
    /// Level label that is not one of the six known tags.
    InvalidLevel(String),
    /// Fixed partner named in an import that matches no player.
    UnknownPartner(String),
    /// Two players in a snapshot share an id.
    DuplicatePlayerId(PlayerId),
    Session(SessionError),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Json(e) => write!(f, "Invalid JSON: {}", e),
            SnapshotError::Csv(e) => write!(f, "Invalid CSV: {}", e),
            SnapshotError::UnsupportedVersion(v) => write!(f, "Unsupported snapshot version {}", v),
            SnapshotError::InvalidLevel(l) => write!(f, "Unknown level '{}'", l),
            SnapshotError::UnknownPartner(name) => write!(f, "Fixed partner '{}' not found", name),
            SnapshotError::DuplicatePlayerId(id) => write!(f, "Player id {} appears more than once", id),
            SnapshotError::Session(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Json(e) => Some(e),
            SnapshotError::Csv(e) => Some(e),
            SnapshotError::Session(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        SnapshotError::Json(e)
    }
}

impl From<csv::Error> for SnapshotError {
    fn from(e: csv::Error) -> Self {
        SnapshotError::Csv(e)
    }
}

impl From<SessionError> for SnapshotError {
    fn from(e: SessionError) -> Self {
        SnapshotError::Session(e)
    }
}
