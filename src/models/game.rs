//! Match (two teams of two), Court slots and the append-only history log.

use crate::models::player::{LevelTag, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Court identity; courts are numbered from 1.
pub type CourtId = u8;

/// Four distinct players split `(team_1)` vs `(team_2)`, recorded under a level tag.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub team_1: [PlayerId; 2],
    pub team_2: [PlayerId; 2],
    pub level: LevelTag,
}

impl Match {
    pub fn new(team_1: [PlayerId; 2], team_2: [PlayerId; 2], level: LevelTag) -> Self {
        Self {
            team_1,
            team_2,
            level,
        }
    }

    pub fn players(&self) -> [PlayerId; 4] {
        [self.team_1[0], self.team_1[1], self.team_2[0], self.team_2[1]]
    }

    /// The first player named more than once, if any.
    pub fn repeated_player(&self) -> Option<PlayerId> {
        let ids = self.players();
        ids.iter()
            .enumerate()
            .find(|(i, id)| ids[i + 1..].contains(id))
            .map(|(_, &id)| id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players().contains(&id)
    }

    /// For a player in this match: their partner and both opponents.
    pub fn partner_and_opponents(&self, id: PlayerId) -> Option<(PlayerId, [PlayerId; 2])> {
        let [a, b] = self.team_1;
        let [c, d] = self.team_2;
        match id {
            x if x == a => Some((b, self.team_2)),
            x if x == b => Some((a, self.team_2)),
            x if x == c => Some((d, self.team_1)),
            x if x == d => Some((c, self.team_1)),
            _ => None,
        }
    }
}

/// A playing area holding at most one match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Court {
    pub id: CourtId,
    pub current: Option<Match>,
}

impl Court {
    pub fn new(id: CourtId) -> Self {
        Self { id, current: None }
    }

    pub fn is_free(&self) -> bool {
        self.current.is_none()
    }
}

/// Immutable log entry for one started match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub started_at: DateTime<Utc>,
    pub court: CourtId,
    pub players: [PlayerId; 4],
    /// Display names at the time the match started, same order as `players`.
    pub names: [String; 4],
    pub level: LevelTag,
}
