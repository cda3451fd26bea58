//! Versioned JSON snapshot of a session.
//!
//! Version history:
//! - 1: players carry a free-form `level` label and no `imputed_play_count`.
//! - 2: canonical level labels, `imputed_play_count` tracked per player.

use crate::models::{
    Court, HistoryRecord, LevelTag, Match, Player, PlayerId, Roster, Session, SessionConfig,
};
use crate::persistence::SnapshotError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

pub const CURRENT_SNAPSHOT_VERSION: u32 = 2;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub config: SessionConfig,
    pub players: Vec<Player>,
    #[serde(default)]
    pub courts: Vec<Court>,
    #[serde(default)]
    pub planned: Vec<Match>,
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
}

impl SessionSnapshot {
    pub fn capture(session: &Session) -> Self {
        Self {
            version: CURRENT_SNAPSHOT_VERSION,
            config: session.config,
            players: session.roster.players.clone(),
            courts: session.courts.clone(),
            planned: session.planned.clone(),
            history: session.history.clone(),
        }
    }

    /// Validate and repair, then build a session the engine can trust.
    pub fn into_session(self) -> Result<Session, SnapshotError> {
        let mut ids: HashSet<PlayerId> = HashSet::new();
        if let Some(dup) = self.players.iter().find(|p| !ids.insert(p.id)) {
            return Err(SnapshotError::DuplicatePlayerId(dup.id));
        }
        let mut roster = Roster::from_players(self.players);
        let repaired = roster.repair_fixed_partners();
        if repaired > 0 {
            log::warn!("Repaired {} fixed partner link(s) while loading snapshot", repaired);
        }
        let known: HashSet<PlayerId> = roster.players.iter().map(|p| p.id).collect();
        for p in &mut roster.players {
            p.pair_history.retain(|id, _| known.contains(id));
            p.match_history.retain(|id, _| known.contains(id));
        }
        Ok(Session::restore(
            roster,
            self.config,
            self.courts,
            self.planned,
            self.history,
        )?)
    }
}

pub fn to_json(session: &Session) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(&SessionSnapshot::capture(session))?)
}

/// Parse a snapshot of any supported version into a session.
pub fn from_json(json: &str) -> Result<Session, SnapshotError> {
    let mut value: Value = serde_json::from_str(json)?;
    let from = migrate(&mut value)?;
    if from != CURRENT_SNAPSHOT_VERSION {
        log::info!("Migrated snapshot from version {} to {}", from, CURRENT_SNAPSHOT_VERSION);
    }
    let snapshot: SessionSnapshot = serde_json::from_value(value)?;
    snapshot.into_session()
}

/// Upgrade a raw snapshot in place to the current version. Returns the version it started at.
/// A missing `version` field means version 1.
pub fn migrate(value: &mut Value) -> Result<u32, SnapshotError> {
    let from = value
        .get("version")
        .and_then(Value::as_u64)
        .map_or(1, |v| v as u32);
    if from > CURRENT_SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(from));
    }
    let mut version = from;
    while version < CURRENT_SNAPSHOT_VERSION {
        match version {
            1 => migrate_v1_to_v2(value)?,
            v => return Err(SnapshotError::UnsupportedVersion(v)),
        }
        version += 1;
    }
    if let Some(obj) = value.as_object_mut() {
        obj.insert("version".into(), Value::from(CURRENT_SNAPSHOT_VERSION));
    }
    Ok(from)
}

fn migrate_v1_to_v2(value: &mut Value) -> Result<(), SnapshotError> {
    let Some(players) = value.get_mut("players").and_then(Value::as_array_mut) else {
        return Ok(());
    };
    for player in players.iter_mut().filter_map(Value::as_object_mut) {
        player
            .entry("imputed_play_count")
            .or_insert_with(|| Value::from(0));
        if let Some(raw) = player.get("level").and_then(Value::as_str) {
            let level: LevelTag = raw
                .parse()
                .map_err(SnapshotError::InvalidLevel)?;
            player.insert("level".into(), Value::from(level.label()));
        }
    }
    Ok(())
}
