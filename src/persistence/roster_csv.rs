//! CSV roster import/export and match log export.

use crate::models::{HistoryRecord, LevelTag, PlayerId, Roster, Session};
use crate::persistence::SnapshotError;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// One roster line: `name,level,active,fixed_partner`. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RosterRow {
    name: String,
    level: String,
    #[serde(default)]
    active: Option<bool>,
    /// Name of another row.
    #[serde(default)]
    fixed_partner: Option<String>,
}

#[derive(Debug, Serialize)]
struct RosterExportRow<'a> {
    name: &'a str,
    level: &'static str,
    active: bool,
    fixed_partner: &'a str,
    play_count: u32,
}

#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    timestamp: String,
    court: u8,
    level: &'static str,
    team1_player1: &'a str,
    team1_player2: &'a str,
    team2_player1: &'a str,
    team2_player2: &'a str,
}

/// Add every row to the session's roster, linking fixed partners once all rows exist.
///
/// The import is all-or-nothing: on any error the roster is left untouched.
pub fn import_roster_csv<R: Read>(session: &mut Session, reader: R) -> Result<Vec<PlayerId>, SnapshotError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut roster: Roster = session.roster.clone();
    let mut added = Vec::new();
    let mut links: Vec<(PlayerId, String)> = Vec::new();

    for row in rdr.deserialize() {
        let row: RosterRow = row?;
        let level: LevelTag = row.level.parse().map_err(SnapshotError::InvalidLevel)?;
        let id = roster.add_player(row.name, level)?;
        if row.active == Some(false) {
            roster.set_active(id, false)?;
        }
        if let Some(partner) = row.fixed_partner.filter(|n| !n.is_empty()) {
            links.push((id, partner));
        }
        added.push(id);
    }

    for (id, partner_name) in links {
        let partner = roster
            .players
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(&partner_name))
            .map(|p| p.id)
            .ok_or(SnapshotError::UnknownPartner(partner_name))?;
        if roster.fixed_partner_of(id) != Some(partner) {
            roster.set_fixed_partner(id, partner)?;
        }
    }

    session.roster = roster;
    log::info!("Imported {} player(s) from CSV", added.len());
    Ok(added)
}

pub fn export_roster_csv<W: Write>(roster: &Roster, writer: W) -> Result<(), SnapshotError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for p in &roster.players {
        let partner = p
            .fixed_partner
            .and_then(|id| roster.get(id))
            .map_or("", |q| q.name.as_str());
        wtr.serialize(RosterExportRow {
            name: &p.name,
            level: p.level.label(),
            active: p.active,
            fixed_partner: partner,
            play_count: p.play_count,
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn export_history_csv<W: Write>(history: &[HistoryRecord], writer: W) -> Result<(), SnapshotError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in history {
        let [a, b, c, d] = &record.names;
        wtr.serialize(HistoryRow {
            timestamp: record.started_at.to_rfc3339(),
            court: record.court,
            level: record.level.label(),
            team1_player1: a,
            team1_player2: b,
            team2_player1: c,
            team2_player2: d,
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
