//! State updater: apply a started match to the roster.

use crate::models::{Match, PlayerId, Roster, SessionError};
use chrono::{DateTime, Utc};

/// Commit `m` as started at `now`.
///
/// Each of the four players gains one play, `last_played_at = now`, one pairing
/// with their partner and one meeting with each opponent. Afterwards inactive
/// players below the active average (floored) are raised to it, with the raise
/// added to their imputed count.
///
/// All four players are checked (present and distinct) before anything is mutated.
pub fn commit_match(roster: &mut Roster, m: &Match, now: DateTime<Utc>) -> Result<(), SessionError> {
    if let Some(repeated) = m.repeated_player() {
        return Err(SessionError::RepeatedPlayer(repeated));
    }
    let ids = m.players();
    if let Some(&missing) = ids.iter().find(|&&id| !roster.contains(id)) {
        return Err(SessionError::PlayerNotFound(missing));
    }
    let at = now.timestamp_millis();
    for id in ids {
        let (partner, opponents) = m
            .partner_and_opponents(id)
            .ok_or(SessionError::PlayerNotFound(id))?;
        roster
            .get_mut(id)
            .ok_or(SessionError::PlayerNotFound(id))?
            .record_match(partner, opponents, at);
    }
    impute_inactive(roster);
    Ok(())
}

/// Raise inactive players to the active average play count. Returns the players raised.
pub fn impute_inactive(roster: &mut Roster) -> Vec<PlayerId> {
    let Some(average) = roster.active_average_play_count() else {
        return Vec::new();
    };
    let mut raised = Vec::new();
    for p in roster.players.iter_mut().filter(|p| !p.active) {
        if p.play_count < average {
            p.impute_up_to(average);
            raised.push(p.id);
        }
    }
    if !raised.is_empty() {
        log::debug!("Imputed play count {} for inactive players {:?}", average, raised);
    }
    raised
}
