//! Candidate filter: who may be placed in a new match.

use crate::models::{Player, PlayerId, Roster};
use std::collections::HashSet;

/// Active players not in `busy`, in roster (display) order.
pub fn eligible_candidates<'a>(roster: &'a Roster, busy: &HashSet<PlayerId>) -> Vec<&'a Player> {
    roster
        .players
        .iter()
        .filter(|p| p.active && !busy.contains(&p.id))
        .collect()
}
