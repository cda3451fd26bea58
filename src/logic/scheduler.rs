//! Court scheduler: fill a batch of courts one after another.

use crate::logic::candidates::eligible_candidates;
use crate::logic::random::RandomSource;
use crate::logic::selector::select_match;
use crate::models::{Match, PlayerId, Roster, SessionConfig};
use std::collections::HashSet;

/// Select a match for each of `slots` courts in order.
///
/// Players in `busy` (already on court) and players placed on earlier slots in
/// this pass are excluded from later slots. A slot with no possible match is
/// left `None` and scheduling continues.
pub fn schedule_courts(
    roster: &Roster,
    config: &SessionConfig,
    busy: &HashSet<PlayerId>,
    slots: usize,
    rng: &mut impl RandomSource,
) -> Vec<Option<Match>> {
    let mut taken = busy.clone();
    let mut batch = Vec::with_capacity(slots);
    for slot in 0..slots {
        let pool = eligible_candidates(roster, &taken);
        let picked = select_match(&pool, config, rng);
        match &picked {
            Some(m) => taken.extend(m.players()),
            None => log::debug!(
                "No match for slot {} ({} candidates available)",
                slot + 1,
                pool.len()
            ),
        }
        batch.push(picked);
    }
    batch
}
