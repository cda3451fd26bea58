//! Match selector: picks one group of four from a candidate pool.
//!
//! The unconstrained mode builds a quad with four greedy picks (W, X, Y, Z),
//! each taking the lexicographically best candidate and breaking exact ties at
//! random. Teams are `(W, X)` vs `(Y, Z)`. A few quads are built this way and
//! the one with the lowest pairing cost wins.

use crate::logic::level_priority::{select_by_level, LevelWeighting};
use crate::logic::random::RandomSource;
use crate::models::{LevelPriority, Match, Player, PlayerId, SessionConfig};

/// Quads built per selection in unconstrained mode.
const UNCONSTRAINED_ATTEMPTS: usize = 4;

/// Select one match for a court from `pool`, or `None` if no quad can be formed.
pub fn select_match(
    pool: &[&Player],
    config: &SessionConfig,
    rng: &mut impl RandomSource,
) -> Option<Match> {
    if pool.len() < 4 {
        return None;
    }
    if config.order_first_match_by_list {
        if let Some(m) = first_timers_by_list(pool) {
            log::debug!("First match by list order: {:?}", m.players());
            return Some(m);
        }
    }
    match config.level_priority {
        LevelPriority::None => select_unconstrained(pool, rng),
        LevelPriority::Weak => select_by_level(pool, LevelWeighting::Weak, rng),
        LevelPriority::Strong => select_by_level(pool, LevelWeighting::Strong, rng),
    }
}

/// If at least four candidates have never played, take the first four by display order.
pub fn first_timers_by_list(pool: &[&Player]) -> Option<Match> {
    let mut fresh: Vec<&Player> = pool.iter().copied().filter(|p| p.play_count == 0).collect();
    if fresh.len() < 4 {
        return None;
    }
    fresh.sort_by_key(|p| p.order);
    Some(Match::new(
        [fresh[0].id, fresh[1].id],
        [fresh[2].id, fresh[3].id],
        fresh[0].level,
    ))
}

/// Minimum play count and last-played time over the whole pool.
#[derive(Clone, Copy, Debug)]
struct PoolMinima {
    play_count: u32,
    last_played_at: i64,
}

impl PoolMinima {
    fn of(pool: &[&Player]) -> Self {
        Self {
            play_count: pool.iter().map(|p| p.play_count).min().unwrap_or(0),
            last_played_at: pool.iter().map(|p| p.last_played_at).min().unwrap_or(0),
        }
    }

    /// 0 if the player sits at either pool minimum, else 1.
    fn rank(&self, p: &Player) -> u8 {
        u8::from(p.play_count != self.play_count && p.last_played_at != self.last_played_at)
    }
}

/// Mutual fixed partners: both sides point at each other.
fn are_fixed_partners(a: &Player, b: &Player) -> bool {
    a.fixed_partner == Some(b.id) && b.fixed_partner == Some(a.id)
}

/// `p`'s fixed partner, if that partner is still among `remaining` and the link is mutual.
fn available_partner(p: &Player, remaining: &[&Player]) -> Option<PlayerId> {
    let pid = p.fixed_partner?;
    remaining
        .iter()
        .any(|q| q.id == pid && q.fixed_partner == Some(p.id))
        .then_some(pid)
}

/// 1 if `c` has an uncommitted fixed partner other than `anchor` (picking `c` would split them).
fn splits_other_pair(c: &Player, anchor: PlayerId, remaining: &[&Player]) -> u8 {
    u8::from(available_partner(c, remaining).is_some_and(|pid| pid != anchor))
}

/// Remove and return the best candidate by `key`; ties are broken uniformly at random.
fn pick_best<'a, K: Ord>(
    remaining: &mut Vec<&'a Player>,
    rng: &mut impl RandomSource,
    key: impl Fn(&Player, &[&'a Player]) -> K,
) -> Option<&'a Player> {
    let rest: &[&'a Player] = remaining;
    let keys: Vec<K> = rest.iter().map(|p| key(p, rest)).collect();
    let best = keys.iter().min()?;
    let top: Vec<usize> = keys
        .iter()
        .enumerate()
        .filter(|(_, k)| *k == best)
        .map(|(i, _)| i)
        .collect();
    let chosen = top[rng.pick_index(top.len())];
    Some(remaining.remove(chosen))
}

/// One greedy W, X, Y, Z build. `None` if the pool runs dry.
fn build_quad<'a>(pool: &[&'a Player], rng: &mut impl RandomSource) -> Option<[&'a Player; 4]> {
    let minima = PoolMinima::of(pool);
    let mut remaining: Vec<&'a Player> = pool.to_vec();

    let w = pick_best(&mut remaining, rng, |c, _| (c.play_count, c.last_played_at))?;
    let w_partner = available_partner(w, &remaining);

    let x = pick_best(&mut remaining, rng, |c, rest| {
        (
            u8::from(w_partner != Some(c.id)),
            splits_other_pair(c, w.id, rest),
            minima.rank(c),
            c.pair_count(w.id),
            c.opponent_count(w.id),
        )
    })?;

    let y = pick_best(&mut remaining, rng, |c, _| {
        (minima.rank(c), c.shared_count(w.id), c.shared_count(x.id))
    })?;
    let y_partner = available_partner(y, &remaining);

    let z = pick_best(&mut remaining, rng, |c, rest| {
        (
            u8::from(y_partner != Some(c.id)),
            splits_other_pair(c, y.id, rest),
            minima.rank(c),
            c.pair_count(y.id),
            c.opponent_count(y.id),
            c.shared_count(w.id) + c.shared_count(x.id),
        )
    })?;

    Some([w, x, y, z])
}

/// Sum of shared history over the six pairs of a quad (teams `[0,1]` vs `[2,3]`).
/// Teammates who are honored fixed partners contribute nothing.
pub(crate) fn pairing_cost(quad: &[&Player; 4]) -> u32 {
    let mut cost = 0;
    for i in 0..4 {
        for j in (i + 1)..4 {
            let teammates = (i, j) == (0, 1) || (i, j) == (2, 3);
            if teammates && are_fixed_partners(quad[i], quad[j]) {
                continue;
            }
            cost += quad[i].shared_count(quad[j].id);
        }
    }
    cost
}

/// Unconstrained mode: best of a few greedy builds by pairing cost.
pub fn select_unconstrained(pool: &[&Player], rng: &mut impl RandomSource) -> Option<Match> {
    if pool.len() < 4 {
        return None;
    }
    let best = (0..UNCONSTRAINED_ATTEMPTS)
        .filter_map(|_| build_quad(pool, rng))
        .min_by_key(pairing_cost)?;
    let [w, x, y, z] = best;
    log::debug!(
        "Unconstrained pick ({}, {}) vs ({}, {}), cost {}",
        w.id,
        x.id,
        y.id,
        z.id,
        pairing_cost(&best)
    );
    Some(Match::new([w.id, x.id], [y.id, z.id], w.level))
}
