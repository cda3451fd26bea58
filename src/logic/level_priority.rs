//! Level-aware selection: exhaustive scored search over a small urgent pool.
//!
//! Every 4-subset of the search pool is scored under each of its three team
//! splits. Penalties, largest first: broken fixed pairs, fairness spread, then
//! level mismatches and partner/opponent repetition, whose relative order
//! depends on the weighting.

use crate::logic::random::RandomSource;
use crate::models::{Match, Player, PlayerId};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Cap on the search pool; C(16, 4) * 3 scored candidates worst case.
const SEARCH_POOL_SIZE: usize = 16;
const FIXED_PAIR_PENALTY: f64 = 100_000.0;
const FAIRNESS_WEIGHT: f64 = 5_000.0;
const TEAMMATE_REPEAT_WEIGHT: u32 = 20;
const STRONG_LEVEL_WEIGHT: f64 = 1_000.0;
const WEAK_SCATTER_WEIGHT: f64 = 100.0;
/// Upper bound (exclusive) of the tie-breaking noise added to each score.
const JITTER: f64 = 0.1;
/// Stop searching once a candidate scores below this.
const GOOD_ENOUGH: f64 = 100.0;

/// The three ways to split four players into two teams of two.
const SPLITS: [[usize; 4]; 3] = [[0, 1, 2, 3], [0, 2, 1, 3], [0, 3, 1, 2]];

/// Which of level mismatch and partner/opponent repetition dominates.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LevelWeighting {
    /// Repetition first, levels second.
    Weak,
    /// Levels first, repetition second.
    Strong,
}

/// Penalty components of one quad-with-teams (`[0,1]` vs `[2,3]`).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QuadScore {
    pub fixed_pair_violations: u32,
    /// Sum of play counts above the pool minimum.
    pub fairness: u32,
    pub scatter: u32,
    /// Incompatible pairs among both teams and one cross-team pair (0-3).
    pub level_mismatches: u32,
}

impl QuadScore {
    pub fn evaluate(teams: &[&Player; 4], min_play_count: u32, available: &HashSet<PlayerId>) -> Self {
        let [a, b, c, d] = *teams;

        let mut fixed_pair_violations = 0;
        for (p, mate) in [(a, b), (b, a), (c, d), (d, c)] {
            if let Some(pid) = p.fixed_partner {
                if pid != mate.id && available.contains(&pid) {
                    fixed_pair_violations += 1;
                }
            }
        }

        let fairness = teams.iter().map(|p| p.play_count).sum::<u32>() - 4 * min_play_count;

        let opponents: u32 = [a, b]
            .iter()
            .flat_map(|x| [c, d].map(|y| x.opponent_count(y.id)))
            .sum();
        let scatter = TEAMMATE_REPEAT_WEIGHT * (a.pair_count(b.id) + c.pair_count(d.id)) + opponents;

        let level_mismatches = [(a, b), (c, d), (a, c)]
            .iter()
            .filter(|(x, y)| !x.level.is_compatible(y.level))
            .count() as u32;

        Self {
            fixed_pair_violations,
            fairness,
            scatter,
            level_mismatches,
        }
    }

    pub fn total(&self, weighting: LevelWeighting) -> f64 {
        let tradeoff = match weighting {
            LevelWeighting::Strong => {
                self.level_mismatches as f64 * STRONG_LEVEL_WEIGHT + self.scatter as f64
            }
            LevelWeighting::Weak => {
                self.scatter as f64 * WEAK_SCATTER_WEIGHT + self.level_mismatches as f64
            }
        };
        self.fixed_pair_violations as f64 * FIXED_PAIR_PENALTY
            + self.fairness as f64 * FAIRNESS_WEIGHT
            + tradeoff
    }
}

/// Most urgent players within one match of the pool minimum, at most 16.
///
/// Order: fewest plays, then most imputed plays, then longest idle; exact ties
/// land in random order.
pub fn search_pool<'a>(pool: &[&'a Player], rng: &mut impl RandomSource) -> Vec<&'a Player> {
    let Some(min) = pool.iter().map(|p| p.play_count).min() else {
        return Vec::new();
    };
    let mut eligible: Vec<&'a Player> = pool
        .iter()
        .copied()
        .filter(|p| p.play_count <= min + 1)
        .collect();
    rng.shuffle(&mut eligible);
    eligible.sort_by(|x, y| urgency(x, y));
    eligible.truncate(SEARCH_POOL_SIZE);
    eligible
}

fn urgency(x: &Player, y: &Player) -> Ordering {
    x.play_count
        .cmp(&y.play_count)
        .then(y.imputed_play_count.cmp(&x.imputed_play_count))
        .then(x.last_played_at.cmp(&y.last_played_at))
}

/// Level-aware selection. `None` if fewer than four players survive the fairness cut.
pub fn select_by_level(
    pool: &[&Player],
    weighting: LevelWeighting,
    rng: &mut impl RandomSource,
) -> Option<Match> {
    let search = search_pool(pool, rng);
    let n = search.len();
    if n < 4 {
        return None;
    }
    let min_play_count = search.iter().map(|p| p.play_count).min().unwrap_or(0);
    let available: HashSet<PlayerId> = pool.iter().map(|p| p.id).collect();

    let mut best: Option<(f64, [&Player; 4])> = None;
    let mut scored = 0usize;
    'search: for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                for l in (k + 1)..n {
                    let quad = [search[i], search[j], search[k], search[l]];
                    for split in SPLITS {
                        let teams = split.map(|s| quad[s]);
                        let cost = QuadScore::evaluate(&teams, min_play_count, &available)
                            .total(weighting)
                            + rng.next_f64() * JITTER;
                        scored += 1;
                        if best.map_or(true, |(b, _)| cost < b) {
                            best = Some((cost, teams));
                        }
                        if cost < GOOD_ENOUGH {
                            break 'search;
                        }
                    }
                }
            }
        }
    }

    let (cost, [a, b, c, d]) = best?;
    log::debug!(
        "{:?} level pick ({}, {}) vs ({}, {}), cost {:.2} after {} candidates",
        weighting,
        a.id,
        b.id,
        c.id,
        d.id,
        cost,
        scored
    );
    Some(Match::new([a.id, b.id], [c.id, d.id], a.level))
}
