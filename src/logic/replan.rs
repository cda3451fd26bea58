//! Replan trigger: decides whether the planned "next" batch is stale.
//!
//! A fingerprint captures, per player, the fixed partner, active flag, level
//! and whether they appear in the plan, plus the whole config. The
//! trigger compares the live fingerprint with the baseline taken when the plan
//! was last computed.

use crate::models::{LevelTag, Match, PlayerId, Roster, SessionConfig};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanState {
    #[default]
    Stable,
    NeedsRegeneration,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct PlayerPrint {
    fixed_partner: Option<PlayerId>,
    active: bool,
    level: LevelTag,
    /// In one of the planned matches when captured.
    planned: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlanFingerprint {
    players: BTreeMap<PlayerId, PlayerPrint>,
    config: SessionConfig,
}

impl PlanFingerprint {
    pub fn capture(roster: &Roster, config: &SessionConfig, planned: &[Match]) -> Self {
        let in_plan: HashSet<PlayerId> = planned.iter().flat_map(|m| m.players()).collect();
        let players = roster
            .players
            .iter()
            .map(|p| {
                let print = PlayerPrint {
                    fixed_partner: p.fixed_partner,
                    active: p.active,
                    level: p.level,
                    planned: in_plan.contains(&p.id),
                };
                (p.id, print)
            })
            .collect();
        Self {
            players,
            config: *config,
        }
    }

    /// Whether moving from `self` (baseline) to `current` invalidates the plan.
    ///
    /// Players planned in the baseline are checked for deletion, deactivation,
    /// partner and level changes. Others only matter when they become active.
    /// A planned player who has since left the plan (their match started) is
    /// not a change by itself.
    pub fn invalidated_by(&self, current: &PlanFingerprint) -> bool {
        if self.config != current.config {
            return true;
        }
        for (id, before) in &self.players {
            match current.players.get(id) {
                None if before.planned => return true,
                None => {}
                Some(after) if before.planned => {
                    if !after.active
                        || after.fixed_partner != before.fixed_partner
                        || after.level != before.level
                    {
                        return true;
                    }
                }
                Some(after) => {
                    if !before.active && after.active {
                        return true;
                    }
                }
            }
        }
        current
            .players
            .iter()
            .any(|(id, p)| p.active && !self.players.contains_key(id))
    }
}

/// Holds the baseline fingerprint of the current plan.
#[derive(Clone, Debug, Default)]
pub struct ReplanTrigger {
    baseline: Option<PlanFingerprint>,
}

impl ReplanTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebaseline(&mut self, roster: &Roster, config: &SessionConfig, planned: &[Match]) {
        self.baseline = Some(PlanFingerprint::capture(roster, config, planned));
    }

    /// `NeedsRegeneration` if no plan was ever baselined or the live state invalidates it.
    pub fn evaluate(&self, roster: &Roster, config: &SessionConfig, planned: &[Match]) -> PlanState {
        let Some(baseline) = &self.baseline else {
            return PlanState::NeedsRegeneration;
        };
        let current = PlanFingerprint::capture(roster, config, planned);
        if baseline.invalidated_by(&current) {
            PlanState::NeedsRegeneration
        } else {
            PlanState::Stable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LevelPriority;

    fn setup() -> (Roster, SessionConfig, Vec<Match>, ReplanTrigger) {
        let mut roster = Roster::new();
        for i in 1..=6 {
            roster.add_player(format!("P{i}"), LevelTag::B).unwrap();
        }
        let config = SessionConfig::default();
        let planned = vec![Match::new([1, 2], [3, 4], LevelTag::B)];
        let mut trigger = ReplanTrigger::new();
        trigger.rebaseline(&roster, &config, &planned);
        (roster, config, planned, trigger)
    }

    #[test]
    fn fresh_trigger_needs_regeneration() {
        let roster = Roster::new();
        let t = ReplanTrigger::new();
        assert_eq!(
            t.evaluate(&roster, &SessionConfig::default(), &[]),
            PlanState::NeedsRegeneration
        );
    }

    #[test]
    fn unchanged_state_is_stable() {
        let (roster, config, planned, t) = setup();
        assert_eq!(t.evaluate(&roster, &config, &planned), PlanState::Stable);
    }

    #[test]
    fn config_change_invalidates() {
        let (roster, mut config, planned, t) = setup();
        config.level_priority = LevelPriority::Strong;
        assert_eq!(t.evaluate(&roster, &config, &planned), PlanState::NeedsRegeneration);
    }

    #[test]
    fn planned_player_going_inactive_invalidates() {
        let (mut roster, config, planned, t) = setup();
        roster.set_active(2, false).unwrap();
        assert_eq!(t.evaluate(&roster, &config, &planned), PlanState::NeedsRegeneration);
    }

    #[test]
    fn unplanned_player_going_inactive_is_stable() {
        let (mut roster, config, planned, t) = setup();
        roster.set_active(6, false).unwrap();
        assert_eq!(t.evaluate(&roster, &config, &planned), PlanState::Stable);
    }

    #[test]
    fn unplanned_player_returning_invalidates() {
        let (mut roster, config, planned, mut t) = setup();
        roster.set_active(6, false).unwrap();
        t.rebaseline(&roster, &config, &planned);
        roster.set_active(6, true).unwrap();
        assert_eq!(t.evaluate(&roster, &config, &planned), PlanState::NeedsRegeneration);
    }

    #[test]
    fn level_change_matters_only_for_planned_players() {
        let (mut roster, config, planned, t) = setup();
        roster.set_level(5, LevelTag::A).unwrap();
        assert_eq!(t.evaluate(&roster, &config, &planned), PlanState::Stable);
        roster.set_level(1, LevelTag::A).unwrap();
        assert_eq!(t.evaluate(&roster, &config, &planned), PlanState::NeedsRegeneration);
    }

    #[test]
    fn partner_change_on_planned_player_invalidates() {
        let (mut roster, config, planned, t) = setup();
        roster.set_fixed_partner(5, 3).unwrap();
        assert_eq!(t.evaluate(&roster, &config, &planned), PlanState::NeedsRegeneration);
    }

    #[test]
    fn deleting_planned_player_invalidates() {
        let (mut roster, config, planned, t) = setup();
        roster.remove_player(4).unwrap();
        assert_eq!(t.evaluate(&roster, &config, &planned), PlanState::NeedsRegeneration);
    }

    #[test]
    fn starting_a_planned_match_is_stable() {
        let (roster, config, _, t) = setup();
        assert_eq!(t.evaluate(&roster, &config, &[]), PlanState::Stable);
    }

    #[test]
    fn deleting_unplanned_player_is_stable() {
        let (mut roster, config, planned, t) = setup();
        roster.remove_player(6).unwrap();
        assert_eq!(t.evaluate(&roster, &config, &planned), PlanState::Stable);
    }
}
