//! Integration tests for session flow: courts, planned matches, replanning and admin edits.

use chrono::{TimeZone, Utc};
use court_rotation_web::{
    LevelPriority, LevelTag, Match, PlanState, PlayerId, Session, SessionConfig, SessionError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn session_with(n: usize, courts: u8) -> Session {
    let config = SessionConfig {
        court_count: courts,
        ..SessionConfig::default()
    };
    let mut s = Session::new(config).unwrap();
    for i in 0..n {
        s.add_player(format!("P{i}"), LevelTag::B).unwrap();
    }
    s
}

fn now() -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

fn assert_partners_symmetric(s: &Session) {
    for p in &s.roster.players {
        if let Some(pid) = p.fixed_partner {
            let q = s.roster.get(pid).expect("dangling fixed partner");
            assert_eq!(q.fixed_partner, Some(p.id));
        }
    }
}

#[test]
fn invalid_court_count_is_rejected() {
    let config = SessionConfig {
        court_count: 9,
        ..SessionConfig::default()
    };
    assert!(matches!(Session::new(config), Err(SessionError::InvalidCourtCount(9))));
    let mut s = session_with(4, 2);
    assert_eq!(
        s.set_config(SessionConfig { court_count: 0, ..s.config }),
        Err(SessionError::InvalidCourtCount(0))
    );
}

#[test]
fn assign_fills_courts_and_logs_history() {
    let mut s = session_with(10, 2);
    let mut rng = StdRng::seed_from_u64(1);
    let started = s.assign_open_courts(now(), &mut rng).unwrap();
    assert_eq!(started, vec![1, 2]);
    assert_eq!(s.history.len(), 2);
    assert_eq!(s.busy_players().len(), 8);
    for record in &s.history {
        assert_eq!(record.started_at, now());
        for (id, name) in record.players.iter().zip(&record.names) {
            assert_eq!(&s.roster.get(*id).unwrap().name, name);
        }
    }
    // Both courts busy, so nothing more to do.
    assert!(s.assign_open_courts(now(), &mut rng).unwrap().is_empty());
}

#[test]
fn assign_with_too_few_players_leaves_courts_empty() {
    let mut s = session_with(5, 2);
    let mut rng = StdRng::seed_from_u64(2);
    assert_eq!(s.assign_open_courts(now(), &mut rng).unwrap(), vec![1]);
    assert!(s.courts[1].is_free());
}

#[test]
fn start_uses_planned_match_first() {
    let mut s = session_with(12, 2);
    let mut rng = StdRng::seed_from_u64(3);
    s.plan_next(&mut rng);
    assert_eq!(s.planned.len(), 2);
    let first = s.planned[0].clone();

    let m = s.start_next_match(1, now(), &mut rng).unwrap();
    assert_eq!(m, first);
    assert_eq!(s.courts[0].current.as_ref(), Some(&first));
    assert_eq!(s.planned.len(), 1);
    assert_eq!(s.plan_state(), PlanState::Stable);

    assert_eq!(
        s.start_next_match(1, now(), &mut rng),
        Err(SessionError::CourtOccupied(1))
    );
    assert_eq!(
        s.start_next_match(7, now(), &mut rng),
        Err(SessionError::CourtNotFound(7))
    );
}

#[test]
fn start_without_plan_selects_fresh_and_excludes_busy() {
    let mut s = session_with(8, 2);
    let mut rng = StdRng::seed_from_u64(4);
    let a = s.start_next_match(1, now(), &mut rng).unwrap();
    let b = s.start_next_match(2, now(), &mut rng).unwrap();
    let all: HashSet<PlayerId> = a.players().into_iter().chain(b.players()).collect();
    assert_eq!(all.len(), 8);
}

#[test]
fn start_with_nobody_free_fails() {
    let mut s = session_with(6, 2);
    let mut rng = StdRng::seed_from_u64(5);
    s.start_next_match(1, now(), &mut rng).unwrap();
    assert_eq!(
        s.start_next_match(2, now(), &mut rng),
        Err(SessionError::NoMatchAvailable)
    );
}

#[test]
fn finish_frees_court() {
    let mut s = session_with(4, 1);
    let mut rng = StdRng::seed_from_u64(6);
    let m = s.start_next_match(1, now(), &mut rng).unwrap();
    assert_eq!(s.finish_match(1), Ok(m));
    assert!(s.courts[0].is_free());
    assert_eq!(s.finish_match(1), Err(SessionError::CourtEmpty(1)));
}

#[test]
fn planned_matches_skip_players_on_court() {
    let mut s = session_with(12, 2);
    let mut rng = StdRng::seed_from_u64(7);
    s.start_next_match(1, now(), &mut rng).unwrap();
    s.plan_next(&mut rng);
    let busy = s.busy_players();
    assert_eq!(s.planned.len(), 2);
    for m in &s.planned {
        assert!(m.players().iter().all(|id| !busy.contains(id)));
    }
}

#[test]
fn refresh_replans_only_when_stale() {
    let mut s = session_with(10, 2);
    let mut rng = StdRng::seed_from_u64(8);
    assert!(s.refresh_plan(&mut rng));
    assert!(!s.refresh_plan(&mut rng));

    let planned_player = s.planned[0].team_1[0];
    let idle: PlayerId = s
        .roster
        .players
        .iter()
        .map(|p| p.id)
        .find(|id| !s.planned.iter().any(|m| m.contains(*id)))
        .unwrap();

    // Edits to an unplanned player's level do not matter.
    s.set_level(idle, LevelTag::A).unwrap();
    assert!(!s.refresh_plan(&mut rng));

    s.set_active(planned_player, false).unwrap();
    assert_eq!(s.plan_state(), PlanState::NeedsRegeneration);
    assert!(s.refresh_plan(&mut rng));
    assert!(s.planned.iter().all(|m| !m.contains(planned_player)));
}

#[test]
fn config_change_triggers_replan() {
    let mut s = session_with(10, 2);
    let mut rng = StdRng::seed_from_u64(9);
    s.plan_next(&mut rng);
    s.set_config(SessionConfig {
        level_priority: LevelPriority::Weak,
        ..s.config
    })
    .unwrap();
    assert!(s.refresh_plan(&mut rng));
}

#[test]
fn removing_player_clears_partner_courts_and_plans() {
    let mut s = session_with(8, 1);
    let mut rng = StdRng::seed_from_u64(10);
    s.set_fixed_partner(1, Some(2)).unwrap();
    s.set_fixed_partner(3, Some(4)).unwrap();
    let m = s.start_next_match(1, now(), &mut rng).unwrap();
    s.plan_next(&mut rng);
    let victim = m.team_1[0];

    s.remove_player(1).unwrap();
    assert_eq!(s.roster.get(2).unwrap().fixed_partner, None);
    assert!(s.planned.iter().all(|p| !p.contains(1)));
    if m.contains(1) {
        assert!(s.courts[0].is_free());
    }
    if victim != 1 {
        s.remove_player(victim).unwrap();
        assert!(s.courts[0].is_free());
    }
    for p in &s.roster.players {
        assert!(!p.pair_history.contains_key(&victim));
        assert!(!p.match_history.contains_key(&victim));
    }
    assert_partners_symmetric(&s);
    assert_eq!(s.remove_player(1), Err(SessionError::PlayerNotFound(1)));
}

#[test]
fn partner_edits_stay_symmetric() {
    let mut s = session_with(4, 1);
    s.set_fixed_partner(1, Some(2)).unwrap();
    s.set_fixed_partner(3, Some(2)).unwrap();
    assert_eq!(s.roster.get(1).unwrap().fixed_partner, None);
    s.set_fixed_partner(2, None).unwrap();
    assert_eq!(s.roster.get(3).unwrap().fixed_partner, None);
    assert_eq!(s.set_fixed_partner(4, Some(4)), Err(SessionError::SelfPartner));
    assert_eq!(s.set_fixed_partner(4, Some(40)), Err(SessionError::PlayerNotFound(40)));
    assert_partners_symmetric(&s);
}

#[test]
fn shrinking_courts_drops_their_matches() {
    let mut s = session_with(8, 2);
    let mut rng = StdRng::seed_from_u64(11);
    s.assign_open_courts(now(), &mut rng).unwrap();
    s.set_config(SessionConfig {
        court_count: 1,
        ..s.config
    })
    .unwrap();
    assert_eq!(s.courts.len(), 1);
    assert_eq!(s.busy_players().len(), 4);
    s.set_config(SessionConfig {
        court_count: 3,
        ..s.config
    })
    .unwrap();
    let ids: Vec<u8> = s.courts.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn starting_a_match_drops_overlapping_plans() {
    let mut s = session_with(8, 2);
    let mut rng = StdRng::seed_from_u64(14);
    let first = Match::new([1, 2], [3, 4], LevelTag::B);
    s.planned = vec![
        first.clone(),
        Match::new([1, 5], [6, 7], LevelTag::B),
        Match::new([5, 6], [7, 8], LevelTag::B),
    ];
    assert_eq!(s.start_next_match(1, now(), &mut rng), Ok(first));
    assert_eq!(s.planned, vec![Match::new([5, 6], [7, 8], LevelTag::B)]);
}

#[test]
fn reset_player_keeps_histories_symmetric() {
    let mut s = session_with(4, 1);
    let mut rng = StdRng::seed_from_u64(13);
    let m = s.start_next_match(1, now(), &mut rng).unwrap();
    s.finish_match(1).unwrap();
    s.reset_player(m.team_1[0]).unwrap();
    s.planned = vec![m.clone()];
    assert_eq!(s.start_next_match(1, now(), &mut rng), Ok(m));
    for a in &s.roster.players {
        for b in &s.roster.players {
            assert_eq!(a.pair_count(b.id), b.pair_count(a.id));
            assert_eq!(a.opponent_count(b.id), b.opponent_count(a.id));
        }
    }
}

#[test]
fn reset_clears_counters_together() {
    let mut s = session_with(4, 1);
    let mut rng = StdRng::seed_from_u64(12);
    s.start_next_match(1, now(), &mut rng).unwrap();
    s.reset_all();
    for p in &s.roster.players {
        assert_eq!(p.play_count, 0);
        assert_eq!(p.imputed_play_count, 0);
        assert_eq!(p.last_played_at, 0);
        assert!(p.pair_history.is_empty());
        assert!(p.match_history.is_empty());
    }
    assert_eq!(s.history.len(), 1);
}
