//! Session: roster, courts, planned batch and history for one continuous session.

use crate::logic::candidates::eligible_candidates;
use crate::logic::random::RandomSource;
use crate::logic::replan::{PlanState, ReplanTrigger};
use crate::logic::scheduler::schedule_courts;
use crate::logic::selector::select_match;
use crate::logic::state_update::commit_match;
use crate::models::config::{SessionConfig, MAX_COURTS, MIN_COURTS};
use crate::models::game::{Court, CourtId, HistoryRecord, Match};
use crate::models::player::{LevelTag, PlayerId};
use crate::models::roster::Roster;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Errors that can occur during session operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionError {
    /// No player with this id in the roster.
    PlayerNotFound(PlayerId),
    /// A player with this name already exists (names are unique, case-insensitive).
    DuplicatePlayerName,
    /// Player name is blank.
    EmptyName,
    /// A player cannot be their own fixed partner.
    SelfPartner,
    /// The same player appears twice in one match.
    RepeatedPlayer(PlayerId),
    /// Court count outside 1..=8.
    InvalidCourtCount(u8),
    CourtNotFound(CourtId),
    /// Court already has a match in progress.
    CourtOccupied(CourtId),
    /// Court has no match to finish.
    CourtEmpty(CourtId),
    /// Not enough free active players to form a match.
    NoMatchAvailable,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::PlayerNotFound(id) => write!(f, "Player {} not found", id),
            SessionError::DuplicatePlayerName => write!(f, "A player with this name already exists"),
            SessionError::EmptyName => write!(f, "Player name must not be empty"),
            SessionError::SelfPartner => write!(f, "A player cannot be their own fixed partner"),
            SessionError::RepeatedPlayer(id) => write!(f, "Player {} appears twice in one match", id),
            SessionError::InvalidCourtCount(n) => {
                write!(f, "Court count must be between {} and {} (got {})", MIN_COURTS, MAX_COURTS, n)
            }
            SessionError::CourtNotFound(id) => write!(f, "Court {} not found", id),
            SessionError::CourtOccupied(id) => write!(f, "Court {} already has a match", id),
            SessionError::CourtEmpty(id) => write!(f, "Court {} has no match in progress", id),
            SessionError::NoMatchAvailable => write!(f, "Not enough available players for a match"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Full session state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub roster: Roster,
    pub config: SessionConfig,
    /// Courts `1..=court_count`, in order.
    pub courts: Vec<Court>,
    /// Precomputed next matches, not yet started.
    pub planned: Vec<Match>,
    /// One record per started match, oldest first.
    pub history: Vec<HistoryRecord>,
    #[serde(skip)]
    replan: ReplanTrigger,
}

impl Default for Session {
    fn default() -> Self {
        Self::from_parts(Roster::new(), SessionConfig::default())
    }
}

impl Session {
    /// Create an empty session. The court count must be within 1..=8.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        Self::with_roster(Roster::new(), config)
    }

    /// Create a session around an existing roster.
    pub fn with_roster(roster: Roster, config: SessionConfig) -> Result<Self, SessionError> {
        if !config.is_valid() {
            return Err(SessionError::InvalidCourtCount(config.court_count));
        }
        Ok(Self::from_parts(roster, config))
    }

    fn from_parts(roster: Roster, config: SessionConfig) -> Self {
        Self {
            roster,
            config,
            courts: (1..=config.court_count).map(Court::new).collect(),
            planned: Vec::new(),
            history: Vec::new(),
            replan: ReplanTrigger::new(),
        }
    }

    /// Restore saved state. Courts are resized to the config; the plan gets rebaselined.
    pub(crate) fn restore(
        roster: Roster,
        config: SessionConfig,
        courts: Vec<Court>,
        planned: Vec<Match>,
        history: Vec<HistoryRecord>,
    ) -> Result<Self, SessionError> {
        let mut session = Self::with_roster(roster, config)?;
        for court in courts {
            if let Some(slot) = session.courts.iter_mut().find(|c| c.id == court.id) {
                slot.current = court.current;
            }
        }
        session.planned = planned;
        session.history = history;
        session.drop_stale_references();
        session
            .replan
            .rebaseline(&session.roster, &session.config, &session.planned);
        Ok(session)
    }

    /// Players currently on an occupied court.
    pub fn busy_players(&self) -> HashSet<PlayerId> {
        self.courts
            .iter()
            .filter_map(|c| c.current.as_ref())
            .flat_map(|m| m.players())
            .collect()
    }

    fn court_mut(&mut self, court_id: CourtId) -> Result<&mut Court, SessionError> {
        self.courts
            .iter_mut()
            .find(|c| c.id == court_id)
            .ok_or(SessionError::CourtNotFound(court_id))
    }

    pub fn add_player(&mut self, name: impl Into<String>, level: LevelTag) -> Result<PlayerId, SessionError> {
        let id = self.roster.add_player(name, level)?;
        log::info!("Added player {}", id);
        Ok(id)
    }

    /// Delete a player, dropping any court or planned match that references them.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<(), SessionError> {
        self.roster.remove_player(id)?;
        for court in &mut self.courts {
            if court.current.as_ref().is_some_and(|m| m.contains(id)) {
                log::info!("Cleared court {} after removing player {}", court.id, id);
                court.current = None;
            }
        }
        self.planned.retain(|m| !m.contains(id));
        Ok(())
    }

    pub fn set_active(&mut self, id: PlayerId, active: bool) -> Result<(), SessionError> {
        self.roster.set_active(id, active)
    }

    pub fn set_level(&mut self, id: PlayerId, level: LevelTag) -> Result<(), SessionError> {
        self.roster.set_level(id, level)
    }

    /// Link two players as fixed partners, or unlink `id` when `partner` is `None`.
    pub fn set_fixed_partner(&mut self, id: PlayerId, partner: Option<PlayerId>) -> Result<(), SessionError> {
        match partner {
            Some(other) => self.roster.set_fixed_partner(id, other),
            None => self.roster.clear_fixed_partner(id),
        }
    }

    pub fn move_player(&mut self, id: PlayerId, new_index: usize) -> Result<(), SessionError> {
        self.roster.move_player(id, new_index)
    }

    pub fn reset_player(&mut self, id: PlayerId) -> Result<(), SessionError> {
        self.roster.reset_player(id)
    }

    /// Zero every player's counters and history. The match log is kept.
    pub fn reset_all(&mut self) {
        self.roster.reset_all();
        log::info!("Reset counters for {} players", self.roster.len());
    }

    /// Replace the config, resizing courts. Matches on removed courts are dropped.
    pub fn set_config(&mut self, config: SessionConfig) -> Result<(), SessionError> {
        if !config.is_valid() {
            return Err(SessionError::InvalidCourtCount(config.court_count));
        }
        self.courts.retain(|c| c.id <= config.court_count);
        let existing = self.courts.len() as CourtId;
        self.courts
            .extend((existing + 1..=config.court_count).map(Court::new));
        self.config = config;
        Ok(())
    }

    /// Put `m` on `court_id` and commit it: counters, history maps, match log.
    fn start_on_court(&mut self, court_id: CourtId, m: Match, now: DateTime<Utc>) -> Result<(), SessionError> {
        commit_match(&mut self.roster, &m, now)?;
        let players = m.players();
        let names = players.map(|id| {
            self.roster
                .get(id)
                .map(|p| p.name.clone())
                .unwrap_or_default()
        });
        self.history.push(HistoryRecord {
            started_at: now,
            court: court_id,
            players,
            names,
            level: m.level,
        });
        log::info!("Court {}: started {:?} vs {:?}", court_id, m.team_1, m.team_2);
        self.court_mut(court_id)?.current = Some(m);
        Ok(())
    }

    /// Remove the first planned match whose players are all present, active and free.
    fn take_planned(&mut self, busy: &HashSet<PlayerId>) -> Option<Match> {
        let roster = &self.roster;
        let idx = self.planned.iter().position(|m| {
            m.players()
                .iter()
                .all(|id| !busy.contains(id) && roster.get(*id).is_some_and(|p| p.active))
        })?;
        Some(self.planned.remove(idx))
    }

    /// Drop planned matches that share a player with a court.
    fn drop_conflicting_plans(&mut self) {
        let busy = self.busy_players();
        let before = self.planned.len();
        self.planned
            .retain(|m| m.players().iter().all(|id| !busy.contains(id)));
        let dropped = before - self.planned.len();
        if dropped > 0 {
            log::debug!("Dropped {} planned match(es) overlapping a court", dropped);
        }
    }

    /// Drop court and planned matches that name unknown players, repeat a player,
    /// or book a player already placed on a court or earlier planned match.
    fn drop_stale_references(&mut self) {
        let roster = &self.roster;
        let mut placed: HashSet<PlayerId> = HashSet::new();
        let mut accept = |m: &Match| {
            let ids = m.players();
            let ok = m.repeated_player().is_none()
                && ids.iter().all(|id| roster.contains(*id) && !placed.contains(id));
            if ok {
                placed.extend(ids);
            }
            ok
        };
        for court in &mut self.courts {
            if court.current.as_ref().is_some_and(|m| !accept(m)) {
                log::warn!("Dropping invalid match on court {}", court.id);
                court.current = None;
            }
        }
        let before = self.planned.len();
        self.planned.retain(|m| accept(m));
        let dropped = before - self.planned.len();
        if dropped > 0 {
            log::warn!("Dropped {} invalid planned match(es)", dropped);
        }
    }

    /// Fill every empty court: planned matches first, then one scheduling pass.
    /// Returns the courts that got a match.
    pub fn assign_open_courts(
        &mut self,
        now: DateTime<Utc>,
        rng: &mut impl RandomSource,
    ) -> Result<Vec<CourtId>, SessionError> {
        let mut busy = self.busy_players();
        let mut open: Vec<CourtId> = self.courts.iter().filter(|c| c.is_free()).map(|c| c.id).collect();
        let mut assignments: Vec<(CourtId, Match)> = Vec::new();

        while let Some(&court_id) = open.first() {
            let Some(m) = self.take_planned(&busy) else {
                break;
            };
            busy.extend(m.players());
            assignments.push((court_id, m));
            open.remove(0);
        }

        let batch = schedule_courts(&self.roster, &self.config, &busy, open.len(), rng);
        assignments.extend(
            open.into_iter()
                .zip(batch)
                .filter_map(|(court_id, m)| m.map(|m| (court_id, m))),
        );

        let mut started = Vec::with_capacity(assignments.len());
        for (court_id, m) in assignments {
            self.start_on_court(court_id, m, now)?;
            started.push(court_id);
        }
        self.drop_conflicting_plans();
        Ok(started)
    }

    /// Start a match on one empty court: the next viable planned match, else a fresh pick.
    pub fn start_next_match(
        &mut self,
        court_id: CourtId,
        now: DateTime<Utc>,
        rng: &mut impl RandomSource,
    ) -> Result<Match, SessionError> {
        if !self.court_mut(court_id)?.is_free() {
            return Err(SessionError::CourtOccupied(court_id));
        }
        let busy = self.busy_players();
        let m = match self.take_planned(&busy) {
            Some(m) => m,
            None => {
                let pool = eligible_candidates(&self.roster, &busy);
                select_match(&pool, &self.config, rng).ok_or(SessionError::NoMatchAvailable)?
            }
        };
        self.start_on_court(court_id, m.clone(), now)?;
        self.drop_conflicting_plans();
        Ok(m)
    }

    /// Free a court, returning the match that was on it.
    pub fn finish_match(&mut self, court_id: CourtId) -> Result<Match, SessionError> {
        let court = self.court_mut(court_id)?;
        let m = court.current.take().ok_or(SessionError::CourtEmpty(court_id))?;
        log::info!("Court {}: finished", court_id);
        Ok(m)
    }

    /// Recompute the planned batch from scratch and take a new baseline.
    pub fn plan_next(&mut self, rng: &mut impl RandomSource) {
        let busy = self.busy_players();
        let slots = self.config.court_count as usize;
        self.planned = schedule_courts(&self.roster, &self.config, &busy, slots, rng)
            .into_iter()
            .flatten()
            .collect();
        self.replan
            .rebaseline(&self.roster, &self.config, &self.planned);
        log::info!("Planned {} next match(es)", self.planned.len());
    }

    pub fn plan_state(&self) -> PlanState {
        self.replan
            .evaluate(&self.roster, &self.config, &self.planned)
    }

    /// Regenerate the plan if it went stale. Returns whether a replan happened.
    pub fn refresh_plan(&mut self, rng: &mut impl RandomSource) -> bool {
        if self.plan_state() == PlanState::Stable {
            return false;
        }
        self.plan_next(rng);
        true
    }
}
