//! Roster: the canonical collection of players and the admin mutations on it.
//!
//! Every mutation here keeps the fixed-partner relation symmetric: a link is
//! either present on both ends or on neither.

use crate::models::player::{LevelTag, Player, PlayerId};
use crate::models::session::SessionError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    /// Players in display order.
    pub players: Vec<Player>,
    next_id: PlayerId,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from already-validated players (e.g. a loaded snapshot).
    pub fn from_players(mut players: Vec<Player>) -> Self {
        players.sort_by_key(|p| p.order);
        let next_id = players.iter().map(|p| p.id + 1).max().unwrap_or(1);
        Self { players, next_id }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    fn require_mut(&mut self, id: PlayerId) -> Result<&mut Player, SessionError> {
        self.get_mut(id).ok_or(SessionError::PlayerNotFound(id))
    }

    /// Add a player. Names must be non-empty and unique (case-insensitive).
    pub fn add_player(
        &mut self,
        name: impl Into<String>,
        level: LevelTag,
    ) -> Result<PlayerId, SessionError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        if self.players.iter().any(|p| p.name.eq_ignore_ascii_case(name)) {
            return Err(SessionError::DuplicatePlayerName);
        }
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        let mut player = Player::new(id, name, level);
        player.order = self.players.len() as u32;
        self.players.push(player);
        Ok(id)
    }

    /// Remove a player and every reference other players hold to them.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<Player, SessionError> {
        let idx = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(SessionError::PlayerNotFound(id))?;
        let removed = self.players.remove(idx);
        for p in &mut self.players {
            p.forget(id);
        }
        self.renumber();
        Ok(removed)
    }

    pub fn set_active(&mut self, id: PlayerId, active: bool) -> Result<(), SessionError> {
        self.require_mut(id)?.active = active;
        Ok(())
    }

    pub fn set_level(&mut self, id: PlayerId, level: LevelTag) -> Result<(), SessionError> {
        self.require_mut(id)?.level = level;
        Ok(())
    }

    /// Link `a` and `b` as fixed partners, unlinking any previous partner of either first.
    pub fn set_fixed_partner(&mut self, a: PlayerId, b: PlayerId) -> Result<(), SessionError> {
        if a == b {
            return Err(SessionError::SelfPartner);
        }
        if !self.contains(a) {
            return Err(SessionError::PlayerNotFound(a));
        }
        if !self.contains(b) {
            return Err(SessionError::PlayerNotFound(b));
        }
        self.clear_fixed_partner(a)?;
        self.clear_fixed_partner(b)?;
        self.require_mut(a)?.fixed_partner = Some(b);
        self.require_mut(b)?.fixed_partner = Some(a);
        Ok(())
    }

    /// Clear the fixed-partner link of `id` on both ends.
    pub fn clear_fixed_partner(&mut self, id: PlayerId) -> Result<(), SessionError> {
        let partner = self.require_mut(id)?.fixed_partner.take();
        if let Some(pid) = partner {
            if let Some(p) = self.get_mut(pid) {
                if p.fixed_partner == Some(id) {
                    p.fixed_partner = None;
                }
            }
        }
        Ok(())
    }

    /// The honored fixed partner of `id`: only returned if the link is mutual
    /// and names someone else.
    pub fn fixed_partner_of(&self, id: PlayerId) -> Option<PlayerId> {
        let pid = self.get(id)?.fixed_partner.filter(|&pid| pid != id)?;
        (self.get(pid)?.fixed_partner == Some(id)).then_some(pid)
    }

    /// Zero one player's counters and history, and every other player's history about them.
    pub fn reset_player(&mut self, id: PlayerId) -> Result<(), SessionError> {
        self.require_mut(id)?.reset_counts();
        for p in self.players.iter_mut().filter(|p| p.id != id) {
            p.forget_history(id);
        }
        Ok(())
    }

    pub fn reset_all(&mut self) {
        for p in &mut self.players {
            p.reset_counts();
        }
    }

    /// Clear one-sided, dangling or self links on both ends. Returns repairs made.
    pub fn repair_fixed_partners(&mut self) -> usize {
        let broken: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| p.fixed_partner.is_some() && self.fixed_partner_of(p.id).is_none())
            .map(|p| p.id)
            .collect();
        for &id in &broken {
            log::warn!("Clearing broken fixed partner link on player {}", id);
            if let Some(p) = self.get_mut(id) {
                p.fixed_partner = None;
            }
        }
        broken.len()
    }

    /// Move a player to `new_index` in display order and renumber `order` densely.
    pub fn move_player(&mut self, id: PlayerId, new_index: usize) -> Result<(), SessionError> {
        let idx = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(SessionError::PlayerNotFound(id))?;
        let player = self.players.remove(idx);
        let new_index = new_index.min(self.players.len());
        self.players.insert(new_index, player);
        self.renumber();
        Ok(())
    }

    fn renumber(&mut self) {
        for (i, p) in self.players.iter_mut().enumerate() {
            p.order = i as u32;
        }
    }

    /// Floor of the mean play count over active players; `None` if nobody is active.
    pub fn active_average_play_count(&self) -> Option<u32> {
        let (sum, n) = self
            .players
            .iter()
            .filter(|p| p.active)
            .fold((0u64, 0u64), |(s, n), p| (s + p.play_count as u64, n + 1));
        (n > 0).then(|| (sum / n) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::Match;

    fn roster(n: usize) -> Roster {
        let mut r = Roster::new();
        for i in 0..n {
            r.add_player(format!("P{i}"), LevelTag::B).unwrap();
        }
        r
    }

    #[test]
    fn add_rejects_duplicates_and_blank_names() {
        let mut r = roster(1);
        assert_eq!(r.add_player("p0", LevelTag::A), Err(SessionError::DuplicatePlayerName));
        assert_eq!(r.add_player("   ", LevelTag::A), Err(SessionError::EmptyName));
    }

    #[test]
    fn relinking_clears_previous_partners_on_both_sides() {
        let mut r = roster(3);
        r.set_fixed_partner(1, 2).unwrap();
        r.set_fixed_partner(1, 3).unwrap();
        assert_eq!(r.get(1).unwrap().fixed_partner, Some(3));
        assert_eq!(r.get(3).unwrap().fixed_partner, Some(1));
        assert_eq!(r.get(2).unwrap().fixed_partner, None);
    }

    #[test]
    fn clearing_one_side_clears_the_other() {
        let mut r = roster(2);
        r.set_fixed_partner(1, 2).unwrap();
        r.clear_fixed_partner(2).unwrap();
        assert_eq!(r.get(1).unwrap().fixed_partner, None);
        assert_eq!(r.get(2).unwrap().fixed_partner, None);
    }

    #[test]
    fn self_partner_rejected() {
        let mut r = roster(1);
        assert_eq!(r.set_fixed_partner(1, 1), Err(SessionError::SelfPartner));
    }

    #[test]
    fn repair_clears_one_sided_links() {
        let mut r = roster(3);
        r.get_mut(1).unwrap().fixed_partner = Some(2);
        r.get_mut(3).unwrap().fixed_partner = Some(99);
        assert_eq!(r.repair_fixed_partners(), 2);
        assert!(r.players.iter().all(|p| p.fixed_partner.is_none()));
    }

    #[test]
    fn repair_clears_self_links() {
        let mut r = roster(2);
        r.get_mut(1).unwrap().fixed_partner = Some(1);
        assert_eq!(r.fixed_partner_of(1), None);
        assert_eq!(r.repair_fixed_partners(), 1);
        assert_eq!(r.get(1).unwrap().fixed_partner, None);
    }

    #[test]
    fn reset_player_clears_history_on_both_sides() {
        let mut r = roster(4);
        let m = Match::new([1, 2], [3, 4], LevelTag::B);
        for id in m.players() {
            let (partner, opponents) = m.partner_and_opponents(id).unwrap();
            r.get_mut(id).unwrap().record_match(partner, opponents, 10);
        }
        r.reset_player(1).unwrap();
        assert_eq!(r.get(1).unwrap().play_count, 0);
        assert_eq!(r.get(2).unwrap().play_count, 1);
        for p in &r.players {
            assert_eq!(p.pair_count(1), 0);
            assert_eq!(p.opponent_count(1), 0);
        }
        assert_eq!(r.get(3).unwrap().pair_count(4), 1);
    }

    #[test]
    fn move_player_renumbers_order() {
        let mut r = roster(4);
        r.move_player(4, 0).unwrap();
        let ids: Vec<_> = r.players.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![4, 1, 2, 3]);
        assert!(r.players.iter().enumerate().all(|(i, p)| p.order == i as u32));
    }

    #[test]
    fn remove_clears_histories() {
        let mut r = roster(3);
        r.get_mut(1).unwrap().pair_history.insert(2, 3);
        r.get_mut(3).unwrap().match_history.insert(2, 1);
        r.remove_player(2).unwrap();
        assert!(r.get(1).unwrap().pair_history.is_empty());
        assert!(r.get(3).unwrap().match_history.is_empty());
    }
}
