//! Player, skill level tags and level compatibility.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a player, stable for the session.
pub type PlayerId = u32;

/// Base skill symbol a level tag is built from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum SkillSymbol {
    A,
    B,
    C,
}

/// Skill-pattern label: which base symbol(s) a player may be grouped under.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum LevelTag {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A/B")]
    AB,
    #[serde(rename = "A/B/C")]
    ABC,
    #[default]
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B/C")]
    BC,
    #[serde(rename = "C")]
    C,
}

impl LevelTag {
    pub const ALL: [LevelTag; 6] = [
        LevelTag::A,
        LevelTag::AB,
        LevelTag::ABC,
        LevelTag::B,
        LevelTag::BC,
        LevelTag::C,
    ];

    pub fn symbols(self) -> &'static [SkillSymbol] {
        use SkillSymbol::*;
        match self {
            LevelTag::A => &[A],
            LevelTag::AB => &[A, B],
            LevelTag::ABC => &[A, B, C],
            LevelTag::B => &[B],
            LevelTag::BC => &[B, C],
            LevelTag::C => &[C],
        }
    }

    /// Two tags are compatible iff their symbol sets intersect.
    pub fn is_compatible(self, other: LevelTag) -> bool {
        self.symbols().iter().any(|s| other.symbols().contains(s))
    }

    pub fn label(self) -> &'static str {
        match self {
            LevelTag::A => "A",
            LevelTag::AB => "A/B",
            LevelTag::ABC => "A/B/C",
            LevelTag::B => "B",
            LevelTag::BC => "B/C",
            LevelTag::C => "C",
        }
    }
}

impl fmt::Display for LevelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LevelTag {
    type Err = String;

    /// Accepts the canonical labels; whitespace around symbols and lowercase are tolerated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .split('/')
            .map(|part| part.trim().to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join("/");
        LevelTag::ALL
            .into_iter()
            .find(|t| t.label() == normalized)
            .ok_or_else(|| s.to_string())
    }
}

/// A player in the rotation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub level: LevelTag,
    pub active: bool,
    /// Matches played plus imputed floor-ups while inactive.
    pub play_count: u32,
    /// Total artificial increments applied while inactive (display only).
    pub imputed_play_count: u32,
    /// Epoch millis of the last match start; 0 if never played.
    pub last_played_at: i64,
    /// Opponent id -> times faced.
    #[serde(default)]
    pub match_history: HashMap<PlayerId, u32>,
    /// Partner id -> times teamed.
    #[serde(default)]
    pub pair_history: HashMap<PlayerId, u32>,
    pub fixed_partner: Option<PlayerId>,
    /// Display order; not used for fairness.
    pub order: u32,
}

impl Player {
    /// Create a new active player. Counters start at zero with no history.
    pub fn new(id: PlayerId, name: impl Into<String>, level: LevelTag) -> Self {
        Self {
            id,
            name: name.into(),
            level,
            active: true,
            play_count: 0,
            imputed_play_count: 0,
            last_played_at: 0,
            match_history: HashMap::new(),
            pair_history: HashMap::new(),
            fixed_partner: None,
            order: id,
        }
    }

    pub fn pair_count(&self, other: PlayerId) -> u32 {
        self.pair_history.get(&other).copied().unwrap_or(0)
    }

    pub fn opponent_count(&self, other: PlayerId) -> u32 {
        self.match_history.get(&other).copied().unwrap_or(0)
    }

    /// Times played with `other` on either side of the net.
    pub fn shared_count(&self, other: PlayerId) -> u32 {
        self.pair_count(other) + self.opponent_count(other)
    }

    /// Record one match started at `at_millis` with the given partner and opponents.
    pub fn record_match(&mut self, partner: PlayerId, opponents: [PlayerId; 2], at_millis: i64) {
        self.play_count += 1;
        self.last_played_at = at_millis;
        *self.pair_history.entry(partner).or_insert(0) += 1;
        for o in opponents {
            *self.match_history.entry(o).or_insert(0) += 1;
        }
    }

    /// Raise the play count to `floor`, accounting the difference as imputed.
    pub fn impute_up_to(&mut self, floor: u32) {
        if self.play_count < floor {
            self.imputed_play_count += floor - self.play_count;
            self.play_count = floor;
        }
    }

    /// Zero counters and both history maps together.
    pub fn reset_counts(&mut self) {
        self.play_count = 0;
        self.imputed_play_count = 0;
        self.last_played_at = 0;
        self.match_history.clear();
        self.pair_history.clear();
    }

    /// Drop `other` from both history maps.
    pub fn forget_history(&mut self, other: PlayerId) {
        self.match_history.remove(&other);
        self.pair_history.remove(&other);
    }

    /// Drop every trace of `other` from this player's histories and partner link.
    pub fn forget(&mut self, other: PlayerId) {
        self.forget_history(other);
        if self.fixed_partner == Some(other) {
            self.fixed_partner = None;
        }
    }
}
