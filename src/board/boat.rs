//! Boats: identity, settings, and per-turn state.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::course::CourseProgress;
use super::position::{Direction, Position};
use crate::cards::BenefitCard;
use crate::sailing::Tack;

/// Unique boat identifier.
pub type BoatId = Uuid;

/// Builds a boat id from random bytes drawn from `rng`, so seeded games
/// produce the same ids.
pub fn new_boat_id<R: Rng + ?Sized>(rng: &mut R) -> BoatId {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid()
}

/// Hull colours. Each colour can be used by at most one boat per game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoatColor {
    Red,
    Blue,
    Yellow,
    Green,
    Purple,
    Pink,
}

pub const ALL_COLORS: [BoatColor; 6] = [
    BoatColor::Red,
    BoatColor::Blue,
    BoatColor::Yellow,
    BoatColor::Green,
    BoatColor::Purple,
    BoatColor::Pink,
];

impl BoatColor {
    pub const fn as_str(self) -> &'static str {
        match self {
            BoatColor::Red => "Red",
            BoatColor::Blue => "Blue",
            BoatColor::Yellow => "Yellow",
            BoatColor::Green => "Green",
            BoatColor::Purple => "Purple",
            BoatColor::Pink => "Pink",
        }
    }
}

impl fmt::Display for BoatColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoatColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_COLORS
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown boat color: {}", s))
    }
}

/// Chosen once when a player joins and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoatSettings {
    pub name: String,
    pub color: BoatColor,
}

impl BoatSettings {
    pub fn new(name: impl Into<String>, color: BoatColor) -> Self {
        BoatSettings {
            name: name.into(),
            color,
        }
    }
}

/// Everything about a boat that changes during the race.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoatState {
    /// Cells left to travel this turn.
    pub speed: u32,
    pub turns_completed: u32,
    #[serde(default)]
    pub tack: Option<Tack>,
    /// `None` until a starting position is chosen, never cleared after.
    #[serde(default)]
    pub pos: Option<Position>,
    #[serde(default)]
    pub most_recent_move_dir: Option<Direction>,
    pub has_moved_this_turn: bool,
    #[serde(flatten)]
    pub progress: CourseProgress,
    #[serde(default)]
    pub benefit_cards_drawn: Vec<BenefitCard>,
    #[serde(default)]
    pub benefit_cards_active: Vec<BenefitCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boat {
    pub boat_id: BoatId,
    pub settings: BoatSettings,
    pub state: BoatState,
}

impl Boat {
    pub fn new(boat_id: BoatId, settings: BoatSettings) -> Self {
        Boat {
            boat_id,
            settings,
            state: BoatState::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn has_finished(&self) -> bool {
        self.state.progress.has_crossed_finish
    }
}
