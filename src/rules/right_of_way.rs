//! Right of way between two boats meeting on one cell.
//!
//! Rules, first match wins:
//! 1. On opposite tacks the starboard-tack boat wins.
//! 2. Otherwise the leeward boat, the one further downwind, wins.
//! 3. Otherwise the stationary boat wins because it was there first.

use crate::board::boat::{Boat, BoatId};
use crate::board::position::{Direction, Position};
use crate::sailing::Tack;

/// One side of a right-of-way contest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contender<'a> {
    pub boat_id: BoatId,
    pub name: &'a str,
    pub tack: Option<Tack>,
    pub pos: Position,
}

impl<'a> Contender<'a> {
    /// A placed boat as it currently stands. `None` for an unplaced boat.
    pub fn of(boat: &'a Boat) -> Option<Self> {
        Some(Contender {
            boat_id: boat.boat_id,
            name: boat.name(),
            tack: boat.state.tack,
            pos: boat.state.pos?,
        })
    }

    /// The same boat with a different tack, e.g. the one a move would put it on.
    pub fn on_tack(mut self, tack: Tack) -> Self {
        self.tack = Some(tack);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RightOfWay {
    pub winner: BoatId,
    pub reason: String,
}

/// Distance downwind, in units of the wind vector.
fn downwind_depth(wind: Direction, pos: Position) -> i32 {
    let (dx, dy) = wind.opposite().delta();
    pos.x * dx + pos.y * dy
}

/// Decides which of two boats holds right of way with the wind blowing
/// from `wind`.
pub fn who_has_right_of_way(
    wind: Direction,
    moving: &Contender<'_>,
    stationary: &Contender<'_>,
) -> RightOfWay {
    let wins = |c: &Contender<'_>, why: &str| RightOfWay {
        winner: c.boat_id,
        reason: format!("{} has right of way ({})", c.name, why),
    };

    match (moving.tack, stationary.tack) {
        (Some(Tack::Port), Some(Tack::Starboard)) => return wins(stationary, "starboard tack"),
        (Some(Tack::Starboard), Some(Tack::Port)) => return wins(moving, "starboard tack"),
        _ => {}
    }

    let moving_depth = downwind_depth(wind, moving.pos);
    let stationary_depth = downwind_depth(wind, stationary.pos);
    if stationary_depth > moving_depth {
        return wins(stationary, "leeward");
    }
    if moving_depth > stationary_depth {
        return wins(moving, "leeward");
    }

    RightOfWay {
        winner: stationary.boat_id,
        reason: format!(
            "Neither boat has right of way, but {} was here first",
            stationary.name
        ),
    }
}
