//! Wind shadows.
//!
//! A boat sitting one or two cells directly upwind of a cell steals the wind
//! from that cell.

use crate::board::boat::{Boat, BoatId};
use crate::board::position::Position;
use crate::board::state::Game;

/// How many cells upwind a boat still casts a wind shadow.
pub const WIND_SHADOW_REACH: i32 = 2;

/// Boats, other than `exclude`, that block the wind reaching `cell`.
///
/// Empty while the wind is undecided.
pub fn boats_blocking_wind(game: &Game, cell: Position, exclude: BoatId) -> Vec<&Boat> {
    let Some(wind) = game.wind_origin_dir else {
        return Vec::new();
    };
    let shadow: Vec<Position> = (1..=WIND_SHADOW_REACH).map(|n| cell.steps(wind, n)).collect();
    game.boats
        .iter()
        .filter(|b| b.boat_id != exclude)
        .filter(|b| b.state.pos.is_some_and(|p| shadow.contains(&p)))
        .collect()
}
