//! Speed and legality of a candidate move.
//!
//! `potential_speed_and_tack` answers "how far can this boat go if it heads
//! toward `dir` now?" without touching the game. A speed of 0 always comes
//! with a reason a player can read.

use crate::board::boat::{Boat, BoatId};
use crate::board::position::{Direction, Position};
use crate::board::state::Game;
use crate::cards::BoostContext;
use crate::rules::right_of_way::{who_has_right_of_way, Contender};
use crate::rules::wind::boats_blocking_wind;
use crate::sailing::{point_of_sail_and_tack, PointOfSail, Tack};

/// Completed turns before a boat may cross the start line northward.
pub const TURNS_BEFORE_START: u32 = 4;

pub const NOT_CHOSEN: &str = "Your boat has not been chosen";
pub const NOT_YOUR_TURN: &str = "It is not your turn";
pub const RACE_OVER: &str = "The race is over";
pub const INTO_THE_WIND: &str = "You cannot sail directly into the wind";
pub const OFF_THE_BOARD: &str = "Not a valid space";
pub const BUOY_IN_THE_WAY: &str = "Colliding with a buoy is not allowed";
pub const DIRECTION_LOCKED: &str = "You cannot change directions mid-move";
pub const EARLY_START: &str = "You cannot cross the starting line before your 4th move";
pub const WIND_BLOCKED_AHEAD: &str = "Your wind is blocked by other boats in this direction";
pub const NO_WAY: &str = "You cannot move in this direction";

/// Result of evaluating one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PotentialMove {
    /// Cells the boat may travel this turn.
    pub speed: u32,
    /// Tack the boat would be on. `None` when the move could not be classified.
    pub tack: Option<Tack>,
    /// Empty when the move is possible.
    pub reason: String,
}

impl PotentialMove {
    fn blocked(tack: Option<Tack>, reason: impl Into<String>) -> Self {
        PotentialMove {
            speed: 0,
            tack,
            reason: reason.into(),
        }
    }

    pub fn is_possible(&self) -> bool {
        self.speed > 0
    }
}

/// Why the cell one step from `from` toward `dir` cannot be entered by
/// `boat` sailing on `tack`, if it cannot.
///
/// Covers the board edge, buoys, and boats the mover does not hold right
/// of way over.
pub fn target_obstacle(
    game: &Game,
    boat: &Boat,
    tack: Tack,
    from: Position,
    dir: Direction,
    board_size: i32,
) -> Option<String> {
    let target = from.step(dir);
    if !target.in_bounds(board_size) {
        return Some(OFF_THE_BOARD.to_string());
    }
    if game.is_buoy(target) {
        return Some(BUOY_IN_THE_WAY.to_string());
    }
    let occupant = game.boat_at(target, Some(boat.boat_id))?;
    let (Some(wind), Some(stationary)) = (game.wind_origin_dir, Contender::of(occupant)) else {
        return None;
    };
    let moving = Contender {
        pos: from,
        ..Contender::of(boat)?
    }
    .on_tack(tack);
    let row = who_has_right_of_way(wind, &moving, &stationary);
    (row.winner != boat.boat_id).then_some(row.reason)
}

/// Whether stepping from `from` toward `dir` would cross the start line
/// northward before the boat has earned it.
pub fn crosses_start_early(game: &Game, boat: &Boat, from: Position, dir: Direction) -> bool {
    boat.state.turns_completed < TURNS_BEFORE_START
        && game
            .course
            .as_ref()
            .is_some_and(|c| c.crosses_start_northward(from, from.step(dir)))
}

/// Computes how far `boat_id` could travel heading toward `dir`.
///
/// Checks run in a fixed order and the first failure wins: setup, turn,
/// irons, "no move" weather, the target cell, the direction lock, the early
/// start rule. Speed then starts from the point of sail, loses the tacking
/// penalty, gains active benefit boosts, loses one per wind-blocked cell
/// along the way, and finally gains any weather bonus.
pub fn potential_speed_and_tack(
    game: &Game,
    boat_id: Option<BoatId>,
    dir: Direction,
    board_size: i32,
) -> PotentialMove {
    let Some(boat) = boat_id.and_then(|id| game.boat(id)) else {
        return PotentialMove::blocked(None, NOT_CHOSEN);
    };
    let (Some(from), Some(wind)) = (boat.state.pos, game.wind_origin_dir) else {
        return PotentialMove::blocked(None, NOT_CHOSEN);
    };
    if game.is_finished() {
        return PotentialMove::blocked(None, RACE_OVER);
    }
    if !game.is_turn_of(boat.boat_id) {
        return PotentialMove::blocked(None, NOT_YOUR_TURN);
    }

    let (point_of_sail, tack) = point_of_sail_and_tack(dir, wind, boat.state.tack);
    if point_of_sail == PointOfSail::Irons {
        return PotentialMove::blocked(Some(tack), INTO_THE_WIND);
    }

    if let Some(weather) = game.current_weather.filter(|w| w.forbids_moving()) {
        return PotentialMove::blocked(
            Some(tack),
            format!("You revealed \"{}\", so you cannot move this turn", weather),
        );
    }

    if let Some(reason) = target_obstacle(game, boat, tack, from, dir, board_size) {
        return PotentialMove::blocked(Some(tack), reason);
    }

    if boat.state.has_moved_this_turn && boat.state.most_recent_move_dir != Some(dir) {
        return PotentialMove::blocked(Some(tack), DIRECTION_LOCKED);
    }

    if crosses_start_early(game, boat, from, dir) {
        return PotentialMove::blocked(Some(tack), EARLY_START);
    }

    let mut speed = point_of_sail.base_speed();

    let tack_penalty = u32::from(
        speed > 1 && boat.state.turns_completed >= 1 && boat.state.tack.is_some_and(|t| t != tack),
    );
    speed = speed.saturating_sub(tack_penalty);

    for card in &boat.state.benefit_cards_active {
        let ctx = BoostContext {
            game,
            boat,
            from,
            dir,
            point_of_sail,
            tack_penalty,
            speed_so_far: speed,
        };
        speed += card.speed_boost(&ctx);
    }

    // Each wind-blocked cell along the path costs one. Losing speed also
    // shortens the path, so the bound is re-read every iteration.
    let mut blocking_now: Vec<&str> = Vec::new();
    let mut blocked_later = false;
    let mut k = 0;
    while k <= speed {
        let cell = from.steps(dir, k as i32);
        let blockers = boats_blocking_wind(game, cell, boat.boat_id);
        if !blockers.is_empty() {
            speed = speed.saturating_sub(1);
            if k == 0 {
                blocking_now = blockers.iter().map(|b| b.name()).collect();
            } else {
                blocked_later = true;
            }
        }
        k += 1;
    }

    if speed == 0 {
        let reason = if blocked_later {
            WIND_BLOCKED_AHEAD.to_string()
        } else if !blocking_now.is_empty() {
            let verb = if blocking_now.len() > 1 { "are" } else { "is" };
            format!("{} {} blocking your wind", blocking_now.join(" and "), verb)
        } else {
            NO_WAY.to_string()
        };
        return PotentialMove::blocked(Some(tack), reason);
    }

    speed += game.current_weather.map(|w| w.speed_bonus()).unwrap_or(0);

    PotentialMove {
        speed,
        tack: Some(tack),
        reason: String::new(),
    }
}
