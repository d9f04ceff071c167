//! Turn order and the end of the race.

use crate::board::boat::BoatId;
use crate::board::state::Game;

/// The boat that takes the first turn: the first to join.
pub fn first_turn_id(game: &Game) -> Option<BoatId> {
    game.turn_order.first().copied()
}

/// The boat after the current turn holder in `turn_order`, wrapping around.
///
/// Before anyone has had a turn this is the first boat.
pub fn next_turn_id(game: &Game) -> Option<BoatId> {
    if game.turn_order.is_empty() {
        return None;
    }
    let next = game
        .id_of_boat_whose_turn_it_is
        .and_then(|id| game.turn_order.iter().position(|&t| t == id))
        .map(|i| (i + 1) % game.turn_order.len())
        .unwrap_or(0);
    Some(game.turn_order[next])
}

/// The boat before the current turn holder in `turn_order`, wrapping around.
pub fn previous_turn_id(game: &Game) -> Option<BoatId> {
    let n = game.turn_order.len();
    let i = game
        .id_of_boat_whose_turn_it_is
        .and_then(|id| game.turn_order.iter().position(|&t| t == id))?;
    Some(game.turn_order[(i + n - 1) % n])
}

/// The boat that sailed most recently: the turn holder once it has moved,
/// otherwise the boat whose turn just ended.
pub fn last_to_sail(game: &Game) -> Option<BoatId> {
    let holder = game.id_of_boat_whose_turn_it_is?;
    if game.boat(holder)?.state.has_moved_this_turn {
        return Some(holder);
    }
    previous_turn_id(game)
}

/// Finished boats needed to end a race of `boats` boats: all but one, and
/// at least one so a solo race ends when its only boat finishes.
pub fn finishers_needed(boats: usize) -> usize {
    boats.saturating_sub(1).max(1)
}

pub fn race_is_over(game: &Game) -> bool {
    !game.boats.is_empty() && game.finished_count() >= finishers_needed(game.boats.len())
}
