//! Movement rules.
//!
//! Pure functions over a `Game`: how fast a boat may go, who yields when
//! two boats meet, whose wind is stolen, and whose turn comes next.

pub mod right_of_way;
pub mod speed;
pub mod turn;
pub mod wind;

pub use right_of_way::{who_has_right_of_way, Contender, RightOfWay};
pub use speed::{
    crosses_start_early, potential_speed_and_tack, target_obstacle, PotentialMove,
    TURNS_BEFORE_START,
};
pub use turn::{finishers_needed, first_turn_id, last_to_sail, next_turn_id, previous_turn_id, race_is_over};
pub use wind::{boats_blocking_wind, WIND_SHADOW_REACH};
