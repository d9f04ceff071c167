//! Board representation and game-state types.
//!
//! Contains the grid coordinates, line geometry, the race course, boats,
//! and the overall game state.

pub mod boat;
pub mod course;
pub mod geometry;
pub mod position;
pub mod state;

pub use boat::{new_boat_id, Boat, BoatColor, BoatId, BoatSettings, BoatState, ALL_COLORS};
pub use course::{Course, CourseError, CourseProgress, Fence, MarkRounding, CROSSINGS_TO_ROUND};
pub use geometry::{intersect, move_crosses_line_segment, ray_circle_intersection, GeometryError, Point};
pub use position::{
    Direction, Position, WindDirection, ALL_DIRECTIONS, ALL_WIND_DIRECTIONS, CARDINALS,
};
pub use state::{BenefitDeck, Game, TurnPhase, WeatherDeck};
