//! Sailing model: point of sail, tack, and base speed.
//!
//! The point of sail depends only on the angle between the move direction
//! and the wind origin. Counting clockwise in 45-degree steps from the move
//! direction to the wind origin:
//!
//! | offset | point of sail | tack      |
//! |--------|---------------|-----------|
//! | 0      | irons         | unchanged |
//! | 1      | beat          | starboard |
//! | 2      | beam reach    | starboard |
//! | 3      | broad reach   | starboard |
//! | 4      | run           | unchanged |
//! | 5      | broad reach   | port      |
//! | 6      | beam reach    | port      |
//! | 7      | beat          | port      |
//!
//! A run has no inherent tack, so the boat keeps whichever tack it already
//! had (starboard if it has never moved).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::position::Direction;

/// Which side of the boat the wind comes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tack {
    Starboard,
    Port,
}

impl Tack {
    pub const fn as_str(self) -> &'static str {
        match self {
            Tack::Starboard => "starboard",
            Tack::Port => "port",
        }
    }

    pub const fn flipped(self) -> Tack {
        match self {
            Tack::Starboard => Tack::Port,
            Tack::Port => Tack::Starboard,
        }
    }
}

impl fmt::Display for Tack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heading classified against the wind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointOfSail {
    Beat,
    BeamReach,
    BroadReach,
    Run,
    Irons,
}

impl PointOfSail {
    /// Cells a boat may travel this turn before any modifiers.
    pub const fn base_speed(self) -> u32 {
        match self {
            PointOfSail::Beat => 1,
            PointOfSail::BeamReach => 2,
            PointOfSail::BroadReach => 2,
            PointOfSail::Run => 1,
            PointOfSail::Irons => 0,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PointOfSail::Beat => "beat",
            PointOfSail::BeamReach => "beam reach",
            PointOfSail::BroadReach => "broad reach",
            PointOfSail::Run => "run",
            PointOfSail::Irons => "irons",
        }
    }
}

impl fmt::Display for PointOfSail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point of sail and resulting tack for a move toward `move_dir` with the
/// wind blowing from `wind_origin`.
pub fn point_of_sail_and_tack(
    move_dir: Direction,
    wind_origin: Direction,
    current_tack: Option<Tack>,
) -> (PointOfSail, Tack) {
    let kept = current_tack.unwrap_or(Tack::Starboard);
    match (wind_origin.index() + 8 - move_dir.index()) % 8 {
        0 => (PointOfSail::Irons, kept),
        1 => (PointOfSail::Beat, Tack::Starboard),
        2 => (PointOfSail::BeamReach, Tack::Starboard),
        3 => (PointOfSail::BroadReach, Tack::Starboard),
        4 => (PointOfSail::Run, kept),
        5 => (PointOfSail::BroadReach, Tack::Port),
        6 => (PointOfSail::BeamReach, Tack::Port),
        _ => (PointOfSail::Beat, Tack::Port),
    }
}
