//! Grid coordinates and compass directions.
//!
//! The board is a square grid with `(0, 0)` at the bottom-left corner. Moves
//! are single steps toward one of the eight compass points, and the wind
//! always blows from one of those points as well.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Returns the neighbouring cell one step toward `dir`.
    pub const fn step(self, dir: Direction) -> Position {
        let (dx, dy) = dir.delta();
        Position::new(self.x + dx, self.y + dy)
    }

    /// Returns the cell `n` steps toward `dir`.
    pub const fn steps(self, dir: Direction, n: i32) -> Position {
        let (dx, dy) = dir.delta();
        Position::new(self.x + dx * n, self.y + dy * n)
    }

    /// Whether the cell lies on a board of `size` x `size` cells.
    pub const fn in_bounds(self, size: i32) -> bool {
        self.x >= 0 && self.y >= 0 && self.x < size && self.y < size
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// One of the eight compass points, indexed clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

/// All directions in clockwise order starting at north.
pub const ALL_DIRECTIONS: [Direction; 8] = [
    Direction::N,
    Direction::NE,
    Direction::E,
    Direction::SE,
    Direction::S,
    Direction::SW,
    Direction::W,
    Direction::NW,
];

/// The four cardinal directions in clockwise order.
pub const CARDINALS: [Direction; 4] = [Direction::N, Direction::E, Direction::S, Direction::W];

impl Direction {
    /// Clockwise index, N = 0 through NW = 7.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the direction at clockwise index `i` (taken modulo 8).
    pub const fn from_index(i: usize) -> Direction {
        ALL_DIRECTIONS[i % 8]
    }

    /// Unit grid offset for a single step.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::N => (0, 1),
            Direction::NE => (1, 1),
            Direction::E => (1, 0),
            Direction::SE => (1, -1),
            Direction::S => (0, -1),
            Direction::SW => (-1, -1),
            Direction::W => (-1, 0),
            Direction::NW => (-1, 1),
        }
    }

    pub const fn opposite(self) -> Direction {
        Direction::from_index(self.index() + 4)
    }

    /// Rotates clockwise by `eighths` 45-degree steps.
    pub const fn rotate_cw(self, eighths: usize) -> Direction {
        Direction::from_index(self.index() + eighths % 8)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::N => "N",
            Direction::NE => "NE",
            Direction::E => "E",
            Direction::SE => "SE",
            Direction::S => "S",
            Direction::SW => "SW",
            Direction::W => "W",
            Direction::NW => "NW",
        }
    }

    /// Direction of a straight move from `from` to `to`.
    ///
    /// Returns `None` when the cells coincide or the move is neither
    /// orthogonal nor exactly diagonal.
    pub fn between(from: Position, to: Position) -> Option<Direction> {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if (dx == 0 && dy == 0) || (dx != 0 && dy != 0 && dx.abs() != dy.abs()) {
            return None;
        }
        let unit = (dx.signum(), dy.signum());
        ALL_DIRECTIONS.iter().copied().find(|d| d.delta() == unit)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_DIRECTIONS
            .iter()
            .copied()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown direction: {}", s))
    }
}

/// Wind origins available when the wind is chosen or shifted by a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindDirection {
    NW,
    NE,
    SE,
    SW,
}

pub const ALL_WIND_DIRECTIONS: [WindDirection; 4] = [
    WindDirection::NW,
    WindDirection::NE,
    WindDirection::SE,
    WindDirection::SW,
];

impl WindDirection {
    pub const fn direction(self) -> Direction {
        match self {
            WindDirection::NW => Direction::NW,
            WindDirection::NE => Direction::NE,
            WindDirection::SE => Direction::SE,
            WindDirection::SW => Direction::SW,
        }
    }

    pub const fn as_str(self) -> &'static str {
        self.direction().as_str()
    }
}

impl From<WindDirection> for Direction {
    fn from(w: WindDirection) -> Direction {
        w.direction()
    }
}

impl TryFrom<Direction> for WindDirection {
    type Error = String;

    fn try_from(d: Direction) -> Result<Self, Self::Error> {
        ALL_WIND_DIRECTIONS
            .iter()
            .copied()
            .find(|w| w.direction() == d)
            .ok_or_else(|| format!("{} is not a diagonal wind direction", d))
    }
}

impl FromStr for WindDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dir: Direction = s.parse()?;
        WindDirection::try_from(dir)
    }
}

impl fmt::Display for WindDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
