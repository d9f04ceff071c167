//! Plane geometry on grid coordinates.
//!
//! Segment intersection uses the parametric form: for segments `P1P2` and
//! `P3P4`, solve `P1 + ua (P2 - P1) = P3 + ub (P4 - P3)`. The segments meet
//! when the denominator is non-zero and both `ua` and `ub` fall in `[0, 1]`.
//! All grid inputs are integers, so the range tests are done exactly in
//! `i64` and only the returned intersection point uses floating point.

use thiserror::Error;

use super::position::{Direction, Position, CARDINALS};

/// Errors from geometric helpers.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("ray has zero length")]
    ZeroLengthRay,
    #[error("circle radius must be positive, got {0}")]
    InvalidRadius(f64),
}

/// A point in continuous plane coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

impl From<Position> for Point {
    fn from(p: Position) -> Self {
        Point::new(p.x as f64, p.y as f64)
    }
}

/// z-component of the cross product of two plane vectors.
const fn cross(ax: i64, ay: i64, bx: i64, by: i64) -> i64 {
    ax * by - ay * bx
}

/// `num / den` lies in `[0, 1]`, for `den != 0`.
const fn unit_ratio(num: i64, den: i64) -> bool {
    if den > 0 {
        num >= 0 && num <= den
    } else {
        num <= 0 && num >= den
    }
}

/// Intersection point of the finite segments `a` and `b`.
///
/// Returns `None` for parallel (including collinear) segments and for
/// segments whose infinite lines meet outside either segment.
pub fn intersect(a: [Position; 2], b: [Position; 2]) -> Option<Point> {
    let (x1, y1) = (a[0].x as i64, a[0].y as i64);
    let (x2, y2) = (a[1].x as i64, a[1].y as i64);
    let (x3, y3) = (b[0].x as i64, b[0].y as i64);
    let (x4, y4) = (b[1].x as i64, b[1].y as i64);

    let den = (y4 - y3) * (x2 - x1) - (x4 - x3) * (y2 - y1);
    if den == 0 {
        return None;
    }
    let ua_num = (x4 - x3) * (y1 - y3) - (y4 - y3) * (x1 - x3);
    let ub_num = (x2 - x1) * (y1 - y3) - (y2 - y1) * (x1 - x3);
    if !unit_ratio(ua_num, den) || !unit_ratio(ub_num, den) {
        return None;
    }

    let ua = ua_num as f64 / den as f64;
    Some(Point::new(
        x1 as f64 + ua * (x2 - x1) as f64,
        y1 as f64 + ua * (y2 - y1) as f64,
    ))
}

/// Where the ray from `center` through `through` leaves the circle of
/// `radius` around `center`.
pub fn ray_circle_intersection(
    center: Point,
    through: Point,
    radius: f64,
) -> Result<Point, GeometryError> {
    if !(radius > 0.0) {
        return Err(GeometryError::InvalidRadius(radius));
    }
    let dx = through.x - center.x;
    let dy = through.y - center.y;
    let len = dx.hypot(dy);
    if len == 0.0 {
        return Err(GeometryError::ZeroLengthRay);
    }
    Ok(Point::new(
        center.x + dx / len * radius,
        center.y + dy / len * radius,
    ))
}

/// Classifies a move across a finite line segment by compass half-plane.
///
/// Returns the empty set when the move does not touch the segment.
/// Otherwise the segment splits the compass into two halves, and every
/// cardinal direction in the same half as the move's heading is reported.
/// A single crossing therefore usually yields two letters: a westward move
/// across a line running from `(5,5)` to `(10,10)` crosses it both "to the
/// north" and "to the west". Callers test for the letter they care about.
/// Cardinals parallel to the segment are never reported.
pub fn move_crosses_line_segment(
    move_start: Position,
    move_end: Position,
    line: [Position; 2],
) -> Vec<Direction> {
    if intersect([move_start, move_end], line).is_none() {
        return Vec::new();
    }
    let lx = (line[1].x - line[0].x) as i64;
    let ly = (line[1].y - line[0].y) as i64;
    let mx = (move_end.x - move_start.x) as i64;
    let my = (move_end.y - move_start.y) as i64;
    let side = cross(lx, ly, mx, my).signum();
    if side == 0 {
        return Vec::new();
    }
    CARDINALS
        .iter()
        .copied()
        .filter(|c| {
            let (cx, cy) = c.delta();
            cross(lx, ly, cx as i64, cy as i64).signum() == side
        })
        .collect()
}

/// Signed side of `p` relative to the infinite line through `line`:
/// positive on the left when looking from `line[0]` toward `line[1]`.
pub fn side_of_line(line: [Position; 2], p: Position) -> i64 {
    let lx = (line[1].x - line[0].x) as i64;
    let ly = (line[1].y - line[0].y) as i64;
    let px = (p.x - line[0].x) as i64;
    let py = (p.y - line[0].y) as i64;
    cross(lx, ly, px, py).signum()
}
