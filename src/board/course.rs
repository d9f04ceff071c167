//! Race course layout and progress tracking.
//!
//! A course is one start line between two buoys plus one or two marker
//! buoys. Boats cross the start line northward to start, round every mark
//! clockwise in order, then cross the start line again to finish.
//!
//! Rounding is detected with four "fences" per mark: rays running from the
//! mark straight north, east, south, and west to just past the board edge.
//! Sailing clockwise around a mark crosses them in the cycle
//! west (heading north), north (heading east), east (heading south),
//! south (heading west). Three consecutive clockwise fence crossings make
//! a rounding. Crossing the most recent fence back the other way takes the
//! last crossing off the chain, and any other counter-clockwise crossing
//! starts the chain over.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::{move_crosses_line_segment, side_of_line};
use super::position::{Direction, Position};

/// Clockwise fence crossings needed to round a mark.
pub const CROSSINGS_TO_ROUND: usize = 3;

/// Errors when building a course.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CourseError {
    #[error("start line buoys must be at different positions")]
    DegenerateStartLine,
    #[error("start line must not run straight north-south")]
    VerticalStartLine,
    #[error("a course needs 1 or 2 marker buoys, got {0}")]
    MarkCount(usize),
    #[error("two buoys share position {0}")]
    OverlappingBuoys(Position),
}

/// Fixed geometry of one race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub start_line: [Position; 2],
    pub marks: Vec<Position>,
}

impl Course {
    /// Validates and builds a course.
    pub fn new(start_line: [Position; 2], marks: Vec<Position>) -> Result<Self, CourseError> {
        if start_line[0] == start_line[1] {
            return Err(CourseError::DegenerateStartLine);
        }
        if start_line[0].x == start_line[1].x {
            return Err(CourseError::VerticalStartLine);
        }
        if marks.is_empty() || marks.len() > 2 {
            return Err(CourseError::MarkCount(marks.len()));
        }
        let course = Course { start_line, marks };
        let buoys: Vec<Position> = course.buoys().collect();
        for (i, a) in buoys.iter().enumerate() {
            if buoys[i + 1..].contains(a) {
                return Err(CourseError::OverlappingBuoys(*a));
            }
        }
        Ok(course)
    }

    /// Start buoys followed by marker buoys.
    pub fn buoys(&self) -> impl Iterator<Item = Position> + '_ {
        self.start_line.iter().chain(self.marks.iter()).copied()
    }

    pub fn is_buoy(&self, pos: Position) -> bool {
        self.buoys().any(|b| b == pos)
    }

    /// Whether `pos` lies strictly on the south side of the start line.
    pub fn is_behind_start(&self, pos: Position) -> bool {
        let [a, b] = self.start_line;
        let line = if a.x < b.x { [a, b] } else { [b, a] };
        side_of_line(line, pos) < 0
    }

    /// Whether a step crosses the start line heading north.
    pub fn crosses_start_northward(&self, from: Position, to: Position) -> bool {
        move_crosses_line_segment(from, to, self.start_line).contains(&Direction::N)
    }

    /// Whether a step touches the start line in any direction.
    pub fn crosses_start(&self, from: Position, to: Position) -> bool {
        !move_crosses_line_segment(from, to, self.start_line).is_empty()
    }

    /// Updates `progress` for a boat stepping from `from` to `to`.
    pub fn track(&self, progress: &mut CourseProgress, from: Position, to: Position, board_size: i32) {
        if progress.has_crossed_finish {
            return;
        }
        if !progress.has_crossed_start {
            if self.crosses_start_northward(from, to) {
                progress.has_crossed_start = true;
                log::debug!("crossed the start line at {}", to);
            }
            return;
        }

        let rounded = progress.marks_rounded();
        if rounded < self.marks.len() {
            if progress.marks.len() <= rounded {
                progress.marks.resize(rounded + 1, MarkRounding::default());
            }
            let mark = self.marks[rounded];
            let state = &mut progress.marks[rounded];
            state.track(mark, from, to, board_size);
            if state.rounded {
                log::debug!("rounded mark {} at {}", rounded + 1, mark);
            }
            return;
        }

        if self.crosses_start(from, to) {
            progress.has_crossed_finish = true;
            log::debug!("crossed the finish at {}", to);
        }
    }
}

impl Default for Course {
    /// The standard triangle on a 30 x 30 board.
    fn default() -> Self {
        Course {
            start_line: [Position::new(5, 5), Position::new(15, 5)],
            marks: vec![Position::new(5, 20), Position::new(20, 16)],
        }
    }
}

/// One of the four rays running outward from a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fence {
    North,
    East,
    South,
    West,
}

/// Fences in the order a clockwise rounding crosses them.
pub const FENCE_CYCLE: [Fence; 4] = [Fence::West, Fence::North, Fence::East, Fence::South];

impl Fence {
    /// Heading of a clockwise crossing.
    pub const fn clockwise_heading(self) -> Direction {
        match self {
            Fence::West => Direction::N,
            Fence::North => Direction::E,
            Fence::East => Direction::S,
            Fence::South => Direction::W,
        }
    }

    pub const fn next_clockwise(self) -> Fence {
        match self {
            Fence::West => Fence::North,
            Fence::North => Fence::East,
            Fence::East => Fence::South,
            Fence::South => Fence::West,
        }
    }

    /// The fence as a segment from the mark to one cell past the board edge.
    pub const fn segment(self, mark: Position, board_size: i32) -> [Position; 2] {
        let end = match self {
            Fence::North => Position::new(mark.x, board_size),
            Fence::East => Position::new(board_size, mark.y),
            Fence::South => Position::new(mark.x, -1),
            Fence::West => Position::new(-1, mark.y),
        };
        [mark, end]
    }

    const fn cycle_index(self) -> usize {
        match self {
            Fence::West => 0,
            Fence::North => 1,
            Fence::East => 2,
            Fence::South => 3,
        }
    }
}

/// Rounding state for one mark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkRounding {
    /// Consecutive clockwise fence crossings, oldest first.
    pub fences: Vec<Fence>,
    pub rounded: bool,
}

impl MarkRounding {
    /// Feeds one step into the chain. Rounding is sticky.
    pub fn track(&mut self, mark: Position, from: Position, to: Position, board_size: i32) {
        if self.rounded {
            return;
        }
        // Visit fences starting with the one a clockwise chain expects next,
        // so a step grazing two fences near the mark is applied in order.
        let start = self
            .fences
            .last()
            .map(|f| f.next_clockwise().cycle_index())
            .unwrap_or(0);
        for i in 0..FENCE_CYCLE.len() {
            let fence = FENCE_CYCLE[(start + i) % FENCE_CYCLE.len()];
            let crossed = move_crosses_line_segment(from, to, fence.segment(mark, board_size));
            if crossed.contains(&fence.clockwise_heading()) {
                self.clockwise(fence);
            } else if crossed.contains(&fence.clockwise_heading().opposite()) {
                self.counter_clockwise(fence);
            }
            if self.rounded {
                return;
            }
        }
    }

    fn clockwise(&mut self, fence: Fence) {
        match self.fences.last() {
            Some(&last) if last == fence => {}
            Some(&last) if last.next_clockwise() == fence => self.fences.push(fence),
            None => self.fences.push(fence),
            Some(_) => self.fences = vec![fence],
        }
        if self.fences.len() >= CROSSINGS_TO_ROUND {
            self.rounded = true;
        }
    }

    fn counter_clockwise(&mut self, fence: Fence) {
        if self.fences.last() == Some(&fence) {
            self.fences.pop();
        } else {
            self.fences.clear();
        }
    }
}

/// Course milestones for one boat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub has_crossed_start: bool,
    /// Rounding state per mark, in course order.
    #[serde(default)]
    pub marks: Vec<MarkRounding>,
    pub has_crossed_finish: bool,
}

impl CourseProgress {
    /// Number of marks rounded so far. Marks are rounded in order.
    pub fn marks_rounded(&self) -> usize {
        self.marks.iter().take_while(|m| m.rounded).count()
    }

    pub fn has_rounded(&self, mark: usize) -> bool {
        self.marks.get(mark).map(|m| m.rounded).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: i32 = 30;

    fn pos(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    /// Walks a boat along `path`, feeding each step into `progress`.
    fn sail(course: &Course, progress: &mut CourseProgress, path: &[Position]) {
        for pair in path.windows(2) {
            course.track(progress, pair[0], pair[1], SIZE);
        }
    }

    /// Straight cells from `from` to `to` inclusive, one step at a time.
    fn line(from: Position, to: Position) -> Vec<Position> {
        let mut cells = vec![from];
        if let Some(dir) = Direction::between(from, to) {
            let mut cur = from;
            while cur != to {
                cur = cur.step(dir);
                cells.push(cur);
            }
        }
        cells
    }

    fn route(waypoints: &[Position]) -> Vec<Position> {
        let mut cells = vec![waypoints[0]];
        for pair in waypoints.windows(2) {
            cells.extend(line(pair[0], pair[1]).into_iter().skip(1));
        }
        cells
    }

    #[test]
    fn default_course_is_valid() {
        let c = Course::default();
        assert_eq!(Course::new(c.start_line, c.marks.clone()), Ok(c));
    }

    #[test]
    fn course_validation() {
        let start = [pos(5, 5), pos(15, 5)];
        assert_eq!(Course::new(start, vec![]), Err(CourseError::MarkCount(0)));
        assert_eq!(
            Course::new(start, vec![pos(1, 1), pos(2, 2), pos(3, 3)]),
            Err(CourseError::MarkCount(3))
        );
        assert_eq!(
            Course::new([pos(5, 5), pos(5, 5)], vec![pos(1, 1)]),
            Err(CourseError::DegenerateStartLine)
        );
        assert_eq!(
            Course::new([pos(5, 5), pos(5, 9)], vec![pos(1, 1)]),
            Err(CourseError::VerticalStartLine)
        );
        assert_eq!(
            Course::new(start, vec![pos(15, 5)]),
            Err(CourseError::OverlappingBuoys(pos(15, 5)))
        );
    }

    #[test]
    fn buoys_and_behind_start() {
        let c = Course::default();
        assert!(c.is_buoy(pos(5, 5)));
        assert!(c.is_buoy(pos(20, 16)));
        assert!(!c.is_buoy(pos(10, 5)));
        assert!(c.is_behind_start(pos(10, 3)));
        assert!(!c.is_behind_start(pos(10, 5)));
        assert!(!c.is_behind_start(pos(10, 8)));
    }

    #[test]
    fn crossing_start_northward_starts_the_race() {
        let c = Course::default();
        let mut p = CourseProgress::default();
        sail(&c, &mut p, &[pos(10, 3), pos(10, 4), pos(10, 5), pos(10, 6)]);
        assert!(p.has_crossed_start);
        assert!(!p.has_crossed_finish);
    }

    #[test]
    fn crossing_outside_the_buoys_does_not_start() {
        let c = Course::default();
        let mut p = CourseProgress::default();
        sail(&c, &mut p, &[pos(20, 3), pos(20, 6)]);
        assert!(!p.has_crossed_start);
    }

    #[test]
    fn clockwise_lap_rounds_marks_and_finishes() {
        let c = Course::default();
        let mut p = CourseProgress::default();
        let path = route(&[
            pos(10, 3),
            pos(10, 8),
            // Up the west side of mark 1 at (5,20), over the top, down the east side.
            pos(3, 15),
            pos(3, 22),
            pos(7, 22),
            pos(7, 18),
            // Over the top of mark 2 at (20,16), down the east side, back under it.
            pos(18, 18),
            pos(22, 18),
            pos(22, 14),
            pos(18, 14),
            // Home across the start line.
            pos(10, 6),
            pos(10, 4),
        ]);
        sail(&c, &mut p, &path);
        assert!(p.has_crossed_start);
        assert!(p.has_rounded(0), "mark 1 should be rounded: {:?}", p.marks);
        assert!(p.has_rounded(1), "mark 2 should be rounded: {:?}", p.marks);
        assert!(p.has_crossed_finish);
    }

    #[test]
    fn counter_clockwise_lap_does_not_round() {
        let c = Course::default();
        let mut p = CourseProgress::default();
        let path = route(&[
            pos(10, 3),
            pos(10, 8),
            pos(7, 11),
            pos(7, 22),
            pos(3, 22),
            pos(3, 18),
        ]);
        sail(&c, &mut p, &path);
        assert!(p.has_crossed_start);
        assert!(!p.has_rounded(0));
        assert_eq!(p.marks_rounded(), 0);
    }

    #[test]
    fn doubling_back_undoes_one_crossing() {
        let mark = pos(5, 20);
        let mut r = MarkRounding::default();
        r.track(mark, pos(3, 19), pos(3, 21), SIZE);
        assert_eq!(r.fences, vec![Fence::West]);
        r.track(mark, pos(4, 22), pos(6, 22), SIZE);
        assert_eq!(r.fences, vec![Fence::West, Fence::North]);
        r.track(mark, pos(6, 22), pos(4, 22), SIZE);
        assert_eq!(r.fences, vec![Fence::West]);
        assert!(!r.rounded);
    }

    #[test]
    fn repeated_fence_is_ignored() {
        let mark = pos(5, 20);
        let mut r = MarkRounding::default();
        r.track(mark, pos(4, 22), pos(5, 22), SIZE);
        r.track(mark, pos(5, 22), pos(6, 22), SIZE);
        assert_eq!(r.fences, vec![Fence::North]);
    }

    #[test]
    fn rounding_is_sticky() {
        let mark = pos(5, 20);
        let mut r = MarkRounding::default();
        for (a, b) in [
            (pos(3, 19), pos(3, 21)),
            (pos(4, 22), pos(6, 22)),
            (pos(7, 21), pos(7, 19)),
        ] {
            r.track(mark, a, b, SIZE);
        }
        assert!(r.rounded);
        r.track(mark, pos(7, 19), pos(7, 21), SIZE);
        assert!(r.rounded);
    }

    #[test]
    fn marks_before_start_are_ignored() {
        let c = Course::default();
        let mut p = CourseProgress::default();
        let path = route(&[pos(3, 15), pos(3, 22), pos(7, 22), pos(7, 18)]);
        sail(&c, &mut p, &path);
        assert!(!p.has_crossed_start);
        assert_eq!(p.marks_rounded(), 0);
    }
}
