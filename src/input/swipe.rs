//! Swipe gestures to directions
//!
//! A gesture is the travel between a press and a release. The dominant axis
//! wins; ties go to the vertical axis.

use crate::game::Direction;

/// Turn a gesture's travel into a direction, or `None` if it is shorter than
/// `min_distance` along its dominant axis
pub fn swipe_direction(dx: i32, dy: i32, min_distance: i32) -> Option<Direction> {
    let min_distance = min_distance.max(1);

    if dx.abs() > dy.abs() {
        if dx.abs() < min_distance {
            return None;
        }
        Some(if dx > 0 { Direction::Right } else { Direction::Left })
    } else {
        if dy.abs() < min_distance {
            return None;
        }
        Some(if dy > 0 { Direction::Down } else { Direction::Up })
    }
}

/// Tracks one gesture at a time
#[derive(Debug, Clone, Default)]
pub struct SwipeTracker {
    start: Option<(i32, i32)>,
    min_distance: i32,
}

impl SwipeTracker {
    pub fn new(min_distance: i32) -> Self {
        Self {
            start: None,
            min_distance,
        }
    }

    pub fn begin(&mut self, x: i32, y: i32) {
        self.start = Some((x, y));
    }

    /// End the gesture. Without a matching `begin` there is nothing to report.
    pub fn finish(&mut self, x: i32, y: i32) -> Option<Direction> {
        let (sx, sy) = self.start.take()?;
        swipe_direction(x - sx, y - sy, self.min_distance)
    }
}
