use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::action::Direction;
use super::bounds::Bounds;

/// A grid-aligned position on the play field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move position one cell of `grid_size` in a direction
    pub fn stepped(&self, direction: Direction, grid_size: i32) -> Self {
        let (dx, dy) = direction.offset(grid_size);
        self.moved_by(dx, dy)
    }
}

/// The snake in the game
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at the front
    body: VecDeque<Position>,
    /// Direction the snake moved in on its last tick
    pub direction: Direction,
}

impl Snake {
    /// Create a snake whose body trails behind `head`, away from `direction`
    pub fn new(head: Position, direction: Direction, length: usize, grid_size: i32) -> Self {
        let back = direction.opposite();
        let body = std::iter::successors(Some(head), |pos| Some(pos.stepped(back, grid_size)))
            .take(length.max(1))
            .collect();

        Self { body, direction }
    }

    /// Build a snake from explicit segments, head first
    #[cfg(test)]
    pub(crate) fn from_segments(segments: impl IntoIterator<Item = Position>, direction: Direction) -> Self {
        let body: VecDeque<_> = segments.into_iter().collect();
        assert!(!body.is_empty(), "a snake needs at least one segment");
        Self { body, direction }
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }

    pub fn segments(&self) -> impl ExactSizeIterator<Item = &Position> + '_ {
        self.body.iter()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// True if `pos` hits a segment that is still there after this tick,
    /// i.e. any segment except the tail which is about to move away
    pub fn collides_excluding_tail(&self, pos: Position) -> bool {
        let keep = self.body.len() - 1;
        self.body.iter().take(keep).any(|segment| *segment == pos)
    }

    /// Prepend a new head; drop the tail unless the snake just ate
    pub fn advance(&mut self, new_head: Position, grow: bool) {
        self.body.push_front(new_head);
        if !grow {
            self.body.pop_back();
        }
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Type of collision that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionType {
    /// Snake left the field under the hard-wall policy
    Wall,
    /// Snake hit an obstacle or maze wall
    Obstacle,
    /// Snake hit itself
    SelfCollision,
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEnd {
    Collision(CollisionType),
    /// No free cell left for the next food
    BoardFull,
}

/// Complete game state for one session
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub snake: Snake,
    pub food: Position,
    pub obstacles: HashSet<Position>,
    pub bounds: Bounds,
    pub score: u32,
    pub level: u32,
    /// Food eaten this round, drives level advances
    pub food_eaten: u32,
    /// Current tick period in milliseconds
    pub speed_ms: u64,
    pub steps: u64,
    /// Direction to apply at the start of the next tick
    pending_direction: Option<Direction>,
}

impl GameState {
    pub fn new(
        snake: Snake,
        food: Position,
        obstacles: HashSet<Position>,
        bounds: Bounds,
        speed_ms: u64,
    ) -> Self {
        Self {
            snake,
            food,
            obstacles,
            bounds,
            score: 0,
            level: 1,
            food_eaten: 0,
            speed_ms,
            steps: 0,
            pending_direction: None,
        }
    }

    /// Post a direction from the input side. Reversals of the direction the
    /// snake last moved in are ignored; otherwise the value overwrites any
    /// direction already pending for the next tick.
    pub fn set_pending_direction(&mut self, direction: Direction) -> bool {
        if self.snake.direction.is_opposite(direction) {
            tracing::trace!(?direction, current = ?self.snake.direction, "ignored reversal");
            return false;
        }
        self.pending_direction = Some(direction);
        true
    }

    #[cfg(test)]
    pub(crate) fn pending_direction(&self) -> Option<Direction> {
        self.pending_direction
    }

    /// Take the pending direction for the tick that is starting
    pub(crate) fn take_pending_direction(&mut self) -> Option<Direction> {
        self.pending_direction.take()
    }

    /// How long until the next tick should run
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.speed_ms)
    }

    /// Cells food may not be placed on
    pub fn occupied(&self) -> HashSet<Position> {
        self.snake
            .segments()
            .copied()
            .chain(self.obstacles.iter().copied())
            .collect()
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.snake.contains(pos) || self.obstacles.contains(&pos)
    }

    /// Read-only view for the renderer
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            snake: &self.snake,
            food: self.food,
            obstacles: &self.obstacles,
            bounds: self.bounds,
            score: self.score,
            level: self.level,
            speed_ms: self.speed_ms,
        }
    }
}

/// What the renderer gets to see after each tick
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub snake: &'a Snake,
    pub food: Position,
    pub obstacles: &'a HashSet<Position>,
    pub bounds: Bounds,
    pub score: u32,
    pub level: u32,
    pub speed_ms: u64,
}
