use serde::{Deserialize, Serialize};

/// Direction the snake can move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns true if turning from self to other would be a 180-degree turn
    pub fn is_opposite(&self, other: Direction) -> bool {
        matches!(
            (self, other),
            (Direction::Up, Direction::Down)
                | (Direction::Down, Direction::Up)
                | (Direction::Left, Direction::Right)
                | (Direction::Right, Direction::Left)
        )
    }

    /// Unit vector (dx, dy) in cells. Exactly one axis is nonzero.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Offset in grid units for one step of `grid_size`
    pub fn offset(&self, grid_size: i32) -> (i32, i32) {
        let (dx, dy) = self.delta();
        (dx * grid_size, dy * grid_size)
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_directions() {
        assert!(Direction::Up.is_opposite(Direction::Down));
        assert!(Direction::Down.is_opposite(Direction::Up));
        assert!(Direction::Left.is_opposite(Direction::Right));
        assert!(Direction::Right.is_opposite(Direction::Left));

        assert!(!Direction::Up.is_opposite(Direction::Left));
        assert!(!Direction::Up.is_opposite(Direction::Right));
        assert!(!Direction::Up.is_opposite(Direction::Up));
    }

    #[test]
    fn test_direction_offset_is_scaled() {
        assert_eq!(Direction::Up.offset(20), (0, -20));
        assert_eq!(Direction::Down.offset(20), (0, 20));
        assert_eq!(Direction::Left.offset(20), (-20, 0));
        assert_eq!(Direction::Right.offset(20), (20, 0));
    }

    #[test]
    fn test_opposite_round_trips() {
        for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            assert!(dir.is_opposite(dir.opposite()));
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }
}
