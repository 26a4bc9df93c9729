use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::{
    action::Direction,
    bounds::Bounds,
    config::{BoundaryPolicy, GameConfig, GameOverPolicy, SpeedTrigger},
    error::PlacementError,
    food, level,
    state::{CollisionType, GameState, Position, RoundEnd, Snake},
};

/// Something the host may want to react to (sound, notices, metrics)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    FoodEaten { score: u32 },
    LevelUp { level: u32, speed_ms: u64 },
    GameOver { score: u32, reason: RoundEnd },
}

/// Result of a game step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepResult {
    /// Whether the snake ate food this step
    pub ate_food: bool,
    /// Whether the level went up this step
    pub level_up: bool,
    /// Set when the round ended; the state has already been reset
    pub round_end: Option<RoundEnd>,
    /// Events for the host, in the order they happened
    pub events: Vec<GameEvent>,
}

/// The game engine that handles all game logic
pub struct GameEngine {
    config: GameConfig,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new game engine with the given configuration
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Engine with a fixed RNG seed, for reproducible games
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Whether `bounds` holds the starting snake with a free cell for food
    pub fn fits(&self, bounds: &Bounds) -> bool {
        bounds.cell_count() > self.config.initial_snake_length.max(1)
    }

    /// Fresh round on the configured viewport
    pub fn reset(&mut self) -> Result<GameState, PlacementError> {
        self.reset_with_bounds(self.config.bounds())
    }

    /// Fresh round on `bounds`: starting snake, level 1 obstacles, new food.
    /// Fails only when `bounds` does not [`fit`](Self::fits) the snake.
    pub fn reset_with_bounds(&mut self, bounds: Bounds) -> Result<GameState, PlacementError> {
        let snake = self.starting_snake(&bounds);
        let snake_cells: HashSet<_> = snake.segments().copied().collect();

        let mut obstacles = level::generate_or_empty(
            1,
            self.config.obstacles,
            &bounds,
            &snake_cells,
            &mut self.rng,
        );

        let occupied = snake_cells.union(&obstacles).copied().collect();
        let food = match food::place(&occupied, &bounds, &mut self.rng) {
            Ok(pos) => pos,
            Err(err) => {
                tracing::warn!(%err, "obstacles leave no room for food, dropping them");
                obstacles.clear();
                food::place(&snake_cells, &bounds, &mut self.rng)?
            }
        };

        Ok(GameState::new(
            snake,
            food,
            obstacles,
            bounds,
            self.config.initial_speed_ms,
        ))
    }

    /// Execute one tick of the game
    pub fn step(&mut self, state: &mut GameState) -> StepResult {
        if let Some(direction) = state.take_pending_direction() {
            if !state.snake.direction.is_opposite(direction) {
                state.snake.direction = direction;
            }
        }

        let bounds = state.bounds;
        let mut new_head = state
            .snake
            .head()
            .stepped(state.snake.direction, bounds.grid_size);

        if !bounds.contains(new_head) {
            match self.config.boundary {
                BoundaryPolicy::Wrap => new_head = bounds.wrap(new_head),
                BoundaryPolicy::HardWall => {
                    return self.end_round(state, RoundEnd::Collision(CollisionType::Wall));
                }
            }
        }

        if let Some(collision) = self.check_collision(state, new_head) {
            return self.end_round(state, RoundEnd::Collision(collision));
        }

        let ate_food = new_head == state.food;
        state.snake.advance(new_head, ate_food);
        state.steps += 1;

        let mut result = StepResult {
            ate_food,
            ..StepResult::default()
        };

        if ate_food {
            state.score += self.config.score_per_food;
            state.food_eaten += 1;
            result.events.push(GameEvent::FoodEaten { score: state.score });
            tracing::debug!(score = state.score, length = state.snake.len(), "food eaten");

            if self.config.speed_trigger == SpeedTrigger::Food {
                state.speed_ms = self.config.faster(state.speed_ms);
            }

            if level::advances_level(state.food_eaten, self.config.level_threshold) {
                self.advance_level(state);
                result.level_up = true;
                result.events.push(GameEvent::LevelUp {
                    level: state.level,
                    speed_ms: state.speed_ms,
                });
            }

            match food::place(&state.occupied(), &bounds, &mut self.rng) {
                Ok(pos) => state.food = pos,
                Err(err) => {
                    tracing::warn!(%err, score = state.score, "board is full");
                    let mut end = self.end_round(state, RoundEnd::BoardFull);
                    result.events.append(&mut end.events);
                    end.events = result.events;
                    end.ate_food = true;
                    end.level_up = result.level_up;
                    return end;
                }
            }
        }

        result
    }

    /// Apply a new viewport. Obstacles or food that no longer fit are
    /// regenerated rather than trusted.
    /// A viewport too small for the starting snake is refused and the old
    /// one kept, so a later reset always has room for food.
    pub fn resize(&mut self, state: &mut GameState, bounds: Bounds) -> bool {
        if !self.fits(&bounds) {
            tracing::warn!(?bounds, "viewport too small for the snake, keeping the old one");
            return false;
        }
        state.bounds = bounds;

        if state.obstacles.iter().any(|pos| !bounds.contains(*pos)) {
            let snake_cells = state.snake.segments().copied().collect();
            state.obstacles = level::generate_or_empty(
                state.level,
                self.config.obstacles,
                &bounds,
                &snake_cells,
                &mut self.rng,
            );
            tracing::debug!(count = state.obstacles.len(), "obstacles regenerated after resize");
        }

        if !bounds.contains(state.food) || state.is_occupied(state.food) {
            match food::place(&state.occupied(), &bounds, &mut self.rng) {
                Ok(pos) => state.food = pos,
                Err(err) => tracing::warn!(%err, "could not move food after resize"),
            }
        }
        true
    }

    /// Check if the new head position causes a collision
    fn check_collision(&self, state: &GameState, pos: Position) -> Option<CollisionType> {
        if state.obstacles.contains(&pos) {
            return Some(CollisionType::Obstacle);
        }

        if state.snake.collides_excluding_tail(pos) {
            return Some(CollisionType::SelfCollision);
        }

        None
    }

    fn advance_level(&mut self, state: &mut GameState) {
        state.level += 1;
        if self.config.speed_trigger == SpeedTrigger::Level {
            state.speed_ms = self.config.faster(state.speed_ms);
        }

        let snake_cells = state.snake.segments().copied().collect();
        state.obstacles = level::generate_or_empty(
            state.level,
            self.config.obstacles,
            &state.bounds,
            &snake_cells,
            &mut self.rng,
        );

        tracing::info!(
            level = state.level,
            speed_ms = state.speed_ms,
            obstacles = state.obstacles.len(),
            "level up"
        );
    }

    /// Finish the round and start the next one on the same field
    fn end_round(&mut self, state: &mut GameState, reason: RoundEnd) -> StepResult {
        let score = state.score;
        tracing::info!(score, level = state.level, steps = state.steps, ?reason, "game over");

        match self.reset_with_bounds(state.bounds) {
            Ok(fresh) => *state = fresh,
            Err(err) => tracing::error!(%err, "no room to start the next round"),
        }

        let events = match self.config.game_over {
            GameOverPolicy::Notify => vec![GameEvent::GameOver { score, reason }],
            GameOverPolicy::SilentReset => Vec::new(),
        };

        StepResult {
            round_end: Some(reason),
            events,
            ..StepResult::default()
        }
    }

    /// The fixed starting snake, head at the configured cell, heading right
    fn starting_snake(&self, bounds: &Bounds) -> Snake {
        let length = self.config.initial_snake_length.max(1);
        let (col, row) = self.config.start_cell;
        let col = col
            .max(length as i32 - 1)
            .min(bounds.columns() - 1)
            .max(0);
        let row = row.min(bounds.rows() - 1).max(0);

        Snake::new(bounds.cell(col, row), Direction::Right, length, bounds.grid_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::ObstacleLayout;
    use rand::Rng;

    const G: i32 = 20;

    fn config() -> GameConfig {
        GameConfig {
            obstacles: ObstacleLayout::Random { per_level: 0 },
            ..GameConfig::new(20, 20)
        }
    }

    fn state_with(snake: Snake, food: Position) -> GameState {
        GameState::new(snake, food, HashSet::new(), config().bounds(), 100)
    }

    #[test]
    fn test_reset() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 1);
        let state = engine.reset().unwrap();

        assert_eq!(state.score, 0);
        assert_eq!(state.level, 1);
        assert_eq!(state.steps, 0);
        assert_eq!(state.speed_ms, 100);
        assert_eq!(state.snake.len(), 3);
        assert_eq!(state.snake.direction, Direction::Right);
        assert_eq!(state.snake.head(), state.bounds.cell(5, 5));
        assert_eq!(state.obstacles.len(), 2);
        assert!(!state.is_occupied(state.food));
        assert!(state.bounds.contains(state.food));
    }

    #[test]
    fn test_basic_movement() {
        let mut engine = GameEngine::with_seed(config(), 2);
        let mut state = state_with(
            Snake::new(Position::new(100, 100), Direction::Right, 3, G),
            Position::new(300, 300),
        );

        let result = engine.step(&mut state);

        assert!(!result.ate_food);
        assert!(result.round_end.is_none());
        assert_eq!(state.steps, 1);
        assert_eq!(state.snake.len(), 3);
        assert_eq!(state.snake.head(), Position::new(120, 100));
        assert_eq!(state.snake.segments().last(), Some(&Position::new(80, 100)));
    }

    #[test]
    fn test_single_cell_snake_eats_and_grows() {
        let mut engine = GameEngine::with_seed(config(), 3);
        let mut state = state_with(
            Snake::from_segments([Position::new(100, 100)], Direction::Right),
            Position::new(120, 100),
        );

        let result = engine.step(&mut state);

        assert!(result.ate_food);
        assert_eq!(result.events, vec![GameEvent::FoodEaten { score: 1 }]);
        let body: Vec<_> = state.snake.segments().copied().collect();
        assert_eq!(body, vec![Position::new(120, 100), Position::new(100, 100)]);
        assert_eq!(state.score, 1);
        assert!(!state.snake.contains(state.food));
    }

    #[test]
    fn test_level_advance_after_threshold() {
        let cfg = GameConfig {
            obstacles: ObstacleLayout::Random { per_level: 2 },
            ..config()
        };
        let mut engine = GameEngine::with_seed(cfg, 4);
        let mut state = state_with(
            Snake::new(Position::new(100, 100), Direction::Right, 3, G),
            Position::new(120, 100),
        );
        state.food_eaten = 4;
        state.score = 4;

        let result = engine.step(&mut state);

        assert!(result.level_up);
        assert_eq!(state.level, 2);
        assert_eq!(state.speed_ms, 95);
        assert_eq!(state.obstacles.len(), 4);
        assert!(state.obstacles.iter().all(|o| !state.snake.contains(*o)));
        assert!(!state.is_occupied(state.food));
        assert_eq!(
            result.events,
            vec![
                GameEvent::FoodEaten { score: 5 },
                GameEvent::LevelUp { level: 2, speed_ms: 95 }
            ]
        );
    }

    #[test]
    fn test_speed_never_drops_below_floor() {
        let mut engine = GameEngine::with_seed(config(), 5);
        let mut state = state_with(
            Snake::new(Position::new(100, 100), Direction::Right, 3, G),
            Position::new(120, 100),
        );
        state.food_eaten = 9;
        state.speed_ms = 52;

        engine.step(&mut state);

        assert_eq!(state.level, 2);
        assert_eq!(state.speed_ms, 50);
    }

    #[test]
    fn test_speed_per_food() {
        let cfg = GameConfig {
            speed_trigger: SpeedTrigger::Food,
            ..config()
        };
        let mut engine = GameEngine::with_seed(cfg, 6);
        let mut state = state_with(
            Snake::new(Position::new(100, 100), Direction::Right, 3, G),
            Position::new(120, 100),
        );

        engine.step(&mut state);

        assert_eq!(state.level, 1);
        assert_eq!(state.speed_ms, 95);
    }

    #[test]
    fn test_wrap_through_right_edge() {
        let mut engine = GameEngine::with_seed(config(), 7);
        let bounds = config().bounds();
        let edge = Position::new(bounds.width - G, 100);
        let mut state = state_with(
            Snake::new(edge, Direction::Right, 3, G),
            Position::new(300, 300),
        );

        let result = engine.step(&mut state);

        assert!(result.round_end.is_none());
        assert_eq!(state.snake.head(), Position::new(0, 100));
    }

    #[test]
    fn test_wrap_skips_header_band() {
        let mut engine = GameEngine::with_seed(config(), 8);
        let bounds = config().bounds();
        let mut state = state_with(
            Snake::new(Position::new(100, bounds.header), Direction::Up, 3, G),
            Position::new(300, 300),
        );

        engine.step(&mut state);

        assert_eq!(state.snake.head(), Position::new(100, bounds.height - G));
    }

    #[test]
    fn test_hard_wall_ends_round() {
        let cfg = GameConfig {
            boundary: BoundaryPolicy::HardWall,
            ..config()
        };
        let mut engine = GameEngine::with_seed(cfg, 9);
        let bounds = config().bounds();
        let mut state = state_with(
            Snake::new(Position::new(bounds.width - G, 100), Direction::Right, 3, G),
            Position::new(300, 300),
        );
        state.score = 12;
        state.level = 3;

        let result = engine.step(&mut state);

        let reason = RoundEnd::Collision(CollisionType::Wall);
        assert_eq!(result.round_end, Some(reason));
        assert_eq!(result.events, vec![GameEvent::GameOver { score: 12, reason }]);
        assert_eq!(state.score, 0);
        assert_eq!(state.level, 1);
        assert_eq!(state.speed_ms, 100);
        assert_eq!(state.snake.len(), 3);
    }

    #[test]
    fn test_hard_wall_header_is_fatal() {
        let cfg = GameConfig {
            boundary: BoundaryPolicy::HardWall,
            ..config()
        };
        let mut engine = GameEngine::with_seed(cfg, 10);
        let bounds = config().bounds();
        let mut state = state_with(
            Snake::new(Position::new(100, bounds.header), Direction::Up, 3, G),
            Position::new(300, 300),
        );

        let result = engine.step(&mut state);

        assert_eq!(
            result.round_end,
            Some(RoundEnd::Collision(CollisionType::Wall))
        );
    }

    #[test]
    fn test_obstacle_collision() {
        let mut engine = GameEngine::with_seed(config(), 11);
        let mut state = state_with(
            Snake::new(Position::new(100, 100), Direction::Right, 3, G),
            Position::new(300, 300),
        );
        state.obstacles.insert(Position::new(120, 100));
        state.score = 3;

        let result = engine.step(&mut state);

        assert_eq!(
            result.round_end,
            Some(RoundEnd::Collision(CollisionType::Obstacle))
        );
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_self_collision() {
        let mut engine = GameEngine::with_seed(config(), 12);
        let mut state = state_with(
            Snake::new(Position::new(100, 100), Direction::Right, 5, G),
            Position::new(300, 300),
        );

        state.set_pending_direction(Direction::Down);
        engine.step(&mut state);
        state.set_pending_direction(Direction::Left);
        engine.step(&mut state);
        state.set_pending_direction(Direction::Up);
        let result = engine.step(&mut state);

        assert_eq!(
            result.round_end,
            Some(RoundEnd::Collision(CollisionType::SelfCollision))
        );
    }

    #[test]
    fn test_moving_into_departing_tail_is_safe() {
        let mut engine = GameEngine::with_seed(config(), 13);
        let mut state = state_with(
            Snake::from_segments(
                [
                    Position::new(100, 100),
                    Position::new(100, 120),
                    Position::new(120, 120),
                    Position::new(120, 100),
                ],
                Direction::Right,
            ),
            Position::new(300, 300),
        );

        let result = engine.step(&mut state);

        assert!(result.round_end.is_none());
        assert_eq!(state.snake.head(), Position::new(120, 100));
        assert_eq!(state.snake.len(), 4);
    }

    #[test]
    fn test_silent_reset_emits_nothing() {
        let cfg = GameConfig {
            game_over: GameOverPolicy::SilentReset,
            ..config()
        };
        let mut engine = GameEngine::with_seed(cfg, 14);
        let mut state = state_with(
            Snake::new(Position::new(100, 100), Direction::Right, 3, G),
            Position::new(300, 300),
        );
        state.obstacles.insert(Position::new(120, 100));

        let result = engine.step(&mut state);

        assert!(result.round_end.is_some());
        assert!(result.events.is_empty());
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_prevent_180_degree_turn() {
        let mut engine = GameEngine::with_seed(config(), 15);
        let mut state = state_with(
            Snake::new(Position::new(100, 100), Direction::Right, 3, G),
            Position::new(300, 300),
        );

        assert!(!state.set_pending_direction(Direction::Left));
        engine.step(&mut state);

        assert_eq!(state.snake.direction, Direction::Right);
        assert_eq!(state.snake.head(), Position::new(120, 100));
    }

    #[test]
    fn test_one_turn_per_tick() {
        let mut engine = GameEngine::with_seed(config(), 16);
        let mut state = state_with(
            Snake::new(Position::new(100, 100), Direction::Right, 3, G),
            Position::new(300, 300),
        );

        // Up then Left between two ticks: Left would reverse the travelled
        // direction and is dropped, so only the turn up happens.
        assert!(state.set_pending_direction(Direction::Up));
        assert!(!state.set_pending_direction(Direction::Left));
        let result = engine.step(&mut state);

        assert!(result.round_end.is_none());
        assert_eq!(state.snake.head(), Position::new(100, 80));
        assert_eq!(state.pending_direction(), None);
    }

    #[test]
    fn test_board_full_ends_round() {
        let cfg = GameConfig {
            initial_snake_length: 1,
            obstacles: ObstacleLayout::Random { per_level: 0 },
            ..GameConfig::new(3, 1)
        };
        let mut engine = GameEngine::with_seed(cfg.clone(), 17);
        let bounds = cfg.bounds();
        let mut state = GameState::new(
            Snake::from_segments([bounds.cell(1, 0), bounds.cell(0, 0)], Direction::Right),
            bounds.cell(2, 0),
            HashSet::new(),
            bounds,
            100,
        );
        state.score = 1;

        let result = engine.step(&mut state);

        assert!(result.ate_food);
        assert_eq!(result.round_end, Some(RoundEnd::BoardFull));
        assert_eq!(
            result.events,
            vec![
                GameEvent::FoodEaten { score: 2 },
                GameEvent::GameOver { score: 2, reason: RoundEnd::BoardFull }
            ]
        );
        assert_eq!(state.score, 0);
        assert_eq!(state.snake.len(), 1);
        assert!(!state.snake.contains(state.food));
    }

    #[test]
    fn test_smallest_board_keeps_food_off_the_snake() {
        let cfg = GameConfig {
            obstacles: ObstacleLayout::Random { per_level: 0 },
            ..GameConfig::new(4, 1)
        };
        assert!(cfg.validate().is_ok());
        let mut engine = GameEngine::with_seed(cfg, 22);
        let mut state = engine.reset().unwrap();

        assert!(!state.snake.contains(state.food));
        assert_eq!(state.food, state.bounds.cell(0, 0));

        // The head wraps onto the only free cell and fills the board
        let result = engine.step(&mut state);
        assert_eq!(result.round_end, Some(RoundEnd::BoardFull));
        assert_eq!(
            result.events,
            vec![
                GameEvent::FoodEaten { score: 1 },
                GameEvent::GameOver { score: 1, reason: RoundEnd::BoardFull }
            ]
        );
        assert_eq!(state.snake.len(), 3);
        assert!(!state.snake.contains(state.food));
    }

    #[test]
    fn test_reset_drops_obstacles_that_crowd_out_food() {
        let cfg = GameConfig {
            obstacles: ObstacleLayout::Random { per_level: 1 },
            ..GameConfig::new(4, 1)
        };
        let mut engine = GameEngine::with_seed(cfg, 23);

        let state = engine.reset().unwrap();

        assert!(state.obstacles.is_empty());
        assert!(!state.is_occupied(state.food));
    }

    #[test]
    fn test_reset_refuses_board_without_room_for_food() {
        let mut engine = GameEngine::with_seed(config(), 24);
        let bounds = Bounds::from_cells(3, 1, 2, G);

        assert!(!engine.fits(&bounds));
        assert!(engine.reset_with_bounds(bounds).is_err());
    }

    #[test]
    fn test_resize_revalidates_food_and_obstacles() {
        let mut engine = GameEngine::with_seed(config(), 18);
        let mut state = state_with(
            Snake::new(Position::new(100, 100), Direction::Right, 3, G),
            Position::new(380, 400),
        );
        state.obstacles = [Position::new(360, 360), Position::new(140, 140)].into();

        let smaller = Bounds::from_cells(10, 10, 2, G);
        assert!(engine.resize(&mut state, smaller));

        assert_eq!(state.bounds, smaller);
        assert!(smaller.contains(state.food));
        assert!(!state.is_occupied(state.food));
        assert!(state.obstacles.iter().all(|o| smaller.contains(*o)));
    }

    #[test]
    fn test_resize_keeps_valid_positions() {
        let mut engine = GameEngine::with_seed(config(), 19);
        let mut state = state_with(
            Snake::new(Position::new(100, 100), Direction::Right, 3, G),
            Position::new(160, 160),
        );
        state.obstacles = [Position::new(140, 140)].into();

        engine.resize(&mut state, Bounds::from_cells(30, 30, 2, G));

        assert_eq!(state.food, Position::new(160, 160));
        assert!(state.obstacles.contains(&Position::new(140, 140)));
    }

    #[test]
    fn test_resize_refuses_field_smaller_than_snake() {
        let mut engine = GameEngine::with_seed(config(), 25);
        let mut state = state_with(
            Snake::new(Position::new(100, 100), Direction::Right, 3, G),
            Position::new(160, 160),
        );
        let before = state.bounds;

        assert!(!engine.resize(&mut state, Bounds::from_cells(3, 1, 2, G)));
        assert_eq!(state.bounds, before);
        assert_eq!(state.food, Position::new(160, 160));
    }

    #[test]
    fn test_random_play_keeps_invariants() {
        let cfg = GameConfig {
            level_threshold: 2,
            ..GameConfig::small()
        };
        let mut engine = GameEngine::with_seed(cfg, 20);
        let mut state = engine.reset().unwrap();
        let mut steering = StdRng::seed_from_u64(21);
        let directions = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

        for _ in 0..2_000 {
            state.set_pending_direction(directions[steering.gen_range(0..4)]);
            let before = state.snake.len();

            let result = engine.step(&mut state);

            if result.round_end.is_some() {
                assert_eq!(state.score, 0);
                assert_eq!(state.level, 1);
            } else {
                let expected = before + usize::from(result.ate_food);
                assert_eq!(state.snake.len(), expected);
            }
            assert!(!state.is_occupied(state.food));
            assert!(state.bounds.contains(state.food));
            assert!(state.obstacles.iter().all(|o| state.bounds.contains(*o)));
            assert!(state.speed_ms >= 50);
        }
    }
}
