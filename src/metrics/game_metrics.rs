use std::time::{Duration, Instant};

use crate::game::GameEvent;

/// Session-wide numbers shown in the HUD
pub struct GameMetrics {
    pub start_time: Instant,
    pub elapsed_time: Duration,
    pub high_score: u32,
    pub best_level: u32,
    pub games_played: u32,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            elapsed_time: Duration::ZERO,
            high_score: 0,
            best_level: 1,
            games_played: 0,
        }
    }

    pub fn update(&mut self) {
        self.elapsed_time = self.start_time.elapsed();
    }

    pub fn on_game_start(&mut self) {
        self.start_time = Instant::now();
        self.elapsed_time = Duration::ZERO;
    }

    pub fn on_game_over(&mut self, final_score: u32) {
        self.games_played += 1;
        if final_score > self.high_score {
            self.high_score = final_score;
        }
    }

    /// Fold one engine event into the session numbers
    pub fn record(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::FoodEaten { score } => {
                self.high_score = self.high_score.max(score);
            }
            GameEvent::LevelUp { level, .. } => {
                self.best_level = self.best_level.max(level);
            }
            GameEvent::GameOver { score, .. } => {
                self.on_game_over(score);
                self.on_game_start();
            }
        }
    }

    pub fn format_time(&self) -> String {
        let total_secs = self.elapsed_time.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}
