use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use super::swipe::SwipeTracker;
use crate::game::Direction;

/// Terminal columns per board cell; horizontal drags are scaled by this
const COLUMNS_PER_CELL: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Steer(Direction),
    Restart,
    Quit,
    None,
}

pub struct InputHandler {
    swipe: SwipeTracker,
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            swipe: SwipeTracker::new(1),
        }
    }

    pub fn handle_key_event(&self, key: KeyEvent) -> KeyAction {
        // Handle Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        match key.code {
            // Movement - Arrow keys
            KeyCode::Up => KeyAction::Steer(Direction::Up),
            KeyCode::Down => KeyAction::Steer(Direction::Down),
            KeyCode::Left => KeyAction::Steer(Direction::Left),
            KeyCode::Right => KeyAction::Steer(Direction::Right),

            // Movement - WASD
            KeyCode::Char('w') | KeyCode::Char('W') => KeyAction::Steer(Direction::Up),
            KeyCode::Char('s') | KeyCode::Char('S') => KeyAction::Steer(Direction::Down),
            KeyCode::Char('a') | KeyCode::Char('A') => KeyAction::Steer(Direction::Left),
            KeyCode::Char('d') | KeyCode::Char('D') => KeyAction::Steer(Direction::Right),

            // Controls
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Restart,

            _ => KeyAction::None,
        }
    }

    /// A left-button drag across the board acts as a swipe
    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) -> KeyAction {
        let x = i32::from(mouse.column) / COLUMNS_PER_CELL;
        let y = i32::from(mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.swipe.begin(x, y);
                KeyAction::None
            }
            MouseEventKind::Up(MouseButton::Left) => self
                .swipe
                .finish(x, y)
                .map(KeyAction::Steer)
                .unwrap_or(KeyAction::None),
            _ => KeyAction::None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
