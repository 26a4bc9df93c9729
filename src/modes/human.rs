use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
        size as terminal_size,
    },
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, Write, stderr};
use std::time::Duration;
use tokio::time::{Instant, interval, sleep};

use crate::game::{Bounds, GameEngine, GameEvent, GameState, RoundEnd};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::GameMetrics;
use crate::render::Renderer;

/// How long the game-over notice stays up; play continues underneath
const NOTICE_DURATION: Duration = Duration::from_millis(1500);

/// Where the board size comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportSource {
    /// Follow the terminal, including resizes
    Terminal,
    /// Use the configured viewport as is
    Fixed,
}

pub struct HumanMode {
    engine: GameEngine,
    state: GameState,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    viewport: ViewportSource,
    notice: Option<(String, Instant)>,
    should_quit: bool,
}

impl HumanMode {
    pub fn with_engine(mut engine: GameEngine, viewport: ViewportSource) -> Result<Self> {
        let state = engine
            .reset()
            .context("Configured board has no room to start")?;

        Ok(Self {
            engine,
            state,
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            viewport,
            notice: None,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        // Size first: nothing to undo if the query fails
        if self.viewport == ViewportSource::Terminal {
            let (width, height) = terminal_size().context("Failed to read terminal size")?;
            self.fit_to_terminal(width, height, true);
        }

        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        tracing::info!(bounds = ?self.state.bounds, "game started");

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        tracing::info!(
            games = self.metrics.games_played,
            high_score = self.metrics.high_score,
            "game closed"
        );

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // The tick timer is re-armed after every tick with the current speed
        let tick_timer = sleep(self.state.tick_period());
        tokio::pin!(tick_timer);

        // Render at 30 FPS (33ms per frame)
        let render_interval = Duration::from_millis(33);
        let mut render_timer = interval(render_interval);

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event)?;
                    }
                }

                // Game logic tick
                () = &mut tick_timer => {
                    self.update_game()?;
                    tick_timer.as_mut().reset(Instant::now() + self.state.tick_period());
                }

                // Render frame
                _ = render_timer.tick() => {
                    self.metrics.update();
                    self.expire_notice();
                    let notice = self.notice.as_ref().map(|(text, _)| text.as_str());
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &self.state.snapshot(), &self.metrics, notice);
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        let action = match event {
            // Only process key press events, not release
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.input_handler.handle_key_event(key)
            }
            Event::Mouse(mouse) => self.input_handler.handle_mouse_event(mouse),
            Event::Resize(width, height) => {
                if self.viewport == ViewportSource::Terminal {
                    self.fit_to_terminal(width, height, false);
                }
                KeyAction::None
            }
            _ => KeyAction::None,
        };

        self.apply(action);
        Ok(())
    }

    fn apply(&mut self, action: KeyAction) {
        match action {
            KeyAction::Steer(direction) => {
                self.state.set_pending_direction(direction);
            }
            KeyAction::Restart => self.reset_game(),
            KeyAction::Quit => self.should_quit = true,
            KeyAction::None => {}
        }
    }

    fn update_game(&mut self) -> Result<()> {
        let result = self.engine.step(&mut self.state);

        for event in &result.events {
            self.metrics.record(event);
            match event {
                GameEvent::FoodEaten { .. } => ring_bell(),
                GameEvent::LevelUp { .. } => {}
                GameEvent::GameOver { score, reason } => {
                    self.notice = Some((game_over_message(*score, *reason), Instant::now()));
                }
            }
        }

        Ok(())
    }

    fn reset_game(&mut self) {
        match self.engine.reset_with_bounds(self.state.bounds) {
            Ok(state) => self.state = state,
            Err(err) => {
                tracing::warn!(%err, "restart refused");
                return;
            }
        }
        self.metrics.on_game_start();
        self.notice = None;
    }

    /// Recompute the board from the terminal size and hand it to the engine
    fn fit_to_terminal(&mut self, width: u16, height: u16, fresh_round: bool) {
        let config = self.engine.config();
        let header_rows = (config.header_height + config.grid_size - 1) / config.grid_size;
        let bounds = Renderer::viewport_for(width, height, header_rows, config.grid_size);

        if !self.engine.fits(&bounds) {
            tracing::warn!(width, height, "terminal too small for the board");
            return;
        }

        self.apply_bounds(bounds, fresh_round);
    }

    fn apply_bounds(&mut self, bounds: Bounds, fresh_round: bool) {
        let applied = if fresh_round {
            match self.engine.reset_with_bounds(bounds) {
                Ok(state) => {
                    self.state = state;
                    true
                }
                Err(err) => {
                    tracing::warn!(%err, "viewport has no room for a new round");
                    false
                }
            }
        } else {
            self.engine.resize(&mut self.state, bounds)
        };

        if applied {
            tracing::debug!(columns = bounds.columns(), rows = bounds.rows(), "viewport applied");
        }
    }

    fn expire_notice(&mut self) {
        if let Some((_, shown_at)) = &self.notice {
            if shown_at.elapsed() >= NOTICE_DURATION {
                self.notice = None;
            }
        }
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

fn game_over_message(score: u32, reason: RoundEnd) -> String {
    match reason {
        RoundEnd::BoardFull => format!("Board cleared! Score: {}", score),
        RoundEnd::Collision(_) => format!("Game over! Score: {}", score),
    }
}

/// Audible cue for eating; a failed write only costs the beep
fn ring_bell() {
    let mut out = stderr();
    if let Err(err) = out.write_all(b"\x07").and_then(|()| out.flush()) {
        tracing::debug!(%err, "bell failed");
    }
}
