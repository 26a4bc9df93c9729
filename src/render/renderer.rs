use std::collections::HashSet;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::game::{Bounds, Direction, Position, Snapshot};
use crate::metrics::GameMetrics;

/// Terminal columns used to draw one board cell
pub const CELL_WIDTH: u16 = 2;
/// Rows under the board used for the controls line
const FOOTER_HEIGHT: u16 = 1;

const OBSTACLE_COLOR: Color = Color::Rgb(139, 69, 19);

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Board geometry that fits a terminal of `width` x `height`
    pub fn viewport_for(width: u16, height: u16, header_rows: i32, grid_size: i32) -> Bounds {
        let columns = i32::from(width.saturating_sub(2) / CELL_WIDTH);
        let rows = i32::from(height.saturating_sub(2 + FOOTER_HEIGHT)) - header_rows;
        Bounds::from_cells(columns, rows.max(0), header_rows, grid_size)
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        snapshot: &Snapshot,
        metrics: &GameMetrics,
        notice: Option<&str>,
    ) {
        let chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(FOOTER_HEIGHT)])
            .split(frame.area());

        let bounds = snapshot.bounds;
        let board_width = clamp_u16(bounds.columns())
            .saturating_mul(CELL_WIDTH)
            .saturating_add(2);
        let board_height =
            clamp_u16(bounds.header_rows().saturating_add(bounds.rows())).saturating_add(2);
        let board_area = centered(chunks[0], board_width, board_height);

        frame.render_widget(self.render_board(snapshot, metrics, board_area), board_area);

        if let Some(message) = notice {
            let width = u16::try_from(message.len())
                .unwrap_or(u16::MAX)
                .saturating_add(6);
            let popup = centered(board_area, width, 5);
            frame.render_widget(Clear, popup);
            frame.render_widget(self.render_notice(message), popup);
        }

        frame.render_widget(self.render_controls(), chunks[1]);
    }

    /// Draws only the cells that fit inside `area`; a board larger than the
    /// terminal is cut at the right and bottom edges.
    fn render_board(
        &self,
        snapshot: &Snapshot,
        metrics: &GameMetrics,
        area: Rect,
    ) -> Paragraph<'static> {
        let bounds = snapshot.bounds;
        let body: HashSet<Position> = snapshot.snake.segments().copied().collect();
        let head = snapshot.snake.head();

        let columns = bounds
            .columns()
            .min(i32::from(area.width.saturating_sub(2) / CELL_WIDTH));
        let rows = bounds
            .rows()
            .min(i32::from(area.height.saturating_sub(2)) - bounds.header_rows());

        let mut lines = Vec::with_capacity(area.height as usize);

        // Header band
        for row in 0..bounds.header_rows().min(i32::from(area.height)) {
            if row == 0 {
                lines.push(self.render_stats(snapshot, metrics));
            } else {
                lines.push(Line::from(Span::styled(
                    "─".repeat(columns.max(0) as usize * CELL_WIDTH as usize),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }

        for row in 0..rows {
            let spans: Vec<Span> = (0..columns)
                .map(|col| {
                    let pos = bounds.cell(col, row);

                    if pos == head {
                        Span::styled(
                            head_glyph(snapshot.snake.direction),
                            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                        )
                    } else if body.contains(&pos) {
                        Span::styled("□ ", Style::default().fg(Color::Green))
                    } else if snapshot.obstacles.contains(&pos) {
                        Span::styled("▓▓", Style::default().fg(OBSTACLE_COLOR))
                    } else if pos == snapshot.food {
                        Span::styled(
                            "O ",
                            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                        )
                    } else {
                        Span::styled(". ", Style::default().fg(Color::DarkGray))
                    }
                })
                .collect();

            lines.push(Line::from(spans));
        }

        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(Color::White))
                .title(" Snake "),
        )
    }

    fn render_stats(&self, snapshot: &Snapshot, metrics: &GameMetrics) -> Line<'static> {
        let label = Style::default().fg(Color::Yellow);
        let value = Style::default().fg(Color::White);

        Line::from(vec![
            Span::styled("Score: ", label),
            Span::styled(
                snapshot.score.to_string(),
                value.add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled("Level: ", label),
            Span::styled(snapshot.level.to_string(), value),
            Span::raw("  "),
            Span::styled("Speed: ", label),
            Span::styled(format!("{}ms", snapshot.speed_ms), value),
            Span::raw("  "),
            Span::styled("Best: ", label),
            Span::styled(metrics.high_score.to_string(), value),
            Span::raw("  "),
            Span::styled("Time: ", label),
            Span::styled(metrics.format_time(), value),
        ])
    }

    fn render_notice(&self, message: &str) -> Paragraph<'static> {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                message.to_string(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
        ];

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
    }

    fn render_controls(&self) -> Paragraph<'static> {
        let text = vec![Line::from(vec![
            Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
            Span::raw(", "),
            Span::styled("WASD", Style::default().fg(Color::Cyan)),
            Span::raw(" or drag to move | "),
            Span::styled("R", Style::default().fg(Color::Green)),
            Span::raw(" restart | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" quit"),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn head_glyph(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "^ ",
        Direction::Down => "v ",
        Direction::Left => "< ",
        Direction::Right => "> ",
    }
}

fn clamp_u16(value: i32) -> u16 {
    u16::try_from(value.max(0)).unwrap_or(u16::MAX)
}

/// A `width` x `height` rectangle centered in `area`, clipped to it
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
