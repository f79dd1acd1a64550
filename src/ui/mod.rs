// 🖥️ Terminal UI - Shared loop and widgets for both views

pub mod admin;
pub mod requester;

pub use admin::AdminApp;
pub use requester::RequesterApp;

use crate::banner::{Banner, BannerKind};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

/// How often timers (banner expiry, delayed refresh) are checked
const TICK: Duration = Duration::from_millis(200);

/// A full-screen view driven by `run`
pub trait Screen {
    /// Returns true when the user asked to quit
    fn handle_key(&mut self, key: KeyEvent) -> bool;

    /// Apply finished API calls and fire timers
    fn on_tick(&mut self, now: Instant);

    fn draw(&mut self, f: &mut Frame);
}

/// Take over the terminal until the screen quits.
/// Must run inside a tokio runtime context: key handlers spawn API calls.
pub fn run<S: Screen>(screen: &mut S) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_loop(&mut terminal, screen);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_loop<B: ratatui::backend::Backend, S: Screen>(
    terminal: &mut Terminal<B>,
    screen: &mut S,
) -> Result<()> {
    loop {
        screen.on_tick(Instant::now());
        terminal.draw(|f| screen.draw(f))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && screen.handle_key(key) {
                    return Ok(());
                }
            }
        }
    }
}

// ============================================================================
// SHARED WIDGETS
// ============================================================================

fn key_hint(key: &'static str, label: &'static str) -> Vec<Span<'static>> {
    vec![
        Span::styled(key, Style::default().fg(Color::Yellow)),
        Span::raw(format!(" {} | ", label)),
    ]
}

/// Bottom bar listing the active keys
fn render_status_bar(f: &mut Frame, area: Rect, hints: &[(&'static str, &'static str)], loading: bool) {
    let mut spans = Vec::new();
    if loading {
        spans.push(Span::styled(" Loading… ", Style::default().fg(Color::Cyan)));
        spans.push(Span::raw("| "));
    } else {
        spans.push(Span::raw(" "));
    }
    for &(key, label) in hints {
        spans.extend(key_hint(key, label));
    }
    spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" quit"));

    let bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(bar, area);
}

fn render_banner(f: &mut Frame, area: Rect, banner: Option<&Banner>) {
    let line = match banner {
        Some(b) => {
            let (color, icon) = match b.kind {
                BannerKind::Success => (Color::Green, "✓"),
                BannerKind::Error => (Color::Red, "✗"),
            };
            let mut spans = vec![Span::styled(
                format!(" {} {}", icon, b.text),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )];
            if b.kind == BannerKind::Error {
                spans.push(Span::styled(
                    "  (x to dismiss)",
                    Style::default().fg(Color::DarkGray),
                ));
            }
            Line::from(spans)
        }
        None => Line::from(""),
    };
    f.render_widget(Paragraph::new(line), area);
}

/// Rectangle of `percent_x` × `height` centered in `area`
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn format_time(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "—".to_string())
}

#[cfg(test)]
pub(crate) fn buffer_text(buf: &ratatui::buffer::Buffer) -> String {
    let mut text = String::new();
    for y in 0..buf.area.height {
        for x in 0..buf.area.width {
            text.push_str(buf.get(x, y).symbol());
        }
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Объект строительства", 7), "Объект…");
    }

    #[test]
    fn test_centered_rect_fits() {
        let area = Rect::new(0, 0, 100, 40);
        let r = centered_rect(60, 7, area);
        assert_eq!(r.height, 7);
        assert_eq!(r.width, 60);
        assert!(r.x >= 19 && r.x <= 21);
    }
}
