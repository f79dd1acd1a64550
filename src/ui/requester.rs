use super::{format_time, render_banner, render_status_bar, truncate, Screen};
use crate::models::AccessRequestStatus;
use crate::views::RequesterView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table},
    Frame,
};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Objects,
    Reason,
}

pub struct RequesterApp {
    pub view: RequesterView,
    pub focus: Focus,
    cursor: ListState,
}

impl RequesterApp {
    pub fn new(view: RequesterView) -> Self {
        RequesterApp {
            view,
            focus: Focus::Objects,
            cursor: ListState::default(),
        }
    }

    fn move_cursor(&mut self, down: bool) {
        let len = self.view.objects().len();
        if len == 0 {
            return;
        }
        let i = match self.cursor.selected() {
            Some(i) if down => (i + 1) % len,
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        self.cursor.select(Some(i));
    }

    fn pick_under_cursor(&mut self) {
        let id = self
            .cursor
            .selected()
            .and_then(|i| self.view.objects().get(i))
            .map(|o| o.id);
        if let Some(id) = id {
            // disabled objects simply stay unselected
            self.view.select_object(id);
        }
    }
}

impl Screen for RequesterApp {
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.focus == Focus::Reason {
            match key.code {
                KeyCode::Esc | KeyCode::Tab => self.focus = Focus::Objects,
                KeyCode::Enter => {
                    self.view.submit();
                }
                KeyCode::Backspace => {
                    self.view.reason.pop();
                }
                KeyCode::Char(c) => self.view.reason.push(c),
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.focus = Focus::Reason,
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(false),
            KeyCode::Enter | KeyCode::Char(' ') => self.pick_under_cursor(),
            KeyCode::Char('s') => {
                self.view.submit();
            }
            KeyCode::Char('c') => self.view.clear_selection(),
            KeyCode::Char('x') => self.view.dismiss_banner(),
            _ => {}
        }
        false
    }

    fn on_tick(&mut self, now: Instant) {
        self.view.drain(now);
        self.view.tick(now);
        if self.cursor.selected().is_none() && !self.view.objects().is_empty() {
            self.cursor.select(Some(0));
        }
    }

    fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Banner
                Constraint::Min(0),    // Content
                Constraint::Length(3), // Status bar
            ])
            .split(f.size());

        render_banner(f, chunks[0], self.view.banner());

        let content = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(44), Constraint::Min(0)])
            .split(chunks[1]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0)])
            .split(content[1]);

        render_objects(f, content[0], &self.view, self.focus, &mut self.cursor);
        render_form(f, right[0], &self.view, self.focus);
        render_history(f, right[1], &self.view);

        render_status_bar(
            f,
            chunks[2],
            &[
                ("↑/↓", "nav"),
                ("Enter", "choose"),
                ("Tab", "reason"),
                ("s", "submit"),
                ("x", "dismiss"),
            ],
            self.view.is_loading(),
        );
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn render_objects(f: &mut Frame, area: Rect, view: &RequesterView, focus: Focus, state: &mut ListState) {
    let items: Vec<ListItem> = view
        .objects()
        .iter()
        .map(|obj| {
            let chosen = view.selected_object_id() == Some(obj.id);
            let mark = if chosen { "● " } else { "  " };
            if view.is_object_disabled(obj.id) {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{}{}", mark, truncate(&obj.label(), 22)),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(
                        " (request pending)",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
                    ),
                ]))
            } else {
                let style = if chosen {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(
                    format!("{}{}", mark, truncate(&obj.label(), 38)),
                    style,
                )))
            }
        })
        .collect();

    let border = if focus == Focus::Objects { Color::Yellow } else { Color::White };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(" Objects "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("→ ");

    f.render_stateful_widget(list, area, state);
}

fn render_form(f: &mut Frame, area: Rect, view: &RequesterView, focus: Focus) {
    let object = match view.selected_object() {
        Some(obj) => Span::styled(obj.label(), Style::default().fg(Color::Green)),
        None => Span::styled(
            "none selected",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ),
    };

    let mut reason = vec![
        Span::styled("  Reason: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(view.reason.as_str()),
    ];
    if focus == Focus::Reason {
        reason.push(Span::styled("▏", Style::default().fg(Color::Yellow)));
    }

    let submit = if view.is_submitting() {
        Span::styled("  Submitting…", Style::default().fg(Color::DarkGray))
    } else if view.can_submit() {
        Span::styled("  [s] Request access", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("  [s] Request access", Style::default().fg(Color::DarkGray))
    };

    let content = vec![
        Line::from(vec![
            Span::styled("  Object: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            object,
        ]),
        Line::from(reason),
        Line::from(""),
        Line::from(submit),
    ];

    let border = if focus == Focus::Reason { Color::Yellow } else { Color::White };
    let form = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" New Access Request "),
    );
    f.render_widget(form, area);
}

fn render_history(f: &mut Frame, area: Rect, view: &RequesterView) {
    let header_cells = ["Object", "Status", "Reason", "Requested", "Processed", "Rejection reason"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = view.my_requests().iter().map(|req| {
        let color = match req.status {
            AccessRequestStatus::Pending => Color::Yellow,
            AccessRequestStatus::Approved => Color::Green,
            AccessRequestStatus::Rejected => Color::Red,
        };
        let object = view
            .objects()
            .iter()
            .find(|o| o.id == req.object_id)
            .map(|o| o.label())
            .unwrap_or_else(|| req.object_label());

        Row::new(vec![
            Cell::from(truncate(&object, 20)),
            Cell::from(req.status.label()).style(Style::default().fg(color)),
            Cell::from(truncate(req.reason.as_deref().unwrap_or("—"), 20)),
            Cell::from(format_time(req.created_at)),
            Cell::from(format_time(req.processed_at)),
            Cell::from(req.rejection_reason.clone().unwrap_or_default())
                .style(Style::default().fg(Color::Red)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(9),
            Constraint::Length(20),
            Constraint::Length(17),
            Constraint::Length(17),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" My Requests "),
    );

    f.render_widget(table, area);
}
