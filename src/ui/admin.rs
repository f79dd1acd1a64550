use super::{centered_rect, format_time, render_banner, render_status_bar, truncate, Screen};
use crate::models::AccessRequestStatus;
use crate::views::{AdminView, RequestControls, StatusFilter};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Objects,
    Requests,
}

pub struct AdminApp {
    pub view: AdminView,
    pub focus: Focus,
    object_state: ListState,
    request_state: TableState,
}

impl AdminApp {
    pub fn new(view: AdminView) -> Self {
        AdminApp {
            view,
            focus: Focus::Objects,
            object_state: ListState::default(),
            request_state: TableState::default(),
        }
    }

    fn selected_request_id(&self) -> Option<i64> {
        let visible = self.view.visible_requests();
        self.request_state
            .selected()
            .and_then(|i| visible.get(i).map(|r| r.id))
    }

    fn move_object_cursor(&mut self, down: bool) {
        let len = self.view.objects().len();
        if len == 0 {
            return;
        }
        let current = self.view.selected_index().unwrap_or(0);
        let next = if down {
            (current + 1) % len
        } else if current == 0 {
            len - 1
        } else {
            current - 1
        };
        self.view.select_object_at(next);
        self.request_state.select(None);
    }

    fn move_request_cursor(&mut self, down: bool) {
        let len = self.view.visible_requests().len();
        if len == 0 {
            self.request_state.select(None);
            return;
        }
        let i = match self.request_state.selected() {
            Some(i) if down => (i + 1) % len,
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        self.request_state.select(Some(i));
    }

    fn set_filter(&mut self, filter: StatusFilter) {
        self.view.set_filter(filter);
        self.request_state.select(None);
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.view.cancel_reject(),
            KeyCode::Enter => {
                self.view.confirm_reject();
            }
            KeyCode::Backspace => {
                if let Some(reason) = self.view.reject_reason_mut() {
                    reason.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(reason) = self.view.reject_reason_mut() {
                    reason.push(c);
                }
            }
            _ => {}
        }
    }
}

impl Screen for AdminApp {
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.view.reject_modal().is_some() {
            self.handle_modal_key(key);
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Objects => Focus::Requests,
                    Focus::Requests => Focus::Objects,
                };
                if self.focus == Focus::Requests && self.request_state.selected().is_none() {
                    self.move_request_cursor(true);
                }
            }
            KeyCode::Down | KeyCode::Char('j') => match self.focus {
                Focus::Objects => self.move_object_cursor(true),
                Focus::Requests => self.move_request_cursor(true),
            },
            KeyCode::Up | KeyCode::Char('k') => match self.focus {
                Focus::Objects => self.move_object_cursor(false),
                Focus::Requests => self.move_request_cursor(false),
            },
            KeyCode::Char('f') => self.set_filter(self.view.filter.next()),
            KeyCode::Char('1') => self.set_filter(StatusFilter::All),
            KeyCode::Char('2') => self.set_filter(StatusFilter::Pending),
            KeyCode::Char('3') => self.set_filter(StatusFilter::Approved),
            KeyCode::Char('4') => self.set_filter(StatusFilter::Rejected),
            KeyCode::Char('a') => {
                if let Some(id) = self.selected_request_id() {
                    self.view.approve(id);
                }
            }
            KeyCode::Char('r') => {
                if let Some(id) = self.selected_request_id() {
                    self.view.open_reject(id);
                }
            }
            KeyCode::Char('R') => {
                if let Some(id) = self.view.selected_object().map(|o| o.id) {
                    self.view.select_object(id);
                }
            }
            KeyCode::Char('x') => self.view.dismiss_banner(),
            _ => {}
        }
        false
    }

    fn on_tick(&mut self, now: Instant) {
        self.view.drain(now);
        self.view.tick(now);

        // keep the cursor inside the (possibly shrunk) list
        let len = self.view.visible_requests().len();
        match self.request_state.selected() {
            Some(i) if i >= len => self.request_state.select(len.checked_sub(1)),
            _ => {}
        }
    }

    fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header with counters + filter
                Constraint::Length(1), // Banner
                Constraint::Min(0),    // Content
                Constraint::Length(3), // Status bar
            ])
            .split(f.size());

        render_header(f, chunks[0], &self.view);
        render_banner(f, chunks[1], self.view.banner());

        let content = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(32), Constraint::Min(0)])
            .split(chunks[2]);

        self.object_state.select(self.view.selected_index());
        render_objects(f, content[0], &self.view, self.focus, &mut self.object_state);
        render_requests(f, content[1], &self.view, self.focus, &mut self.request_state);

        render_status_bar(
            f,
            chunks[3],
            &[
                ("Tab", "pane"),
                ("↑/↓", "nav"),
                ("f/1-4", "filter"),
                ("a", "approve"),
                ("r", "reject"),
                ("R", "reload"),
            ],
            self.view.is_loading(),
        );

        if self.view.reject_modal().is_some() {
            render_reject_modal(f, &self.view);
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn render_header(f: &mut Frame, area: Rect, view: &AdminView) {
    let counts = view.counts();

    let mut spans = vec![
        Span::styled(
            " Access Requests",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(format!("Total: {}", counts.total), Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(format!("Pending: {}", counts.pending), Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(format!("Approved: {}", counts.approved), Style::default().fg(Color::Green)),
        Span::raw("  "),
        Span::styled(format!("Rejected: {}", counts.rejected), Style::default().fg(Color::Red)),
        Span::raw("  |  "),
    ];

    for (i, filter) in StatusFilter::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *filter == view.filter {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(filter.title(), style));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(header, area);
}

fn pane_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_objects(f: &mut Frame, area: Rect, view: &AdminView, focus: Focus, state: &mut ListState) {
    let items: Vec<ListItem> = view
        .objects()
        .iter()
        .map(|obj| {
            let mut spans = vec![Span::raw(truncate(&obj.label(), 24))];
            if let Some(n) = view.pending_badge(obj.id) {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(
                    format!("[{}]", n),
                    Style::default().fg(Color::Black).bg(Color::Yellow),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(pane_border(focus == Focus::Objects))
                .title(" Objects "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(list, area, state);
}

fn status_color(status: AccessRequestStatus) -> Color {
    match status {
        AccessRequestStatus::Pending => Color::Yellow,
        AccessRequestStatus::Approved => Color::Green,
        AccessRequestStatus::Rejected => Color::Red,
    }
}

fn render_requests(f: &mut Frame, area: Rect, view: &AdminView, focus: Focus, state: &mut TableState) {
    let title = match view.selected_object() {
        Some(obj) => format!(" {} - {} ", obj.label(), view.filter.title()),
        None => " No object selected ".to_string(),
    };

    let header_cells = ["ID", "Requester", "Reason", "Created", "Status", "Actions / Decision"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let visible = view.visible_requests();
    if visible.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "  No requests",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(pane_border(focus == Focus::Requests))
                .title(title),
        );
        f.render_widget(empty, area);
        return;
    }

    let rows = visible.iter().map(|req| {
        let color = status_color(req.status);
        let actions = match view.controls_for(req) {
            RequestControls::Enabled => Cell::from("[a] Approve  [r] Reject")
                .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            RequestControls::Busy => {
                Cell::from("processing…").style(Style::default().fg(Color::DarkGray))
            }
            RequestControls::Hidden => {
                let decided = format!("{} {}", req.status.label(), format_time(req.processed_at));
                match &req.rejection_reason {
                    Some(reason) => Cell::from(format!("{}: {}", decided, truncate(reason, 30))),
                    None => Cell::from(decided),
                }
            }
        };

        Row::new(vec![
            Cell::from(format!("#{}", req.id)),
            Cell::from(truncate(&req.requester_label(), 20)),
            Cell::from(truncate(req.reason.as_deref().unwrap_or("—"), 28)),
            Cell::from(format_time(req.created_at)),
            Cell::from(req.status.as_str()).style(Style::default().fg(color)),
            actions,
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(21),
            Constraint::Length(29),
            Constraint::Length(17),
            Constraint::Length(9),
            Constraint::Min(24),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(pane_border(focus == Focus::Requests))
            .title(title),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, state);
}

fn render_reject_modal(f: &mut Frame, view: &AdminView) {
    let modal = match view.reject_modal() {
        Some(m) => m,
        None => return,
    };
    let area = centered_rect(60, 8, f.size());

    let submit_style = if view.can_submit_reject() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let busy = view.is_processing(modal.request_id);

    let content = vec![
        Line::from(Span::styled(
            format!("  Reject request #{}", modal.request_id),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Reason: ", Style::default().fg(Color::Cyan)),
            Span::raw(modal.reason.as_str()),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(if busy { "Rejecting…" } else { "[Enter] Reject" }, submit_style),
            Span::styled("   [Esc] Cancel", Style::default().fg(Color::DarkGray)),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Reject Access Request "),
        );

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}
