use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use super::app::{App, Page};
use crate::api::TaskFilter;
use crate::pages::dashboard::DisplayItem;
use crate::pages::sessions::short_token;

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Page
            Constraint::Length(3), // Message
            Constraint::Length(3), // Help
        ].as_ref())
        .split(f.area());

    let title = match &app.ctx {
        Some(ctx) => format!("Taskhub - {} ({})", app.route.title(), ctx.display_name()),
        None => format!("Taskhub - {}", app.route.title()),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    match &app.page {
        Page::Home => {
            let text = vec![
                Line::from(Span::styled("Taskhub", Style::default().add_modifier(Modifier::BOLD))),
                Line::from(""),
                Line::from("Organize your tasks efficiently and securely."),
                Line::from(""),
                Line::from("l: Login   s: Sign up"),
            ];
            f.render_widget(Paragraph::new(text).block(block), chunks[0]);
        }
        Page::Dashboard(p) => {
            let show_owner = p.is_admin;
            let rows: Vec<Row> = p
                .display_items()
                .into_iter()
                .map(|item| match item {
                    DisplayItem::OwnerHeader(owner, count) => Row::new(vec![
                        Cell::from(""),
                        Cell::from(format!("User {} ({})", owner, count)),
                    ])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                    DisplayItem::Task(t) => {
                        let style = if t.completed {
                            Style::default().fg(Color::DarkGray)
                        } else {
                            Style::default().fg(Color::Yellow)
                        };
                        let mut cells = vec![
                            Cell::from(if t.completed { "[x]" } else { "[ ]" }),
                            Cell::from(t.title.clone()),
                            Cell::from(day(t.due_date)),
                            Cell::from(day(t.created_at)),
                            Cell::from(day(t.updated_at)),
                        ];
                        if show_owner {
                            cells.push(Cell::from(t.user_id.to_string()));
                        }
                        Row::new(cells).style(style)
                    }
                })
                .collect();

            let mut widths = vec![
                Constraint::Length(4),
                Constraint::Min(20),
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Length(12),
            ];
            let mut header = vec!["", "Title", "Due", "Created", "Updated"];
            if show_owner {
                widths.push(Constraint::Length(6));
                header.push("Owner");
            }

            let table = Table::new(rows, widths)
                .header(Row::new(header)
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(block.title_bottom(format!(" Filter: {} ", p.filter.label())))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.state);
        }
        Page::Sessions(p) => {
            let show_owner = p.show_owner;
            let now = Utc::now();
            let rows: Vec<Row> = p
                .sessions
                .iter()
                .map(|s| {
                    let style = if s.expires_at < now {
                        Style::default().fg(Color::DarkGray)
                    } else {
                        Style::default().fg(Color::Green)
                    };
                    let mut cells = vec![
                        Cell::from(short_token(&s.token)),
                        Cell::from(s.expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()),
                    ];
                    if show_owner {
                        cells.push(Cell::from(s.user_id.to_string()));
                    }
                    Row::new(cells).style(style)
                })
                .collect();

            let mut widths = vec![Constraint::Min(20), Constraint::Length(18)];
            let mut header = vec!["Token", "Expires"];
            if show_owner {
                widths.push(Constraint::Length(6));
                header.push("User");
            }

            let table = Table::new(rows, widths)
                .header(Row::new(header)
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(block)
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.state);
        }
        Page::UsersList(p) => {
            let rows: Vec<Row> = p
                .users
                .iter()
                .map(|u| {
                    let style = if u.is_admin {
                        Style::default().fg(Color::Magenta)
                    } else {
                        Style::default()
                    };
                    let name = if u.id.to_string() == p.current_user_id {
                        format!("{} (you)", u.name)
                    } else {
                        u.name.clone()
                    };
                    Row::new(vec![
                        Cell::from(u.id.to_string()),
                        Cell::from(name),
                        Cell::from(u.email.clone()),
                        Cell::from(day(u.created_at)),
                        Cell::from(if u.is_admin { "Administrator" } else { "User" }),
                    ]).style(style)
                })
                .collect();

            let widths = [
                Constraint::Length(6),
                Constraint::Min(16),
                Constraint::Min(20),
                Constraint::Length(12),
                Constraint::Length(14),
            ];

            let table = Table::new(rows, widths)
                .header(Row::new(vec!["ID", "Name", "Email", "Joined", "Role"])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(block)
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.state);
        }
        _ => {
            let mut lines: Vec<Line> = app
                .form_fields()
                .into_iter()
                .enumerate()
                .map(|(i, field)| {
                    let focused = i == app.focus;
                    let marker = if focused { "> " } else { "  " };
                    let style = if focused {
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    Line::from(vec![
                        Span::styled(format!("{}{:<18}", marker, field.label), style),
                        Span::raw(field.value),
                    ])
                })
                .collect();
            lines.push(Line::from(""));
            let submit_style = if app.can_submit() {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            lines.push(Line::from(Span::styled("[ Enter: Submit ]", submit_style)));
            if app.due_invalid {
                lines.push(Line::from(Span::styled(
                    "Due date must be YYYY-MM-DD",
                    Style::default().fg(Color::Red),
                )));
            }
            f.render_widget(Paragraph::new(lines).block(block), chunks[0]);
        }
    }

    let message = Paragraph::new(app.message().unwrap_or(""))
        .style(Style::default().fg(Color::Yellow))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(message, chunks[1]);

    let help_text = help_text(app);
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);

    if app.confirm_pending() {
        let area = centered_rect(60, 5, f.area());
        f.render_widget(Clear, area);
        let question = match &app.page {
            Page::Profile(p) if p.is_self() => "Delete your profile? This cannot be undone.",
            Page::Profile(_) => "Delete this user? This cannot be undone.",
            _ => "Delete this task? This cannot be undone.",
        };
        let popup = Paragraph::new(vec![Line::from(question), Line::from(""), Line::from("y: Delete | n: Cancel")])
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title("Confirm deletion"));
        f.render_widget(popup, area);
    }
}

fn help_text(app: &App) -> String {
    let menu = if app.is_admin() {
        "p: Profile | s: Sessions | u: Users | L: Logout | q: Quit"
    } else {
        "p: Profile | s: Sessions | L: Logout | q: Quit"
    };
    match &app.page {
        Page::Home => "l: Login | s: Sign up | q: Quit".to_string(),
        Page::Dashboard(p) => {
            let filters: Vec<&str> = p.available_filters().into_iter().map(TaskFilter::label).collect();
            format!(
                "a: Add | Enter: Open | Space: Done | f: Filter ({}) | r: Reload | {}",
                filters.join("/"),
                menu
            )
        }
        Page::Sessions(_) => format!("r: Reload | Esc: Back | {}", menu),
        Page::UsersList(_) => format!("P: Promote | Enter: Edit | Esc: Back | {}", menu),
        Page::TaskView(_) | Page::Profile(_) => {
            "Tab: Next field | Enter: Save | Ctrl-D: Delete | Esc: Back".to_string()
        }
        _ => "Tab: Next field | Enter: Submit | Esc: Back".to_string(),
    }
}

fn day(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into())
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(r.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Length(r.height.saturating_sub(height) / 2),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
