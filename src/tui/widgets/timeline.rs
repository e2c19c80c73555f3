use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::session_color;
use crate::models::StudySession;
use crate::presenter::{format_day, format_time, truncate};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Session list
            Constraint::Length(6), // Selected session detail
        ])
        .split(area);

    draw_sessions(f, app, chunks[0]);
    draw_detail(f, app.timeline.selected_item(), chunks[1]);
}

fn draw_sessions(f: &mut Frame, app: &App, area: Rect) {
    let mut items: Vec<ListItem> = Vec::new();
    let mut selected_row = None;
    let mut current_day: Option<&str> = None;

    for (i, session) in app.timeline.items.iter().enumerate() {
        let day = session.day();
        if day != current_day {
            if let Some(d) = day {
                // Day header
                items.push(ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("── {} ", format_day(d)),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled("─".repeat(40), Style::default().fg(Color::DarkGray)),
                ])));
            }
            current_day = day;
        }

        if app.timeline.selected == Some(i) {
            selected_row = Some(items.len());
        }

        let color = session_color(&session.session_type);
        items.push(ListItem::new(Line::from(vec![
            Span::styled("▌", Style::default().fg(color)),
            Span::styled(
                format!(
                    " {:<9}",
                    session.start_time.as_deref().map(format_time).unwrap_or_default()
                ),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                format!("{:<32}", truncate(&session.topic_name, 30)),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!(
                    "{:<22}",
                    truncate(session.subject_name.as_deref().unwrap_or("-"), 20)
                ),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(
                truncate(&session.session_type, 20),
                Style::default().fg(color),
            ),
        ])));
    }

    if items.is_empty() {
        items.push(ListItem::new(Line::from(Span::styled(
            "No sessions scheduled yet",
            Style::default().fg(Color::DarkGray),
        ))));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Timeline ({}) ", app.timeline.items.len()))
        .title_style(Style::default().fg(Color::Cyan));

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(selected_row);
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_detail(f: &mut Frame, session: Option<&StudySession>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Why this session ")
        .title_style(Style::default().fg(Color::Magenta));

    let Some(session) = session else {
        f.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let mut text = vec![Line::from(vec![
        Span::styled("Reason: ", Style::default().fg(Color::Gray)),
        Span::styled(
            session.reason.clone().unwrap_or_else(|| "-".to_string()),
            Style::default().fg(Color::White),
        ),
    ])];

    let mut meta: Vec<Span> = Vec::new();
    if let Some(minutes) = session.duration_minutes {
        meta.push(Span::styled("Duration: ", Style::default().fg(Color::Gray)));
        meta.push(Span::raw(format!("{}m  ", minutes)));
    }
    if let Some(score) = session.priority_score {
        meta.push(Span::styled("Priority: ", Style::default().fg(Color::Gray)));
        meta.push(Span::raw(format!("{:.2}  ", score)));
    }
    if let Some(status) = &session.status {
        meta.push(Span::styled("Status: ", Style::default().fg(Color::Gray)));
        meta.push(Span::raw(status.clone()));
    }
    if !meta.is_empty() {
        text.push(Line::from(meta));
    }

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}
