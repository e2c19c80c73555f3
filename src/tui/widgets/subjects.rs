use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{bar, difficulty_color};
use crate::presenter::truncate;
use crate::topics;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    draw_list(f, app, chunks[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(chunks[1]);

    draw_profile(f, app, side[0]);
    draw_topic_chain(f, app, side[1]);
}

fn draw_list(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .subjects
        .items
        .iter()
        .map(|subject| {
            let credits = subject
                .credits
                .map(|c| c.to_string())
                .unwrap_or_else(|| "?".to_string());
            let confidence = match subject.confidence {
                Some(level) => bar(level as usize, 5),
                None => "-----".to_string(),
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<30}", truncate(&subject.name, 28)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:>2} cr  ", credits),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    format!("{:<8}", subject.difficulty.as_str()),
                    Style::default().fg(difficulty_color(subject.difficulty)),
                ),
                Span::styled(confidence, Style::default().fg(Color::Green)),
            ]))
        })
        .collect();

    let title = if app.input_mode {
        format!(" New subject: {}█ ", app.input)
    } else {
        format!(" Subjects ({}) ", app.subjects.items.len())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Yellow));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.subjects.selected);
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_profile(f: &mut Frame, app: &App, area: Rect) {
    let profile = &app.profile;
    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };

    let row = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, Style::default().fg(Color::Gray)),
            Span::styled(value, Style::default().fg(Color::White)),
        ])
    };

    let text = vec![
        row("Name: ", or_dash(&profile.name)),
        row("College: ", or_dash(&profile.institution)),
        row("Branch: ", or_dash(&profile.branch)),
        row("Year: ", profile.year.to_string()),
        row(
            "Daily hours: ",
            format!(
                "{} ({})",
                profile.preferences.daily_study_hours,
                profile.preferences.preferred_time.as_str()
            ),
        ),
        row(
            "Behavior: ",
            format!(
                "{} missed, {}m delay",
                profile.behavior.missed_streak, profile.behavior.last_session_delay_minutes
            ),
        ),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Profile ")
        .title_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_topic_chain(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Topic chain ")
        .title_style(Style::default().fg(Color::Magenta));

    let Some(subject) = app.subjects.selected_item() else {
        f.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let items: Vec<ListItem> = topics::synthesize(subject)
        .iter()
        .enumerate()
        .map(|(i, topic)| {
            let arrow = if i == 0 { "  " } else { "└▶" };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{}{} ", " ".repeat(i * 2), arrow),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    truncate(&topic.name, 28),
                    Style::default().fg(difficulty_color(topic.difficulty_level)),
                ),
                Span::styled(
                    format!(" {:.0}%", topic.avg_quiz_score),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}
