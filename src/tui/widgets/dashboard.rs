use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::{bar, session_color};
use crate::models::{Analytics, DailyMission, Plan};
use crate::presenter::truncate;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(plan) = &app.plan else {
        draw_empty(f, app, area);
        return;
    };

    let alert = app.profile.behavior.missed_streak > 0;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if alert { 3 } else { 0 }), // Procrastination alert
            Constraint::Min(10),                            // Mission + analytics
            Constraint::Length(7),                          // Insights
        ])
        .split(area);

    if alert {
        draw_alert(f, app, chunks[0]);
    }

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    draw_mission(f, plan.daily_mission.as_ref(), top_chunks[0]);
    draw_analytics(f, plan, top_chunks[1]);
    draw_insights(f, plan, chunks[2]);
}

fn draw_empty(f: &mut Frame, app: &App, area: Rect) {
    let text = if app.computing {
        "Computing study plan..."
    } else {
        "No plan yet. Press r to generate one."
    };
    let block = Block::default().borders(Borders::ALL).title(" Dashboard ");
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .block(block);
    f.render_widget(paragraph, area);
}

fn draw_alert(f: &mut Frame, app: &App, area: Rect) {
    let behavior = &app.profile.behavior;
    let text = Line::from(vec![
        Span::styled(
            "Procrastination risk: ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "{} missed session(s) in a row, last delay {}m. Plan rebalanced.",
            behavior.missed_streak, behavior.last_session_delay_minutes
        )),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_mission(f: &mut Frame, mission: Option<&DailyMission>, area: Rect) {
    let Some(mission) = mission else {
        let block = Block::default().borders(Borders::ALL).title(" Daily Mission ");
        f.render_widget(Paragraph::new("No mission in this plan").block(block), area);
        return;
    };

    let mut items: Vec<ListItem> = vec![
        ListItem::new(Line::from(Span::styled(
            format!("Tip: {}", mission.energy_tip),
            Style::default().fg(Color::Cyan),
        ))),
        ListItem::new(Line::from("")),
    ];

    items.extend(mission.sessions.iter().enumerate().map(|(i, session)| {
        ListItem::new(Line::from(vec![
            Span::styled(format!("{:02} ", i + 1), Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{:<32}", truncate(&session.topic_name, 30)),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{:<18}", truncate(&session.session_type, 16)),
                Style::default().fg(session_color(&session.session_type)),
            ),
            Span::styled(
                session
                    .duration_minutes
                    .map(|m| format!("{}m", m))
                    .unwrap_or_default(),
                Style::default().fg(Color::Gray),
            ),
        ]))
    }));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Daily Mission: {} ", mission.focus_theme))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(List::new(items).block(block), area);
}

fn draw_analytics(f: &mut Frame, plan: &Plan, area: Rect) {
    let mut text: Vec<Line> = Vec::new();

    if let Some(analytics) = &plan.analytics {
        text.extend(analytics_lines(analytics));
    }

    let load = plan.load_by_subject();
    if let Some(max) = load.iter().map(|(_, m)| *m).max().filter(|m| *m > 0) {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            "Study load",
            Style::default().fg(Color::Gray),
        )));
        for (subject, minutes) in &load {
            let filled = (*minutes as usize * 10) / max as usize;
            text.push(Line::from(vec![
                Span::styled(
                    format!("{:<18}", truncate(subject, 16)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(bar(filled, 10), Style::default().fg(Color::Magenta)),
                Span::raw(format!(" {:.1}h", *minutes as f64 / 60.0)),
            ]));
        }
    }

    if text.is_empty() {
        text.push(Line::from(Span::styled(
            "No analytics in this plan",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Analytics ")
        .title_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn analytics_lines(analytics: &Analytics) -> Vec<Line<'static>> {
    let confidence = (analytics.predicted_confidence * 100.0).clamp(0.0, 100.0);
    let mut lines = vec![Line::from(vec![
        Span::styled("Predicted confidence: ", Style::default().fg(Color::Gray)),
        Span::styled(
            bar((confidence / 10.0).round() as usize, 10),
            Style::default().fg(Color::Green),
        ),
        Span::styled(
            format!(" {:.0}%", confidence),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
    ])];

    if let Some(score) = analytics.consistency_score {
        lines.push(Line::from(vec![
            Span::styled("Consistency: ", Style::default().fg(Color::Gray)),
            Span::styled(score.to_string(), Style::default().fg(Color::White)),
        ]));
    }
    if let Some(hour) = &analytics.top_productive_hour {
        lines.push(Line::from(vec![
            Span::styled("Peak hour: ", Style::default().fg(Color::Gray)),
            Span::styled(hour.clone(), Style::default().fg(Color::Cyan)),
        ]));
    }
    if !analytics.risk_subjects.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("At risk: ", Style::default().fg(Color::Gray)),
            Span::styled(
                analytics.risk_subjects.join(", "),
                Style::default().fg(Color::Red),
            ),
        ]));
    }
    lines
}

fn draw_insights(f: &mut Frame, plan: &Plan, area: Rect) {
    let lines: Vec<Line> = match &plan.insights {
        Some(insights) if !insights.is_empty() => insights
            .iter()
            .map(|i| Line::from(format!("• {}", i)))
            .collect(),
        _ => vec![Line::from(Span::styled(
            "No insights",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Insights ")
        .title_style(Style::default().fg(Color::Magenta));
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}
