use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{dashboard, subjects, timeline};
use super::{App, Status, View};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_status(f, app, chunks[2]);
    draw_help_bar(f, app, chunks[3]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles = vec!["Dashboard", "Timeline", "Subjects"];
    let selected = match app.view {
        View::Dashboard => 0,
        View::Timeline => 1,
        View::Subjects => 2,
    };

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(" Studyplan "))
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Dashboard => dashboard::draw(f, app, area),
        View::Timeline => timeline::draw(f, app, area),
        View::Subjects => subjects::draw(f, app, area),
    }
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();
    if app.computing {
        spans.push(Span::styled(
            "⟳ computing ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }

    match &app.status {
        Some(Status::Info(msg)) => {
            spans.push(Span::styled(msg.as_str(), Style::default().fg(Color::Gray)))
        }
        Some(Status::Alert(msg)) => spans.push(Span::styled(
            msg.as_str(),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )),
        Some(Status::Error(msg)) => {
            spans.push(Span::styled(msg.as_str(), Style::default().fg(Color::Red)))
        }
        None => {}
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.input_mode {
        vec![
            Span::styled("a", Style::default().fg(Color::Yellow)),
            Span::raw(" "),
            Span::raw(&app.input),
            Span::styled("█", Style::default().fg(Color::Yellow)),
            Span::raw(" | "),
            Span::styled("<CR>", Style::default().fg(Color::Cyan)),
            Span::raw(" Add  "),
            Span::styled("<Esc>", Style::default().fg(Color::Cyan)),
            Span::raw(" Cancel"),
        ]
    } else {
        let mut spans = vec![
            Span::styled("h/l", Style::default().fg(Color::Cyan)),
            Span::raw(" Views  "),
            Span::styled("r", Style::default().fg(Color::Cyan)),
            Span::raw(" Generate  "),
        ];

        match app.view {
            View::Dashboard => {
                spans.extend(vec![
                    Span::styled("1/2/3", Style::default().fg(Color::Cyan)),
                    Span::raw(" Missed/Aced/Distracted  "),
                ]);
            }
            View::Timeline => {
                spans.extend(vec![
                    Span::styled("j/k", Style::default().fg(Color::Cyan)),
                    Span::raw(" Nav  "),
                    Span::styled("1/2/3", Style::default().fg(Color::Cyan)),
                    Span::raw(" Missed/Aced/Distracted  "),
                ]);
            }
            View::Subjects => {
                spans.extend(vec![
                    Span::styled("j/k", Style::default().fg(Color::Cyan)),
                    Span::raw(" Nav  "),
                    Span::styled("a", Style::default().fg(Color::Cyan)),
                    Span::raw(" Add  "),
                    Span::styled("x", Style::default().fg(Color::Cyan)),
                    Span::raw(" Remove  "),
                    Span::styled("d", Style::default().fg(Color::Cyan)),
                    Span::raw(" Difficulty  "),
                    Span::styled("+/-", Style::default().fg(Color::Cyan)),
                    Span::raw(" Confidence  "),
                ]);
            }
        }

        spans.extend(vec![
            Span::styled("q", Style::default().fg(Color::Cyan)),
            Span::raw(" Quit"),
        ]);

        spans
    };

    let help = Paragraph::new(Line::from(help_text)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}
