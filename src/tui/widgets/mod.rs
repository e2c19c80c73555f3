pub mod dashboard;
pub mod subjects;
pub mod timeline;

use ratatui::style::Color;

use crate::models::Difficulty;

pub fn difficulty_color(difficulty: Difficulty) -> Color {
    match difficulty {
        Difficulty::Easy => Color::Green,
        Difficulty::Medium => Color::Yellow,
        Difficulty::Hard => Color::Red,
    }
}

/// Border colour for a session, keyed off the scheduler's session labels
pub fn session_color(session_type: &str) -> Color {
    if session_type.contains("Emergency") || session_type.contains("Alert") {
        Color::Red
    } else if session_type.contains("Foundation") {
        Color::Yellow
    } else if session_type.contains("Practice") {
        Color::Green
    } else if session_type == "Deep Work" {
        Color::Magenta
    } else {
        Color::Gray
    }
}

/// Fixed-width bar, e.g. `███░░` for 3 of 5
pub fn bar(filled: usize, width: usize) -> String {
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}
