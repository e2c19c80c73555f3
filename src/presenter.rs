use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::adaptation::Notification;
use crate::models::{JsonOutput, Plan, StudySession};

/// Where request lifecycle and adaptation signals go
pub trait Presenter: Send + Sync {
    fn show_computing(&self);
    fn clear_computing(&self);
    fn render(&self, plan: &Plan);
    fn failure(&self, message: &str);
    fn notify(&self, notification: &Notification);
}

pub struct ConsolePresenter {
    json: bool,
}

impl ConsolePresenter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn print_json<T: serde::Serialize>(&self, output: &JsonOutput<T>) {
        match serde_json::to_string(output) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("Error: failed to encode output: {}", e),
        }
    }
}

impl Presenter for ConsolePresenter {
    fn show_computing(&self) {
        if !self.json {
            eprintln!("Computing study plan...");
        }
    }

    fn clear_computing(&self) {}

    fn render(&self, plan: &Plan) {
        if self.json {
            self.print_json(&JsonOutput::ok(plan));
        } else {
            print!("{}", render_plan_text(plan));
        }
    }

    fn failure(&self, message: &str) {
        if self.json {
            self.print_json(&JsonOutput::<()>::err(message));
        } else {
            eprintln!("Error generating schedule: {}", message);
        }
    }

    fn notify(&self, notification: &Notification) {
        if self.json {
            self.print_json(&JsonOutput::ok(notification));
        } else {
            println!("[{}] {}", notification.title, notification.message);
        }
    }
}

/// Text rendering of whichever plan sections are present
pub fn render_plan_text(plan: &Plan) -> String {
    let mut out = String::new();

    if let Some(mission) = &plan.daily_mission {
        out.push_str(&format!("=== Daily Mission: {} ===\n", mission.focus_theme));
        if !mission.energy_tip.is_empty() {
            out.push_str(&format!("Tip: {}\n", mission.energy_tip));
        }
        for (i, session) in mission.sessions.iter().enumerate() {
            out.push_str(&format!(
                "{:02}. {:<40} {:<20} {}\n",
                i + 1,
                truncate(&session.topic_name, 38),
                truncate(&session.session_type, 18),
                minutes_label(session)
            ));
        }
        out.push('\n');
    }

    for (title, sessions) in [
        ("Upcoming Schedule", plan.upcoming_schedule.as_deref()),
        ("Schedule", plan.schedule.as_deref()),
    ] {
        let Some(sessions) = sessions else { continue };
        out.push_str(&format!("=== {} ===\n", title));
        if sessions.is_empty() {
            out.push_str("No sessions planned.\n");
        }
        let mut current_day: Option<&str> = None;
        for session in sessions {
            let day = session.day();
            if day != current_day {
                if let Some(d) = day {
                    out.push_str(&format!("{}\n", format_day(d)));
                }
                current_day = day;
            }
            out.push_str(&format!(
                "  {:<9} {:<30} {:<22} {:<18} {}\n",
                session.start_time.as_deref().map(format_time).unwrap_or_default(),
                truncate(&session.topic_name, 28),
                truncate(session.subject_name.as_deref().unwrap_or("-"), 20),
                truncate(&session.session_type, 16),
                minutes_label(session)
            ));
            if let Some(reason) = &session.reason {
                out.push_str(&format!("            why: {}\n", reason));
            }
        }
        out.push('\n');
    }

    if let Some(insights) = &plan.insights {
        out.push_str("=== Insights ===\n");
        for insight in insights {
            out.push_str(&format!("- {}\n", insight));
        }
        out.push('\n');
    }

    if let Some(analytics) = &plan.analytics {
        out.push_str("=== Analytics ===\n");
        out.push_str(&format!(
            "Predicted confidence: {:.0}%\n",
            analytics.predicted_confidence * 100.0
        ));
        if let Some(score) = analytics.consistency_score {
            out.push_str(&format!("Consistency score: {}\n", score));
        }
        if let Some(hour) = &analytics.top_productive_hour {
            out.push_str(&format!("Top productive hour: {}\n", hour));
        }
        if !analytics.risk_subjects.is_empty() {
            out.push_str(&format!("At risk: {}\n", analytics.risk_subjects.join(", ")));
        }
        let load = plan.load_by_subject();
        if !load.is_empty() {
            out.push_str("Study load:\n");
            for (subject, minutes) in load {
                out.push_str(&format!("  {:<30} {:.1}h\n", subject, minutes as f64 / 60.0));
            }
        }
    }

    out
}

fn minutes_label(session: &StudySession) -> String {
    session
        .duration_minutes
        .map(|m| format!("{}m", m))
        .unwrap_or_default()
}

pub fn format_day(day: &str) -> String {
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(date) => date.format("%a, %b %d").to_string(),
        Err(_) => day.to_string(),
    }
}

pub fn format_time(start: &str) -> String {
    if let Ok(dt) = NaiveDateTime::parse_from_str(start, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%-I:%M %p").to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(start) {
        return dt.format("%-I:%M %p").to_string();
    }
    start.chars().skip(11).take(5).collect()
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
pub mod recording {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Signal {
        Computing,
        Cleared,
        Rendered(Plan),
        Failed(String),
        Notified(Notification),
    }

    /// Presenter that keeps every signal it receives
    #[derive(Default)]
    pub struct RecordingPresenter {
        signals: Mutex<Vec<Signal>>,
    }

    impl RecordingPresenter {
        pub fn signals(&self) -> Vec<Signal> {
            self.signals.lock().unwrap().clone()
        }

        fn push(&self, signal: Signal) {
            self.signals.lock().unwrap().push(signal);
        }
    }

    impl Presenter for RecordingPresenter {
        fn show_computing(&self) {
            self.push(Signal::Computing);
        }

        fn clear_computing(&self) {
            self.push(Signal::Cleared);
        }

        fn render(&self, plan: &Plan) {
            self.push(Signal::Rendered(plan.clone()));
        }

        fn failure(&self, message: &str) {
            self.push(Signal::Failed(message.to_string()));
        }

        fn notify(&self, notification: &Notification) {
            self.push(Signal::Notified(notification.clone()));
        }
    }
}
