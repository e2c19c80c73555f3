use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// Difficulty rating shared by subjects and topics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "e" => Some(Difficulty::Easy),
            "medium" | "m" => Some(Difficulty::Medium),
            "hard" | "h" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Next rating in the Easy -> Medium -> Hard -> Easy cycle
    pub fn cycle(&self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreferredTime {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl PreferredTime {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferredTime::Morning => "Morning",
            PreferredTime::Afternoon => "Afternoon",
            PreferredTime::Evening => "Evening",
            PreferredTime::Night => "Night",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Some(PreferredTime::Morning),
            "afternoon" => Some(PreferredTime::Afternoon),
            "evening" => Some(PreferredTime::Evening),
            "night" => Some(PreferredTime::Night),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub daily_study_hours: f64,
    pub preferred_time: PreferredTime,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            daily_study_hours: 4.0,
            preferred_time: PreferredTime::Morning,
        }
    }
}

// Observed learner behavior, sent so the scheduler can bias the next plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Behavior {
    pub missed_streak: u32,
    pub last_session_delay_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(rename = "college")]
    pub institution: String,
    pub branch: String,
    pub year: i32,
    pub email: String,
    pub preferences: Preferences,
    pub behavior: Behavior,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: String::new(),
            institution: String::new(),
            branch: String::new(),
            year: 2026,
            email: String::new(),
            preferences: Preferences::default(),
            behavior: Behavior::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub credits: Option<u32>,
    pub difficulty: Difficulty,
    pub confidence: Option<u8>,
}

// A unit of study content. `subject_id` carries the owning subject's name,
// which is what the scheduler shows as the session's subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub subject_id: String,
    pub difficulty_level: Difficulty,
    pub avg_quiz_score: f64,
    pub revisions_completed: u32,
    pub failure_frequency: u32,
    pub prerequisites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub name: String,
    pub credits: Option<u32>,
    pub confidence_level: Option<u8>,
}

impl From<&Subject> for SubjectSummary {
    fn from(subject: &Subject) -> Self {
        Self {
            name: subject.name.clone(),
            credits: subject.credits,
            confidence_level: subject.confidence,
        }
    }
}

/// Body of `POST /api/generate-schedule`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub profile: Profile,
    pub subjects: Vec<SubjectSummary>,
    pub topics: Vec<Topic>,
}

// === Plan (owned by the scheduling service) ===

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(alias = "topic")]
    pub topic_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub session_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl StudySession {
    /// Calendar day of the session, taken from the ISO start time
    pub fn day(&self) -> Option<&str> {
        self.start_time
            .as_deref()
            .map(|t| t.split('T').next().unwrap_or(t))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyMission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub focus_theme: String,
    #[serde(default)]
    pub energy_tip: String,
    #[serde(default)]
    pub sessions: Vec<StudySession>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    #[serde(default)]
    pub predicted_confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_score: Option<i64>,
    #[serde(default)]
    pub risk_subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_productive_hour: Option<String>,
    #[serde(default)]
    pub dependency_graph: BTreeMap<String, Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Snapshot returned by the scheduling service. Call sites differ in which
/// sections they fill, so every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_mission: Option<DailyMission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upcoming_schedule: Option<Vec<StudySession>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<StudySession>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<Analytics>,
}

impl Plan {
    /// The session timeline, preferring `upcoming_schedule` over the older `schedule` field
    pub fn timeline(&self) -> &[StudySession] {
        self.upcoming_schedule
            .as_deref()
            .or(self.schedule.as_deref())
            .unwrap_or(&[])
    }

    /// Planned minutes per subject, in first-seen order
    pub fn load_by_subject(&self) -> Vec<(String, u32)> {
        let mut load: Vec<(String, u32)> = Vec::new();
        for session in self.timeline() {
            let subject = session.subject_name.as_deref().unwrap_or("Unassigned");
            let minutes = session.duration_minutes.unwrap_or(0);
            match load.iter_mut().find(|(name, _)| name == subject) {
                Some((_, total)) => *total += minutes,
                None => load.push((subject.to_string(), minutes)),
            }
        }
        load
    }
}

#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
