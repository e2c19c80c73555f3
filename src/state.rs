use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::error::PlannerError;
use crate::models::{Difficulty, Plan, PreferredTime, Profile, Subject};

/// Fewest subjects the interactive surfaces allow a learner to remove down to
pub const MIN_SUBJECTS: usize = 1;

/// Delay recorded when a distraction is reported
pub const DISTRACTION_PENALTY_MINUTES: u32 = 45;

const MAX_DAILY_HOURS: f64 = 24.0;
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

pub type SharedStore = Arc<Mutex<SessionStore>>;

pub fn shared(store: SessionStore) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// Lock the store. Mutators validate before writing, so a poisoned lock still
/// holds a consistent session.
pub fn lock(store: &SharedStore) -> MutexGuard<'_, SessionStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Institution,
    Branch,
    Year,
    Email,
    DailyStudyHours,
    PreferredTime,
}

impl ProfileField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Institution => "college",
            ProfileField::Branch => "branch",
            ProfileField::Year => "year",
            ProfileField::Email => "email",
            ProfileField::DailyStudyHours => "daily_study_hours",
            ProfileField::PreferredTime => "preferred_time",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "name" | "studentname" => Some(ProfileField::Name),
            "college" | "institution" => Some(ProfileField::Institution),
            "branch" | "major" => Some(ProfileField::Branch),
            "year" => Some(ProfileField::Year),
            "email" => Some(ProfileField::Email),
            "daily_study_hours" | "hours" | "dailyhours" => Some(ProfileField::DailyStudyHours),
            "preferred_time" | "time" => Some(ProfileField::PreferredTime),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectField {
    Name,
    Credits,
    Confidence,
    Difficulty,
}

/// Simulated learner behavior that feeds back into the next plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BehaviorEvent {
    MissedSession,
    AcedTopic,
    Distraction,
}

impl BehaviorEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorEvent::MissedSession => "missed",
            BehaviorEvent::AcedTopic => "aced",
            BehaviorEvent::Distraction => "distracted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "missed" | "missed_session" | "m" => Some(BehaviorEvent::MissedSession),
            "aced" | "aced_topic" | "a" => Some(BehaviorEvent::AcedTopic),
            "distracted" | "distraction" | "d" => Some(BehaviorEvent::Distraction),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct SessionStore {
    profile: Profile,
    subjects: Vec<Subject>,
    plan: Option<Plan>,
    requesting: bool,
    last_generated_id: i64,
}

impl SessionStore {
    pub fn new(profile: Profile, subjects: Vec<Subject>) -> Result<Self, PlannerError> {
        for (i, subject) in subjects.iter().enumerate() {
            if subject.name.trim().is_empty() {
                return Err(PlannerError::validation("subject name must not be blank"));
            }
            if subjects[..i].iter().any(|s| s.id == subject.id) {
                return Err(PlannerError::validation(format!(
                    "duplicate subject id '{}'",
                    subject.id
                )));
            }
        }

        Ok(Self {
            profile,
            subjects,
            plan: None,
            requesting: false,
            last_generated_id: 0,
        })
    }

    /// Session seeded with the demo subjects
    pub fn demo() -> Self {
        let seed = |id: &str, name: &str, credits: u32, difficulty: Difficulty| Subject {
            id: id.to_string(),
            name: name.to_string(),
            credits: Some(credits),
            difficulty,
            confidence: None,
        };

        Self {
            profile: Profile::default(),
            subjects: vec![
                seed("s1", "Data Structures", 4, Difficulty::Hard),
                seed("s2", "Operating Systems", 3, Difficulty::Medium),
                seed("s3", "Engineering Mathematics", 4, Difficulty::Hard),
            ],
            plan: None,
            requesting: false,
            last_generated_id: 0,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn has_plan(&self) -> bool {
        self.plan.is_some()
    }

    pub fn is_requesting(&self) -> bool {
        self.requesting
    }

    pub fn set_profile_field(&mut self, field: ProfileField, value: &str) -> Result<(), PlannerError> {
        debug!(field = field.as_str(), %value, "set_profile_field");
        let value = value.trim();

        match field {
            ProfileField::Name => self.profile.name = value.to_string(),
            ProfileField::Institution => self.profile.institution = value.to_string(),
            ProfileField::Branch => self.profile.branch = value.to_string(),
            ProfileField::Email => self.profile.email = value.to_string(),
            ProfileField::Year => {
                let year = value.parse::<i32>().map_err(|_| {
                    PlannerError::validation(format!("year must be a whole number, got '{}'", value))
                })?;
                if !YEAR_RANGE.contains(&year) {
                    return Err(PlannerError::validation(format!(
                        "year must be between {} and {}, got {}",
                        YEAR_RANGE.start(),
                        YEAR_RANGE.end(),
                        year
                    )));
                }
                self.profile.year = year;
            }
            ProfileField::DailyStudyHours => {
                let hours = value.parse::<f64>().map_err(|_| {
                    PlannerError::validation(format!(
                        "daily study hours must be a number, got '{}'",
                        value
                    ))
                })?;
                if !hours.is_finite() || hours <= 0.0 || hours > MAX_DAILY_HOURS {
                    return Err(PlannerError::validation(format!(
                        "daily study hours must be between 0 and {}, got {}",
                        MAX_DAILY_HOURS, hours
                    )));
                }
                self.profile.preferences.daily_study_hours = hours;
            }
            ProfileField::PreferredTime => {
                self.profile.preferences.preferred_time =
                    PreferredTime::from_str(value).ok_or_else(|| {
                        PlannerError::validation(format!(
                            "preferred time must be Morning, Afternoon, Evening or Night, got '{}'",
                            value
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Append a subject with a fresh time-based id. Blank names are rejected.
    pub fn add_subject(&mut self, name: &str) -> Result<&Subject, PlannerError> {
        let name = name.trim();
        if name.is_empty() {
            debug!("add_subject: blank name rejected");
            return Err(PlannerError::validation("subject name must not be blank"));
        }

        let id = self.next_subject_id();
        debug!(%id, %name, "add_subject");
        self.subjects.push(Subject {
            id,
            name: name.to_string(),
            credits: None,
            difficulty: Difficulty::Medium,
            confidence: None,
        });

        Ok(&self.subjects[self.subjects.len() - 1])
    }

    /// Edit one field of a subject. Returns false when no subject has `id`.
    pub fn update_subject(
        &mut self,
        id: &str,
        field: SubjectField,
        value: &str,
    ) -> Result<bool, PlannerError> {
        let Some(subject) = self.subjects.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };
        let value = value.trim();

        match field {
            SubjectField::Name => {
                if value.is_empty() {
                    return Err(PlannerError::validation("subject name must not be blank"));
                }
                subject.name = value.to_string();
            }
            SubjectField::Credits => {
                let credits = value
                    .parse::<u32>()
                    .ok()
                    .filter(|c| *c > 0)
                    .ok_or_else(|| {
                        PlannerError::validation(format!(
                            "credits must be a positive whole number, got '{}'",
                            value
                        ))
                    })?;
                subject.credits = Some(credits);
            }
            SubjectField::Confidence => {
                let confidence = value
                    .parse::<u8>()
                    .ok()
                    .filter(|c| (1..=5).contains(c))
                    .ok_or_else(|| {
                        PlannerError::validation(format!(
                            "confidence must be between 1 and 5, got '{}'",
                            value
                        ))
                    })?;
                subject.confidence = Some(confidence);
            }
            SubjectField::Difficulty => {
                subject.difficulty = Difficulty::from_str(value).ok_or_else(|| {
                    PlannerError::validation(format!(
                        "difficulty must be Easy, Medium or Hard, got '{}'",
                        value
                    ))
                })?;
            }
        }
        Ok(true)
    }

    /// Remove the subject with `id`. Returns false when nothing matched.
    pub fn remove_subject(&mut self, id: &str) -> bool {
        let before = self.subjects.len();
        self.subjects.retain(|s| s.id != id);
        let removed = self.subjects.len() != before;
        debug!(%id, removed, "remove_subject");
        removed
    }

    pub fn record_behavior_event(&mut self, event: BehaviorEvent) {
        let behavior = &mut self.profile.behavior;
        match event {
            BehaviorEvent::MissedSession => {
                behavior.missed_streak = behavior.missed_streak.saturating_add(1);
            }
            BehaviorEvent::Distraction => {
                behavior.last_session_delay_minutes = DISTRACTION_PENALTY_MINUTES;
            }
            // The scheduler reacts to the re-request itself; no signal changes here.
            BehaviorEvent::AcedTopic => {}
        }
        debug!(
            event = event.as_str(),
            missed_streak = behavior.missed_streak,
            delay = behavior.last_session_delay_minutes,
            "record_behavior_event"
        );
    }

    /// Replace the stored plan wholesale
    pub fn commit_plan(&mut self, plan: Plan) {
        self.plan = Some(plan);
    }

    pub(crate) fn try_begin_request(&mut self) -> Result<(), PlannerError> {
        if self.requesting {
            return Err(PlannerError::ConcurrentRequest);
        }
        self.requesting = true;
        Ok(())
    }

    pub(crate) fn finish_request(&mut self) {
        self.requesting = false;
    }

    fn next_subject_id(&mut self) -> String {
        let mut candidate = Utc::now().timestamp_millis().max(self.last_generated_id + 1);
        while self.subjects.iter().any(|s| s.id == candidate.to_string()) {
            candidate += 1;
        }
        self.last_generated_id = candidate;
        candidate.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod construction_tests {
        use super::*;

        #[test]
        fn demo_has_three_subjects() {
            let store = SessionStore::demo();
            let ids: Vec<&str> = store.subjects().iter().map(|s| s.id.as_str()).collect();
            assert_eq!(ids, vec!["s1", "s2", "s3"]);
            assert!(!store.has_plan());
            assert!(!store.is_requesting());
        }

        #[test]
        fn new_rejects_duplicate_ids() {
            let subject = SessionStore::demo().subjects()[0].clone();
            let result = SessionStore::new(Profile::default(), vec![subject.clone(), subject]);
            assert!(matches!(result, Err(PlannerError::Validation(_))));
        }

        #[test]
        fn new_accepts_empty_subject_list() {
            let store = SessionStore::new(Profile::default(), Vec::new()).unwrap();
            assert!(store.subjects().is_empty());
        }
    }

    mod profile_field_tests {
        use super::*;

        #[test]
        fn sets_text_fields() {
            let mut store = SessionStore::demo();
            store.set_profile_field(ProfileField::Name, " Ada ").unwrap();
            store.set_profile_field(ProfileField::Institution, "MIT").unwrap();
            store.set_profile_field(ProfileField::Branch, "CSE").unwrap();
            store.set_profile_field(ProfileField::Email, "ada@example.com").unwrap();

            let profile = store.profile();
            assert_eq!(profile.name, "Ada");
            assert_eq!(profile.institution, "MIT");
            assert_eq!(profile.branch, "CSE");
            assert_eq!(profile.email, "ada@example.com");
        }

        #[test]
        fn coerces_numeric_fields() {
            let mut store = SessionStore::demo();
            store.set_profile_field(ProfileField::Year, "2027").unwrap();
            store.set_profile_field(ProfileField::DailyStudyHours, "5.5").unwrap();
            assert_eq!(store.profile().year, 2027);
            assert_eq!(store.profile().preferences.daily_study_hours, 5.5);
        }

        #[test]
        fn out_of_range_year_is_rejected() {
            let mut store = SessionStore::demo();
            for year in ["0", "-5", "1899", "2101"] {
                assert!(matches!(
                    store.set_profile_field(ProfileField::Year, year),
                    Err(PlannerError::Validation(_))
                ));
            }
            assert_eq!(store.profile().year, 2026);

            store.set_profile_field(ProfileField::Year, "1900").unwrap();
            store.set_profile_field(ProfileField::Year, "2100").unwrap();
            assert_eq!(store.profile().year, 2100);
        }

        #[test]
        fn non_numeric_input_is_rejected_without_change() {
            let mut store = SessionStore::demo();
            let before = store.profile().clone();

            assert!(matches!(
                store.set_profile_field(ProfileField::Year, "next year"),
                Err(PlannerError::Validation(_))
            ));
            assert!(matches!(
                store.set_profile_field(ProfileField::DailyStudyHours, "lots"),
                Err(PlannerError::Validation(_))
            ));
            assert!(matches!(
                store.set_profile_field(ProfileField::DailyStudyHours, "NaN"),
                Err(PlannerError::Validation(_))
            ));
            assert!(matches!(
                store.set_profile_field(ProfileField::DailyStudyHours, "0"),
                Err(PlannerError::Validation(_))
            ));

            assert_eq!(store.profile(), &before);
        }

        #[test]
        fn parses_preferred_time() {
            let mut store = SessionStore::demo();
            store.set_profile_field(ProfileField::PreferredTime, "night").unwrap();
            assert_eq!(
                store.profile().preferences.preferred_time,
                PreferredTime::Night
            );
            assert!(store
                .set_profile_field(ProfileField::PreferredTime, "noon")
                .is_err());
        }

        #[test]
        fn field_from_str_aliases() {
            assert_eq!(ProfileField::from_str("college"), Some(ProfileField::Institution));
            assert_eq!(ProfileField::from_str("hours"), Some(ProfileField::DailyStudyHours));
            assert_eq!(ProfileField::from_str("Year"), Some(ProfileField::Year));
            assert_eq!(ProfileField::from_str("shoe_size"), None);
        }
    }

    mod subject_tests {
        use super::*;

        #[test]
        fn add_appends_medium_subject() {
            let mut store = SessionStore::demo();
            let added = store.add_subject("Thermodynamics").unwrap().clone();

            assert_eq!(store.subjects().len(), 4);
            assert_eq!(store.subjects()[3], added);
            assert_eq!(added.difficulty, Difficulty::Medium);
            assert!(added.credits.is_none());
            assert!(added.id.parse::<i64>().is_ok());
        }

        #[test]
        fn add_blank_name_is_noop() {
            let mut store = SessionStore::demo();
            assert!(store.add_subject("").is_err());
            assert!(store.add_subject("   ").is_err());
            assert_eq!(store.subjects().len(), 3);
        }

        #[test]
        fn rapid_adds_get_unique_ids() {
            let mut store = SessionStore::demo();
            for i in 0..20 {
                store.add_subject(&format!("Subject {}", i)).unwrap();
            }
            let mut ids: Vec<&str> = store.subjects().iter().map(|s| s.id.as_str()).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), 23);
        }

        #[test]
        fn remove_existing_subject() {
            let mut store = SessionStore::demo();
            assert!(store.remove_subject("s2"));
            let ids: Vec<&str> = store.subjects().iter().map(|s| s.id.as_str()).collect();
            assert_eq!(ids, vec!["s1", "s3"]);
        }

        #[test]
        fn remove_unknown_subject_is_noop() {
            let mut store = SessionStore::demo();
            let before = store.subjects().to_vec();
            assert!(!store.remove_subject("nope"));
            assert_eq!(store.subjects(), before.as_slice());
        }

        #[test]
        fn update_validates_values() {
            let mut store = SessionStore::demo();
            assert!(store.update_subject("s1", SubjectField::Confidence, "4").unwrap());
            assert!(store.update_subject("s1", SubjectField::Credits, "5").unwrap());
            assert!(store.update_subject("s1", SubjectField::Difficulty, "easy").unwrap());
            assert!(store.update_subject("s1", SubjectField::Name, "DSA").unwrap());

            let s1 = &store.subjects()[0];
            assert_eq!(s1.confidence, Some(4));
            assert_eq!(s1.credits, Some(5));
            assert_eq!(s1.difficulty, Difficulty::Easy);
            assert_eq!(s1.name, "DSA");

            assert!(store.update_subject("s1", SubjectField::Confidence, "9").is_err());
            assert!(store.update_subject("s1", SubjectField::Credits, "0").is_err());
            assert!(store.update_subject("s1", SubjectField::Name, " ").is_err());
            assert_eq!(store.subjects()[0].confidence, Some(4));
        }

        #[test]
        fn update_unknown_subject_returns_false() {
            let mut store = SessionStore::demo();
            assert!(!store.update_subject("zz", SubjectField::Credits, "3").unwrap());
        }
    }

    mod behavior_tests {
        use super::*;

        #[test]
        fn missed_session_increments_streak() {
            let mut store = SessionStore::demo();
            store.record_behavior_event(BehaviorEvent::MissedSession);
            store.record_behavior_event(BehaviorEvent::MissedSession);
            assert_eq!(store.profile().behavior.missed_streak, 2);
        }

        #[test]
        fn distraction_sets_fixed_delay() {
            let mut store = SessionStore::demo();
            store.record_behavior_event(BehaviorEvent::Distraction);
            assert_eq!(store.profile().behavior.last_session_delay_minutes, 45);
            store.record_behavior_event(BehaviorEvent::Distraction);
            assert_eq!(store.profile().behavior.last_session_delay_minutes, 45);
        }

        #[test]
        fn aced_topic_changes_nothing() {
            let mut store = SessionStore::demo();
            let before = store.profile().clone();
            store.record_behavior_event(BehaviorEvent::AcedTopic);
            assert_eq!(store.profile(), &before);
        }

        #[test]
        fn event_from_str() {
            assert_eq!(BehaviorEvent::from_str("missed"), Some(BehaviorEvent::MissedSession));
            assert_eq!(BehaviorEvent::from_str("ACED"), Some(BehaviorEvent::AcedTopic));
            assert_eq!(BehaviorEvent::from_str("distraction"), Some(BehaviorEvent::Distraction));
            assert_eq!(BehaviorEvent::from_str("slept"), None);
        }
    }

    mod request_flag_tests {
        use super::*;

        #[test]
        fn second_begin_is_rejected() {
            let mut store = SessionStore::demo();
            store.try_begin_request().unwrap();
            assert!(matches!(
                store.try_begin_request(),
                Err(PlannerError::ConcurrentRequest)
            ));
            store.finish_request();
            assert!(store.try_begin_request().is_ok());
        }

        #[test]
        fn commit_replaces_plan() {
            let mut store = SessionStore::demo();
            store.commit_plan(Plan {
                insights: Some(vec!["first".to_string()]),
                ..Default::default()
            });
            store.commit_plan(Plan::default());
            assert_eq!(store.plan(), Some(&Plan::default()));
        }
    }
}
