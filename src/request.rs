use tracing::debug;

use crate::error::PlannerError;
use crate::models::{PlanRequest, SubjectSummary};
use crate::state::SessionStore;
use crate::topics;

/// Project the session into the scheduling service's request body.
///
/// Topics are regenerated from the subject list on every call, in subject
/// order. An empty subject list is rejected before anything is dispatched.
pub fn build(store: &SessionStore) -> Result<PlanRequest, PlannerError> {
    let subjects = store.subjects();
    if subjects.is_empty() {
        return Err(PlannerError::validation(
            "add at least one subject before generating a plan",
        ));
    }

    let topics = subjects.iter().flat_map(topics::synthesize).collect::<Vec<_>>();
    debug!(subjects = subjects.len(), topics = topics.len(), "build: request ready");

    Ok(PlanRequest {
        profile: store.profile().clone(),
        subjects: subjects.iter().map(SubjectSummary::from).collect(),
        topics,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::models::{Difficulty, Profile, Subject};
    use crate::state::{BehaviorEvent, SubjectField};

    fn store_with(names: &[(&str, &str)]) -> SessionStore {
        let subjects = names
            .iter()
            .map(|(id, name)| Subject {
                id: id.to_string(),
                name: name.to_string(),
                credits: None,
                difficulty: Difficulty::Medium,
                confidence: None,
            })
            .collect();
        SessionStore::new(Profile::default(), subjects).unwrap()
    }

    #[test]
    fn three_topics_per_subject() {
        for count in 1..=6 {
            let names: Vec<(String, String)> = (0..count)
                .map(|i| (format!("s{}", i), format!("Subject {}", i)))
                .collect();
            let pairs: Vec<(&str, &str)> =
                names.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();

            let request = build(&store_with(&pairs)).unwrap();
            assert_eq!(request.topics.len(), 3 * count);
            assert_eq!(request.subjects.len(), count);
        }
    }

    #[test]
    fn prerequisites_point_backwards_within_subject() {
        let request = build(&SessionStore::demo()).unwrap();

        for (i, topic) in request.topics.iter().enumerate() {
            for prereq in &topic.prerequisites {
                let earlier = request.topics[..i]
                    .iter()
                    .find(|t| &t.id == prereq)
                    .expect("prerequisite must precede its dependent");
                assert_eq!(earlier.subject_id, topic.subject_id);
            }
        }
    }

    #[test]
    fn topic_ids_are_unique() {
        let mut store = SessionStore::demo();
        store.add_subject("Compilers").unwrap();
        store.add_subject("Networks").unwrap();

        let request = build(&store).unwrap();
        let ids: HashSet<&str> = request.topics.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), request.topics.len());
    }

    #[test]
    fn follows_subject_order() {
        let request = build(&store_with(&[("b", "Beta"), ("a", "Alpha")])).unwrap();
        assert_eq!(request.topics[0].id, "b_t1");
        assert_eq!(request.topics[3].id, "a_t1");
        assert_eq!(request.subjects[0].name, "Beta");
    }

    #[test]
    fn empty_subject_list_is_validation_error() {
        let store = SessionStore::new(Profile::default(), Vec::new()).unwrap();
        assert!(matches!(build(&store), Err(PlannerError::Validation(_))));
    }

    #[test]
    fn same_state_gives_identical_bytes() {
        let store = SessionStore::demo();
        let first = serde_json::to_vec(&build(&store).unwrap()).unwrap();
        let second = serde_json::to_vec(&build(&store).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn carries_behavior_and_confidence() {
        let mut store = SessionStore::demo();
        store.record_behavior_event(BehaviorEvent::MissedSession);
        store.update_subject("s2", SubjectField::Confidence, "2").unwrap();

        let request = build(&store).unwrap();
        assert_eq!(request.profile.behavior.missed_streak, 1);
        assert_eq!(request.subjects[1].confidence_level, Some(2));
        assert_eq!(request.subjects[0].credits, Some(4));
    }

    #[test]
    fn wire_shape() {
        let value = serde_json::to_value(build(&store_with(&[("s1", "DS")])).unwrap()).unwrap();

        assert!(value["profile"]["preferences"]["daily_study_hours"].is_number());
        assert_eq!(value["subjects"][0]["name"], "DS");
        assert!(value["subjects"][0]["credits"].is_null());
        assert_eq!(value["topics"][1]["id"], "s1_t2");
        assert_eq!(value["topics"][1]["subject_id"], "DS");
        assert_eq!(value["topics"][1]["difficulty_level"], "Medium");
        assert_eq!(value["topics"][1]["prerequisites"][0], "s1_t1");
    }
}
