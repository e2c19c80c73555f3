use crate::models::{Difficulty, Subject, Topic};

const PREFIXES: [&str; 4] = ["Intro to", "Advanced", "Applications of", "Theory of"];

// (suffix, prefix index, difficulty, seed quiz score)
const CHAIN: [(&str, usize, Difficulty, f64); 3] = [
    ("t1", 0, Difficulty::Easy, 85.0),
    ("t2", 3, Difficulty::Medium, 60.0),
    ("t3", 1, Difficulty::Hard, 40.0),
];

pub fn topic_id(subject_id: &str, suffix: &str) -> String {
    format!("{}_{}", subject_id, suffix)
}

/// Emit the linear topic chain for one subject
pub fn synthesize(subject: &Subject) -> Vec<Topic> {
    let mut topics: Vec<Topic> = Vec::with_capacity(CHAIN.len());

    for (suffix, prefix, difficulty, score) in CHAIN {
        let prerequisites = topics.last().map(|prev| vec![prev.id.clone()]).unwrap_or_default();

        topics.push(Topic {
            id: topic_id(&subject.id, suffix),
            name: format!("{} {}", PREFIXES[prefix], subject.name),
            subject_id: subject.name.clone(),
            difficulty_level: difficulty,
            avg_quiz_score: score,
            revisions_completed: 0,
            failure_frequency: 0,
            prerequisites,
        });
    }

    topics
}
