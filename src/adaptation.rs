use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::PlannerError;
use crate::orchestrator::PlanOrchestrator;
use crate::presenter::Presenter;
use crate::state::{self, BehaviorEvent};

/// What the learner is told when an adaptation fires
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub event: BehaviorEvent,
    pub title: &'static str,
    pub message: &'static str,
}

impl Notification {
    pub fn for_event(event: BehaviorEvent) -> Self {
        let (title, message) = match event {
            BehaviorEvent::MissedSession => (
                "Adaptation Triggered",
                "Missed session recorded. Rescheduling the rest of the dependency chain.",
            ),
            BehaviorEvent::AcedTopic => (
                "High Performance Detected",
                "Strong result recorded. Regenerating the plan for this topic chain.",
            ),
            BehaviorEvent::Distraction => (
                "Focus Recovery",
                "Idle time detected. Suggesting micro-sprint mode to recover focus.",
            ),
        };
        Self {
            event,
            title,
            message,
        }
    }
}

/// Feeds behavior events back into the session and re-runs planning
pub struct AdaptationEngine {
    orchestrator: Arc<PlanOrchestrator>,
    presenter: Arc<dyn Presenter>,
}

impl AdaptationEngine {
    pub fn new(orchestrator: Arc<PlanOrchestrator>, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            orchestrator,
            presenter,
        }
    }

    /// Record `event` and regenerate the plan.
    ///
    /// Returns `Ok(None)` without touching the session when no plan has been
    /// committed yet. While another request is in flight the event is rejected
    /// with `ConcurrentRequest` and not recorded. A failed regeneration is not
    /// retried.
    pub async fn trigger(&self, event: BehaviorEvent) -> Result<Option<Notification>, PlannerError> {
        {
            let mut store = state::lock(self.orchestrator.store());
            if !store.has_plan() {
                debug!(event = event.as_str(), "trigger: no plan yet, ignoring");
                return Ok(None);
            }
            if store.is_requesting() {
                debug!(event = event.as_str(), "trigger: request in flight, rejecting");
                return Err(PlannerError::ConcurrentRequest);
            }
            store.record_behavior_event(event);
        }

        let notification = Notification::for_event(event);
        info!(event = event.as_str(), "trigger: adapting plan");
        self.presenter.notify(&notification);

        self.orchestrator.request_plan().await?;
        Ok(Some(notification))
    }
}
