use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::PlannerError;
use crate::models::Plan;
use crate::presenter::Presenter;
use crate::request;
use crate::service::SchedulingService;
use crate::state::{self, SharedStore};

/// At most one request is in flight per session; the flag is cleared by a
/// drop guard, so it is released even when the calling future is dropped.
pub struct PlanOrchestrator {
    store: SharedStore,
    service: Arc<dyn SchedulingService>,
    presenter: Arc<dyn Presenter>,
    timeout: Duration,
    min_visible: Duration,
}

struct InFlight {
    store: SharedStore,
}

impl InFlight {
    fn acquire(store: &SharedStore) -> Result<Self, PlannerError> {
        state::lock(store).try_begin_request()?;
        Ok(Self {
            store: store.clone(),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        state::lock(&self.store).finish_request();
    }
}

impl PlanOrchestrator {
    pub fn new(
        store: SharedStore,
        service: Arc<dyn SchedulingService>,
        presenter: Arc<dyn Presenter>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            service,
            presenter,
            timeout,
            min_visible: Duration::ZERO,
        }
    }

    /// Keep the computing state on screen for at least `min_visible` on success.
    /// Purely cosmetic; zero disables it.
    pub fn with_min_visible(mut self, min_visible: Duration) -> Self {
        self.min_visible = min_visible;
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Run one request cycle against the scheduling service.
    ///
    /// Rejected locally, with no signal to the presenter, when another request
    /// is in flight or the session has no subjects.
    pub async fn request_plan(&self) -> Result<Plan, PlannerError> {
        let _in_flight = InFlight::acquire(&self.store).inspect_err(|_| {
            debug!("request_plan: rejected, request already in flight");
        })?;

        let request = request::build(&state::lock(&self.store))?;

        info!(topics = request.topics.len(), "request_plan: dispatching");
        self.presenter.show_computing();
        let started = Instant::now();

        let outcome = match tokio::time::timeout(self.timeout, self.service.generate(&request)).await {
            Ok(result) => result,
            Err(_) => Err(PlannerError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(plan) => {
                let elapsed = started.elapsed();
                if elapsed < self.min_visible {
                    tokio::time::sleep(self.min_visible - elapsed).await;
                }

                state::lock(&self.store).commit_plan(plan.clone());
                info!(
                    sessions = plan.timeline().len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "request_plan: plan committed"
                );
                self.presenter.clear_computing();
                self.presenter.render(&plan);
                Ok(plan)
            }
            Err(e) => {
                warn!(error = %e, "request_plan: failed, keeping previous plan");
                self.presenter.clear_computing();
                self.presenter.failure(&e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;
    use crate::presenter::recording::{RecordingPresenter, Signal};
    use crate::service::mock::MockSchedulingService;
    use crate::state::SessionStore;

    fn plan_with(insight: &str) -> Plan {
        Plan {
            insights: Some(vec![insight.to_string()]),
            ..Default::default()
        }
    }

    fn setup(
        service: MockSchedulingService,
        timeout: Duration,
    ) -> (
        Arc<PlanOrchestrator>,
        Arc<MockSchedulingService>,
        Arc<RecordingPresenter>,
    ) {
        let service = Arc::new(service);
        let presenter = Arc::new(RecordingPresenter::default());
        let orchestrator = PlanOrchestrator::new(
            state::shared(SessionStore::demo()),
            service.clone(),
            presenter.clone(),
            timeout,
        );
        (Arc::new(orchestrator), service, presenter)
    }

    mod success_tests {
        use super::*;

        #[tokio::test]
        async fn commits_and_renders_plan() {
            let (orch, service, presenter) = setup(
                MockSchedulingService::new(vec![Ok(plan_with("first"))]),
                Duration::from_secs(5),
            );

            let plan = orch.request_plan().await.unwrap();

            assert_eq!(plan, plan_with("first"));
            assert_eq!(state::lock(orch.store()).plan(), Some(&plan_with("first")));
            assert!(!state::lock(orch.store()).is_requesting());
            assert_eq!(service.call_count(), 1);
            assert_eq!(service.requests()[0].topics.len(), 9);
            assert_eq!(
                presenter.signals(),
                vec![
                    Signal::Computing,
                    Signal::Cleared,
                    Signal::Rendered(plan_with("first"))
                ]
            );
        }

        #[tokio::test]
        async fn new_plan_replaces_old_wholesale() {
            let (orch, _, _) = setup(
                MockSchedulingService::new(vec![Ok(plan_with("first")), Ok(Plan::default())]),
                Duration::from_secs(5),
            );

            orch.request_plan().await.unwrap();
            orch.request_plan().await.unwrap();
            assert_eq!(state::lock(orch.store()).plan(), Some(&Plan::default()));
        }

        #[tokio::test(start_paused = true)]
        async fn min_visible_delay_applies_to_success() {
            let orch = PlanOrchestrator::new(
                state::shared(SessionStore::demo()),
                Arc::new(MockSchedulingService::new(vec![Ok(plan_with("slow"))])),
                Arc::new(RecordingPresenter::default()),
                Duration::from_secs(5),
            )
            .with_min_visible(Duration::from_millis(1500));

            let started = tokio::time::Instant::now();
            orch.request_plan().await.unwrap();
            assert!(started.elapsed() >= Duration::from_millis(1500));
        }
    }

    mod failure_tests {
        use super::*;

        #[tokio::test]
        async fn failure_keeps_previous_plan() {
            let (orch, _, presenter) = setup(
                MockSchedulingService::new(vec![
                    Ok(plan_with("keep me")),
                    Err(PlannerError::Service {
                        status: 500,
                        message: "engine exploded".to_string(),
                    }),
                ]),
                Duration::from_secs(5),
            );

            orch.request_plan().await.unwrap();
            let err = orch.request_plan().await.unwrap_err();

            assert!(err.is_transport());
            assert_eq!(state::lock(orch.store()).plan(), Some(&plan_with("keep me")));
            assert!(!state::lock(orch.store()).is_requesting());

            let signals = presenter.signals();
            assert_eq!(signals[signals.len() - 2], Signal::Cleared);
            assert_eq!(
                signals[signals.len() - 1],
                Signal::Failed("Scheduling service returned 500: engine exploded".to_string())
            );
        }

        #[tokio::test]
        async fn empty_subjects_never_reach_service() {
            let service = Arc::new(MockSchedulingService::new(vec![Ok(Plan::default())]));
            let presenter = Arc::new(RecordingPresenter::default());
            let store = state::shared(SessionStore::new(Profile::default(), Vec::new()).unwrap());
            let orch = PlanOrchestrator::new(
                store.clone(),
                service.clone(),
                presenter.clone(),
                Duration::from_secs(5),
            );

            let err = orch.request_plan().await.unwrap_err();

            assert!(matches!(err, PlannerError::Validation(_)));
            assert_eq!(service.call_count(), 0);
            assert!(presenter.signals().is_empty());
            assert!(!state::lock(&store).is_requesting());
        }

        #[tokio::test(start_paused = true)]
        async fn timeout_clears_in_flight_flag() {
            let (service, _gate) = MockSchedulingService::gated(vec![Ok(plan_with("late"))]);
            let (orch, _, presenter) = setup(service, Duration::from_secs(30));

            let err = orch.request_plan().await.unwrap_err();

            assert!(matches!(err, PlannerError::Timeout(_)));
            assert!(!state::lock(orch.store()).is_requesting());
            assert!(state::lock(orch.store()).plan().is_none());
            assert!(matches!(presenter.signals().last(), Some(Signal::Failed(_))));
        }
    }

    mod concurrency_tests {
        use super::*;

        #[tokio::test]
        async fn second_request_is_rejected_while_first_in_flight() {
            let (service, gate) = MockSchedulingService::gated(vec![Ok(plan_with("first"))]);
            let (orch, service, _) = setup(service, Duration::from_secs(5));

            let first = tokio::spawn({
                let orch = orch.clone();
                async move { orch.request_plan().await }
            });

            while service.call_count() == 0 {
                tokio::task::yield_now().await;
            }
            assert!(state::lock(orch.store()).is_requesting());

            let second = orch.request_plan().await;
            assert!(matches!(second, Err(PlannerError::ConcurrentRequest)));
            assert!(state::lock(orch.store()).is_requesting());
            assert_eq!(service.call_count(), 1);

            gate.notify_one();
            let plan = first.await.unwrap().unwrap();

            assert_eq!(plan, plan_with("first"));
            assert!(!state::lock(orch.store()).is_requesting());
        }

        #[tokio::test]
        async fn dropped_request_releases_flag() {
            let (service, _gate) = MockSchedulingService::gated(vec![Ok(plan_with("never"))]);
            let (orch, service, _) = setup(service, Duration::from_secs(5));

            let pending = tokio::spawn({
                let orch = orch.clone();
                async move { orch.request_plan().await }
            });
            while service.call_count() == 0 {
                tokio::task::yield_now().await;
            }

            pending.abort();
            let _ = pending.await;
            assert!(!state::lock(orch.store()).is_requesting());
        }
    }
}
