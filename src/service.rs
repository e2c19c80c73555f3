use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::PlannerError;
use crate::models::{Plan, PlanRequest};

pub const GENERATE_ROUTE: &str = "/api/generate-schedule";

#[async_trait]
pub trait SchedulingService: Send + Sync {
    async fn generate(&self, request: &PlanRequest) -> Result<Plan, PlannerError>;
}

/// reqwest client for `POST /api/generate-schedule`
pub struct HttpSchedulingService {
    endpoint: String,
    http: Client,
}

impl HttpSchedulingService {
    pub fn from_config(config: &ServiceConfig) -> Result<Self, PlannerError> {
        debug!(base_url = %config.base_url, "HttpSchedulingService::from_config");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            endpoint: endpoint(&config.base_url),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

pub fn endpoint(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), GENERATE_ROUTE)
}

/// Non-2xx bodies are plain text and shown to the learner as-is
pub fn check_response(status: u16, body: String) -> Result<Plan, PlannerError> {
    if !(200..300).contains(&status) {
        let message = if body.trim().is_empty() {
            "Failed to generate".to_string()
        } else {
            body
        };
        return Err(PlannerError::Service { status, message });
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl SchedulingService for HttpSchedulingService {
    async fn generate(&self, request: &PlanRequest) -> Result<Plan, PlannerError> {
        debug!(endpoint = %self.endpoint, topics = request.topics.len(), "generate: sending");

        let response = self.http.post(&self.endpoint).json(request).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        let result = check_response(status, body);
        if let Err(e) = &result {
            warn!(%status, error = %e, "generate: service rejected request");
        }
        result
    }
}

#[cfg(test)]
pub mod mock {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use tokio::sync::Notify;

    use super::*;

    /// Scheduling service stand-in that replays queued responses
    pub struct MockSchedulingService {
        responses: Mutex<VecDeque<Result<Plan, PlannerError>>>,
        requests: Mutex<Vec<PlanRequest>>,
        call_count: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    impl MockSchedulingService {
        pub fn new(responses: Vec<Result<Plan, PlannerError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
                call_count: AtomicUsize::new(0),
                gate: None,
            }
        }

        /// Hold every call open until the returned `Notify` is signalled
        pub fn gated(responses: Vec<Result<Plan, PlannerError>>) -> (Self, Arc<Notify>) {
            let gate = Arc::new(Notify::new());
            let mut service = Self::new(responses);
            service.gate = Some(gate.clone());
            (service, gate)
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<PlanRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SchedulingService for MockSchedulingService {
        async fn generate(&self, request: &PlanRequest) -> Result<Plan, PlannerError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(PlannerError::validation("No more mock responses")))
        }
    }
}
