//! Scripted service for unit tests (no real API calls).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::provider::{ContentRequest, ContentResponse, GenerativeService};
use crate::error::LlmError;

/// Replays queued replies in order and records every request.
pub(crate) struct ScriptedService {
    replies: Mutex<VecDeque<Result<ContentResponse, LlmError>>>,
    requests: Mutex<Vec<ContentRequest>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedService {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            gate: None,
        })
    }

    /// Every call waits for one `notify_one` on the returned handle before replying.
    pub(crate) fn gated() -> (Arc<Self>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            gate: Some(Arc::clone(&gate)),
        });
        (service, gate)
    }

    pub(crate) fn push_text(&self, text: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(ContentResponse::text(text)));
    }

    pub(crate) fn push_reply(&self, reply: Result<ContentResponse, LlmError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub(crate) fn push_failure(&self, reason: &str) {
        self.push_reply(Err(LlmError::RequestFailed {
            provider: "scripted".to_string(),
            reason: reason.to_string(),
        }));
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<ContentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeService for ScriptedService {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn generate_content(&self, request: ContentRequest) -> Result<ContentResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(LlmError::RequestFailed {
                    provider: "scripted".to_string(),
                    reason: "no scripted reply left".to_string(),
                })
            })
    }
}
