//! Session orchestrator — owns at most one [`ChatSession`].
//!
//! Uninitialized → (initialize) → Active → (reset) → Uninitialized.
//! Initializing while Active replaces the old session outright; nothing is
//! carried over.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::chat::ChatSession;
use crate::analysis::{AnalysisResult, prompts::chat_system_instruction};
use crate::error::SessionError;
use crate::llm::GenerativeService;
use crate::profile::Profile;

pub struct SessionOrchestrator {
    service: Arc<dyn GenerativeService>,
    model: String,
    active: Option<ChatSession>,
}

impl SessionOrchestrator {
    pub fn new(service: Arc<dyn GenerativeService>, model: impl Into<String>) -> Self {
        Self {
            service,
            model: model.into(),
            active: None,
        }
    }

    /// Open a fresh session scoped to this analysis, replacing any active one.
    pub fn initialize(&mut self, profile: &Profile, analysis: &AnalysisResult) -> Uuid {
        let instruction = chat_system_instruction(profile, analysis);
        let session = ChatSession::new(Arc::clone(&self.service), &self.model, instruction);
        let id = session.id();

        if let Some(previous) = self.active.replace(session) {
            info!(previous = %previous.id(), session_id = %id, "Replaced chat session");
        } else {
            info!(session_id = %id, model = %self.model, "Opened chat session");
        }
        id
    }

    /// Send one turn through the active session.
    ///
    /// A failure leaves the session active and usable.
    pub async fn send(&mut self, message: &str) -> Result<String, SessionError> {
        let session = self.active.as_mut().ok_or(SessionError::NotInitialized)?;
        let session_id = session.id();
        match session.send(message).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Chat turn failed");
                Err(e)
            }
        }
    }

    /// Discard the active session, if any.
    pub fn reset(&mut self) {
        if let Some(session) = self.active.take() {
            info!(session_id = %session.id(), turns = session.turn_count(), "Closed chat session");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.active.as_ref()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.active.as_ref().map(ChatSession::id)
    }
}
