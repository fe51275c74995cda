//! Conversational context bound to one system instruction.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::SessionError;
use crate::llm::{Content, ContentRequest, GenerativeService};

/// One open conversation with the service.
///
/// Keeps its own wire history so each turn carries the full context.
/// `send` takes `&mut self`, so a session can never have two turns in flight.
pub struct ChatSession {
    id: Uuid,
    service: Arc<dyn GenerativeService>,
    model: String,
    system_instruction: String,
    history: Vec<Content>,
}

impl ChatSession {
    pub fn new(
        service: Arc<dyn GenerativeService>,
        model: impl Into<String>,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            service,
            model: model.into(),
            system_instruction: system_instruction.into(),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Completed exchanges so far.
    pub fn turn_count(&self) -> usize {
        self.history.len() / 2
    }

    /// Send one user turn and return the model's reply.
    ///
    /// History only grows on success, so a failed turn leaves the session
    /// exactly as it was.
    pub async fn send(&mut self, message: &str) -> Result<String, SessionError> {
        let user = Content::user_text(message);
        let mut contents = self.history.clone();
        contents.push(user.clone());

        let request = ContentRequest::new(&self.model, contents)
            .with_system_instruction(&self.system_instruction);
        let response = self.service.generate_content(request).await?;

        let reply = response
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or(SessionError::EmptyReply)?;

        self.history.push(user);
        self.history.push(Content::model_text(&reply));
        Ok(reply)
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("model", &self.model)
            .field("turns", &self.turn_count())
            .finish()
    }
}
