//! Application state controller.
//!
//! Drives input → loading → result and gates every chat turn. All guards
//! live here, at the data layer, so they hold no matter what the
//! presentation layer enables or disables.
//!
//! Locking: the view state sits behind a `std::sync::Mutex` that is never held
//! across an `.await`; the session orchestrator sits behind a `tokio::sync::Mutex`
//! that is held for the duration of a chat turn. The session lock is never
//! awaited while the state lock is held; `reset` only try-locks it, after the
//! busy flag has shown that no turn owns it.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};
use uuid::Uuid;

use super::state::{ChatMessage, ViewState};
use crate::analysis::{AnalysisClient, AnalysisResult, RequestOptions, build_request};
use crate::config::{DEFAULT_ANALYSIS_MODEL, DEFAULT_CHAT_MODEL, OracleConfig};
use crate::error::{ControllerError, SessionError};
use crate::llm::{GenerativeService, OutputSchema};
use crate::profile::{Profile, ProfileEdit};
use crate::session::SessionOrchestrator;

/// First model-authored message of every new session.
pub const GREETING: &str = "星辰已归位，蒜蒜已为你推演完毕。";
/// Shown in place of a reply when a chat turn fails.
pub const CHAT_FALLBACK: &str = "链接波动，请稍后再试。";
/// Shown when the profile is not ready for analysis.
pub const VALIDATION_MESSAGE: &str = "请填写姓名和出生日期。";

/// Static settings for the controller.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub analysis_model: String,
    pub chat_model: String,
    pub request: RequestOptions,
    pub temperature: Option<f32>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            request: RequestOptions::default(),
            temperature: None,
        }
    }
}

impl ControllerOptions {
    pub fn from_config(config: &OracleConfig) -> Self {
        Self {
            analysis_model: config.analysis_model.clone(),
            chat_model: config.chat_model.clone(),
            request: RequestOptions {
                variant: config.variant,
                ..RequestOptions::default()
            },
            temperature: None,
        }
    }
}

/// Result of one chat turn as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// The model-authored entry that was appended to the transcript.
    pub message: ChatMessage,
    /// True when `message` is the local fallback rather than a real reply.
    pub degraded: bool,
}

#[derive(Debug, Default)]
struct AppState {
    view: ViewState,
    profile: Profile,
    analysis: Option<AnalysisResult>,
    messages: Vec<ChatMessage>,
    chat_busy: bool,
    session_id: Option<Uuid>,
}

pub struct AppController {
    client: AnalysisClient,
    request_options: RequestOptions,
    schema: OutputSchema,
    state: Mutex<AppState>,
    sessions: tokio::sync::Mutex<SessionOrchestrator>,
}

impl AppController {
    pub fn new(service: Arc<dyn GenerativeService>, options: ControllerOptions) -> Self {
        let mut client = AnalysisClient::new(Arc::clone(&service), options.analysis_model);
        if let Some(t) = options.temperature {
            client = client.with_temperature(t);
        }
        Self {
            client,
            schema: options.request.variant.output_schema(),
            request_options: options.request,
            state: Mutex::new(AppState::default()),
            sessions: tokio::sync::Mutex::new(SessionOrchestrator::new(
                service,
                options.chat_model,
            )),
        }
    }

    fn state(&self) -> MutexGuard<'_, AppState> {
        lock(&self.state)
    }

    // ── Snapshots ───────────────────────────────────────────────────

    pub fn view(&self) -> ViewState {
        self.state().view
    }

    pub fn profile(&self) -> Profile {
        self.state().profile.clone()
    }

    pub fn analysis(&self) -> Option<AnalysisResult> {
        self.state().analysis.clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state().messages.clone()
    }

    pub fn is_chat_busy(&self) -> bool {
        self.state().chat_busy
    }

    pub fn has_active_session(&self) -> bool {
        self.state().session_id.is_some()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.state().session_id
    }

    // ── Operations ──────────────────────────────────────────────────

    /// Apply a form edit. Only allowed in the input view.
    pub fn update_profile(&self, edit: ProfileEdit) -> Result<(), ControllerError> {
        let mut state = self.state();
        if state.view != ViewState::Input {
            return Err(ControllerError::NotEditable {
                view: state.view.to_string(),
            });
        }
        state.profile.apply(edit);
        Ok(())
    }

    /// Run the analysis for the current profile.
    ///
    /// On success the view moves to result, a fresh chat session is opened and
    /// the greeting is seeded. On any failure the view returns to input with the
    /// profile untouched.
    pub async fn start_analysis(&self) -> Result<(), ControllerError> {
        let (profile, request) = {
            let mut state = self.state();
            if !state.view.can_transition_to(ViewState::Loading) {
                return Err(invalid(state.view, ViewState::Loading));
            }
            let request = build_request(&state.profile, &self.request_options)?;
            state.view = ViewState::Loading;
            (state.profile.clone(), request)
        };
        let mut pending = InFlight::new(&self.state, Call::Analysis);

        let outcome = self.client.generate(&request, &self.schema).await;

        match outcome {
            Ok(result) => {
                let mut sessions = self.sessions.lock().await;
                let session_id = sessions.initialize(&profile, &result);

                let mut state = self.state();
                state.analysis = Some(result);
                state.messages = vec![ChatMessage::model(GREETING)];
                state.chat_busy = false;
                state.session_id = Some(session_id);
                state.view = ViewState::Result;
                pending.disarm();
                info!(session_id = %session_id, "Analysis complete");
                Ok(())
            }
            Err(e) => {
                self.state().view = ViewState::Input;
                pending.disarm();
                warn!(error = %e, "Analysis failed, back to input");
                Err(e.into())
            }
        }
    }

    /// Send one chat turn.
    ///
    /// The user message is appended before the call and exactly one model
    /// entry after it: the reply, or [`CHAT_FALLBACK`] if the turn failed.
    /// Transport failures are absorbed here; the session stays active.
    pub async fn send_chat(&self, text: &str) -> Result<ChatReply, ControllerError> {
        let message = text.trim();
        if message.is_empty() {
            return Err(ControllerError::EmptyMessage);
        }

        {
            let mut state = self.state();
            if state.view != ViewState::Result {
                return Err(SessionError::NotInitialized.into());
            }
            if state.chat_busy {
                return Err(ControllerError::ChatBusy);
            }
            state.messages.push(ChatMessage::user(message));
            state.chat_busy = true;
        }
        let mut pending = InFlight::new(&self.state, Call::Chat);

        let outcome = {
            let mut sessions = self.sessions.lock().await;
            sessions.send(message).await
        };
        pending.disarm();

        let (reply, degraded) = match outcome {
            Ok(reply) => (ChatMessage::model(reply), false),
            Err(e) => {
                warn!(error = %e, "Chat turn failed, showing fallback");
                (ChatMessage::model(CHAT_FALLBACK), true)
            }
        };

        let mut state = self.state();
        state.messages.push(reply.clone());
        state.chat_busy = false;
        Ok(ChatReply {
            message: reply,
            degraded,
        })
    }

    /// Leave the result view, discarding the analysis, transcript and session.
    /// The profile is kept for the next run. Refused while a chat turn is in flight.
    pub fn reset(&self) -> Result<(), ControllerError> {
        let mut state = self.state();
        if state.view != ViewState::Result {
            return Err(invalid(state.view, ViewState::Input));
        }
        if state.chat_busy {
            return Err(ControllerError::ChatBusy);
        }
        // Not busy means no turn holds the session lock
        let mut sessions = self.sessions.try_lock().map_err(|_| ControllerError::ChatBusy)?;
        sessions.reset();

        state.view = ViewState::Input;
        state.analysis = None;
        state.messages.clear();
        state.session_id = None;
        Ok(())
    }
}

fn lock(state: &Mutex<AppState>) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn invalid(from: ViewState, to: ViewState) -> ControllerError {
    ControllerError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[derive(Debug, Clone, Copy)]
enum Call {
    Analysis,
    Chat,
}

/// Restores a consistent state if the future driving a call is dropped
/// before the call resolves.
struct InFlight<'a> {
    state: &'a Mutex<AppState>,
    call: Call,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a Mutex<AppState>, call: Call) -> Self {
        Self {
            state,
            call,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock(self.state);
        match self.call {
            Call::Analysis => {
                if state.view == ViewState::Loading {
                    state.view = ViewState::Input;
                }
            }
            Call::Chat => {
                if state.chat_busy {
                    state.messages.push(ChatMessage::model(CHAT_FALLBACK));
                    state.chat_busy = false;
                }
            }
        }
        warn!(call = ?self.call, "In-flight call abandoned");
    }
}
