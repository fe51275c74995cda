//! View state machine and the chat transcript type.

use serde::{Deserialize, Serialize};

use crate::llm::Role;

/// The three top-level views.
///
/// input → loading → result → input, with loading → input on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// Editable form.
    #[default]
    Input,
    /// Analysis request in flight; no input accepted.
    Loading,
    /// Analysis displayed, chat available.
    Result,
}

impl ViewState {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: ViewState) -> bool {
        use ViewState::*;
        matches!(
            (self, target),
            (Input, Loading) | (Loading, Result) | (Loading, Input) | (Result, Input)
        )
    }
}

impl std::fmt::Display for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Input => "input",
            Self::Loading => "loading",
            Self::Result => "result",
        };
        write!(f, "{s}")
    }
}

/// One entry of the displayed chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}
