//! Application state: the view machine and the controller that guards it.

pub mod controller;
pub mod state;

pub use controller::{
    AppController, CHAT_FALLBACK, ChatReply, ControllerOptions, GREETING, VALIDATION_MESSAGE,
};
pub use state::{ChatMessage, ViewState};
