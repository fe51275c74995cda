//! Follow-up conversation scoped to a completed analysis.

pub mod chat;
pub mod orchestrator;

pub use chat::ChatSession;
pub use orchestrator::SessionOrchestrator;
