//! Suan Oracle — birth-data fortune analysis with a follow-up chat.

pub mod analysis;
pub mod app;
pub mod config;
pub mod error;
pub mod llm;
pub mod profile;
pub mod session;
