//! Fortune analysis pipeline: profile → request → validated result.

pub mod builder;
pub mod client;
pub mod model;
pub mod prompts;

pub use builder::{Attachment, AttachmentKind, GenerationRequest, RequestOptions, build_request};
pub use client::{AnalysisClient, parse_analysis};
pub use model::{
    AnalysisResult, AnalysisVariant, FiveElements, Interpersonal, Milestone, NatalChart,
    PersonalityColor, Physiognomy, SimilarPerson,
};
