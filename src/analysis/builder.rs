//! Multimodal request builder — profile in, generation request out.
//!
//! Pure data transformation: no I/O, no retries.

use super::model::AnalysisVariant;
use super::prompts::{DEFAULT_TARGET_YEAR, analysis_instruction};
use crate::error::ValidationError;
use crate::llm::Part;
use crate::profile::{InlineImage, Profile};

/// Which profile image an attachment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Face,
    Ear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub image: InlineImage,
}

/// Instruction text plus zero or more inline images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub instruction: String,
    /// Always face before ear.
    pub attachments: Vec<Attachment>,
}

impl GenerationRequest {
    /// Parts in wire order: attachments first, then the instruction.
    pub fn parts(&self) -> Vec<Part> {
        self.attachments
            .iter()
            .map(|a| Part::inline(a.image.mime_type(), a.image.data()))
            .chain(std::iter::once(Part::text(self.instruction.clone())))
            .collect()
    }
}

/// Options that shape the request independent of the profile.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub variant: AnalysisVariant,
    pub target_year: String,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            variant: AnalysisVariant::default(),
            target_year: DEFAULT_TARGET_YEAR.to_string(),
        }
    }
}

/// Build a generation request from a ready profile.
pub fn build_request(
    profile: &Profile,
    options: &RequestOptions,
) -> Result<GenerationRequest, ValidationError> {
    profile.readiness()?;

    let attachments: Vec<Attachment> = [
        (AttachmentKind::Face, profile.face_image()),
        (AttachmentKind::Ear, profile.ear_image()),
    ]
    .into_iter()
    .filter_map(|(kind, image)| {
        image.map(|image| Attachment {
            kind,
            image: image.clone(),
        })
    })
    .collect();

    let instruction = analysis_instruction(
        profile,
        options.variant,
        &options.target_year,
        profile.face_image().is_some(),
        profile.ear_image().is_some(),
    );

    Ok(GenerationRequest {
        instruction,
        attachments,
    })
}
