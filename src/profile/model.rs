//! User profile and field edits.

use super::image::InlineImage;
use super::zodiac::zodiac_for_date;
use crate::error::ValidationError;

/// A single edit coming from the input form.
#[derive(Debug, Clone)]
pub enum ProfileEdit {
    Name(String),
    BirthDate(String),
    BirthTime(String),
    FaceImage(Option<InlineImage>),
    EarImage(Option<InlineImage>),
}

/// Canonical profile record.
///
/// `zodiac` has no setter: it only changes as a consequence of a birth date edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    name: String,
    birth_date: String,
    birth_time: String,
    zodiac: String,
    face_image: Option<InlineImage>,
    ear_image: Option<InlineImage>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one edit. Setting a non-empty birth date re-derives the zodiac.
    pub fn apply(&mut self, edit: ProfileEdit) {
        match edit {
            ProfileEdit::Name(name) => self.name = name,
            ProfileEdit::BirthDate(date) => {
                if !date.is_empty() {
                    self.zodiac = zodiac_for_date(&date);
                }
                self.birth_date = date;
            }
            ProfileEdit::BirthTime(time) => self.birth_time = time,
            ProfileEdit::FaceImage(image) => self.face_image = image,
            ProfileEdit::EarImage(image) => self.ear_image = image,
        }
    }

    /// Builder-style [`apply`](Self::apply).
    pub fn with(mut self, edit: ProfileEdit) -> Self {
        self.apply(edit);
        self
    }

    /// Whether a generation request may be built from this profile.
    pub fn readiness(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.birth_date.trim().is_empty() {
            return Err(ValidationError::MissingBirthDate);
        }
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.readiness().is_ok()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn birth_date(&self) -> &str {
        &self.birth_date
    }

    pub fn birth_time(&self) -> &str {
        &self.birth_time
    }

    pub fn zodiac(&self) -> &str {
        &self.zodiac
    }

    pub fn face_image(&self) -> Option<&InlineImage> {
        self.face_image.as_ref()
    }

    pub fn ear_image(&self) -> Option<&InlineImage> {
        self.ear_image.as_ref()
    }

    /// Birth time for display, with a placeholder when unknown.
    pub fn birth_time_label(&self) -> &str {
        if self.birth_time.trim().is_empty() {
            "未知时辰"
        } else {
            &self.birth_time
        }
    }
}
