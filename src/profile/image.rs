//! Inline images captured from user-selected files.
//!
//! An [`InlineImage`] is self-contained: MIME type plus raw bytes. It round-trips
//! through the `data:<mime>;base64,<payload>` form that file pickers hand back,
//! so nothing needs to be re-read from disk or the network later.

use std::path::Path;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use regex::Regex;

use crate::error::ValidationError;

static DATA_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^data:(?P<mime>[\w.+-]+/[\w.+-]+)(?:;[\w.+-]+=[^;,]*)*;base64,(?P<data>.*)$")
        .expect("data URI pattern is valid")
});

/// Binary image payload with its MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct InlineImage {
    mime_type: String,
    data: Vec<u8>,
}

impl InlineImage {
    /// Wrap raw bytes. Only `image/*` types are accepted.
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Result<Self, ValidationError> {
        let mime_type = mime_type.into().to_ascii_lowercase();
        if !mime_type.starts_with("image/") {
            return Err(ValidationError::UnsupportedImage(format!(
                "expected an image/* type, got {mime_type}"
            )));
        }
        if data.is_empty() {
            return Err(ValidationError::UnsupportedImage("image is empty".to_string()));
        }
        Ok(Self { mime_type, data })
    }

    /// Parse a `data:` URI carrying a base64 payload.
    pub fn from_data_uri(uri: &str) -> Result<Self, ValidationError> {
        let caps = DATA_URI.captures(uri.trim()).ok_or_else(|| {
            ValidationError::InvalidDataUri("expected data:<mime>;base64,<payload>".to_string())
        })?;

        let payload: String = caps["data"].chars().filter(|c| !c.is_whitespace()).collect();
        let data = BASE64_STANDARD
            .decode(payload.as_bytes())
            .map_err(|e| ValidationError::InvalidDataUri(format!("bad base64 payload: {e}")))?;

        Self::new(&caps["mime"], data)
    }

    /// Read an image file, sniffing its type from the leading bytes.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let mime_type = sniff_mime(&data).ok_or_else(|| {
            ValidationError::UnsupportedImage(format!(
                "{} is not a PNG, JPEG, GIF or WebP file",
                path.display()
            ))
        })?;
        tracing::debug!(path = %path.display(), mime_type, bytes = data.len(), "Captured image");
        Self::new(mime_type, data)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Re-encode as a `data:` URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64_STANDARD.encode(&self.data))
    }
}

impl std::fmt::Debug for InlineImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineImage")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}
