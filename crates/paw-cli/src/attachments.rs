//! Multimodal attachment staging
//!
//! When `read_file` loads a recognized media file, the bytes are inline
//! encoded and queued here instead of being returned to the model. The agent
//! loop drains the queue once per step into a follow-up user message.

use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use llm_api::InlineData;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

/// Kind of attachment a file stages as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Document,
}

/// Map a path's suffix to its media type, if recognized
fn media_type_for(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// Classify a path by its suffix. `None` means plain text.
pub fn media_kind_for(path: &Path) -> Option<AttachmentKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(AttachmentKind::Image)
    } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
        Some(AttachmentKind::Document)
    } else {
        None
    }
}

/// Session-scoped queues of encoded attachments awaiting delivery
#[derive(Debug, Default)]
pub struct AttachmentStager {
    images: Vec<InlineData>,
    documents: Vec<InlineData>,
}

impl AttachmentStager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a file and queue it for the next user message. Returns a short
    /// confirmation string so the model gets an acknowledgment instead of
    /// the payload itself.
    ///
    /// The caller must have already classified the file; a suffix that does
    /// not match `kind` is a contract violation and fails.
    pub fn stage(&mut self, path: &Path, kind: AttachmentKind) -> Result<String> {
        match media_kind_for(path) {
            Some(actual) if actual == kind => {}
            _ => bail!("unsupported media kind for {}", path.display()),
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        let media_type = media_type_for(&ext)
            .with_context(|| format!("No media type for {}", path.display()))?;

        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let payload = InlineData {
            media_type: media_type.to_string(),
            data: STANDARD.encode(bytes),
        };

        match kind {
            AttachmentKind::Image => {
                self.images.push(payload);
                Ok(format!("Image loaded: {}", path.display()))
            }
            AttachmentKind::Document => {
                self.documents.push(payload);
                Ok(format!("Document loaded: {}", path.display()))
            }
        }
    }

    /// Take current queue contents, leaving both queues empty.
    /// Safe to call when empty.
    pub fn drain(&mut self) -> (Vec<InlineData>, Vec<InlineData>) {
        (
            std::mem::take(&mut self.images),
            std::mem::take(&mut self.documents),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.documents.is_empty()
    }
}
