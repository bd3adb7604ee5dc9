//! Transcript Formatting
//!
//! Renders a thread message's raw text into a human readable form. Inline
//! annotation spans are replaced with positional ` [i]` tags and resolved
//! footnotes are appended after the text: a quoted excerpt with its source
//! filename for citations, or a download note for file-path annotations
//! (which also saves the referenced file locally).
//!
//! Formatting never mutates the message it is given; it returns a new
//! string so the underlying transcript mirror can be shared freely.

use crate::convoke::backend::{AnnotationKind, AssistantBackend, BackendError, ThreadMessage};
use std::path::PathBuf;
use std::sync::Arc;

/// Resolves annotations against the backend's file store.
pub struct TranscriptFormatter {
    backend: Arc<dyn AssistantBackend>,
    download_dir: PathBuf,
}

impl TranscriptFormatter {
    /// Create a formatter that saves file-path annotations under
    /// `download_dir`.
    pub fn new(backend: Arc<dyn AssistantBackend>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            download_dir: download_dir.into(),
        }
    }

    /// Render one message: annotation spans become ` [i]` tags, footnotes
    /// follow the text newline-separated in annotation order.
    pub async fn format(&self, message: &ThreadMessage) -> Result<String, BackendError> {
        let mut text = message.text.clone();
        let mut footnotes = Vec::with_capacity(message.annotations.len());
        for (index, annotation) in message.annotations.iter().enumerate() {
            text = text.replace(&annotation.text, &format!(" [{}]", index));
            match &annotation.kind {
                AnnotationKind::FileCitation { quote, file_id } => {
                    let cited = self.backend.retrieve_file(file_id).await?;
                    footnotes.push(format!("[{}] {} from {}", index, quote, cited.filename));
                }
                AnnotationKind::FilePath { file_id } => {
                    let cited = self.backend.retrieve_file(file_id).await?;
                    self.save_file(&cited.filename, file_id).await?;
                    footnotes.push(format!(
                        "[{}] download {} with id {}",
                        index, cited.filename, cited.id
                    ));
                }
            }
        }
        if footnotes.is_empty() {
            return Ok(text);
        }
        Ok(format!("{}\n{}", text, footnotes.join("\n")))
    }

    async fn save_file(&self, filename: &str, file_id: &str) -> Result<(), BackendError> {
        let bytes = self.backend.download_file(file_id).await?;
        tokio::fs::create_dir_all(&self.download_dir).await?;
        let target = self.download_dir.join(filename);
        log::info!("saving referenced file {} to {}", file_id, target.display());
        tokio::fs::write(target, bytes).await?;
        Ok(())
    }

    /// Directory file-path annotations are saved into.
    pub fn download_dir(&self) -> &PathBuf {
        &self.download_dir
    }
}
