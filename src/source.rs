//! Where raw messages come from

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::{MuteError, Result};

/// A raw RFC822 message plus the name it was fetched under
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Supplies raw messages to the pipeline
///
/// Kept behind a trait so the pipeline can be driven from a maildir today
/// and an IMAP or API client later without touching the analysis code.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch up to `limit` messages, in a stable order
    async fn fetch_messages(&self, limit: usize) -> Result<Vec<RawMessage>>;
}

/// Reads `.eml` files from a directory, sorted by file name
pub struct EmlDirSource {
    dir: PathBuf,
}

impl EmlDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl MessageSource for EmlDirSource {
    async fn fetch_messages(&self, limit: usize) -> Result<Vec<RawMessage>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            MuteError::SourceError(format!(
                "Cannot read mail directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MuteError::SourceError(e.to_string()))?
        {
            let path = entry.path();
            let is_eml = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("eml"))
                .unwrap_or(false);
            if is_eml {
                paths.push(path);
            }
        }

        // File-name order keeps runs over the same directory deterministic
        paths.sort();
        paths.truncate(limit);

        let mut messages = Vec::with_capacity(paths.len());
        for path in paths {
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    messages.push(RawMessage { name, bytes });
                }
                Err(e) => {
                    // One unreadable file must not sink the batch
                    warn!("Skipping unreadable message {}: {}", path.display(), e);
                }
            }
        }

        debug!(
            "Fetched {} messages from {}",
            messages.len(),
            self.dir.display()
        );
        Ok(messages)
    }
}
