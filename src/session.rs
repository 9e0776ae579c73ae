use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::types::Transcript;

/// Keeps a conversation's transcript between process runs. The agent itself
/// never touches this; the caller decides when to save and load.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn save(&self, conversation: &str, transcript: &Transcript) -> Result<(), AgentError>;

    async fn load(&self, conversation: &str) -> Result<Option<Transcript>, AgentError>;

    async fn clear(&self, conversation: &str) -> Result<(), AgentError>;
}

/// A transcript as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTranscript {
    pub conversation: String,
    pub transcript: Transcript,
    pub saved_at: chrono::DateTime<chrono::Utc>,
}

// --- NoTranscriptStore ---

/// No persistence. Fire-and-forget.
pub struct NoTranscriptStore;

#[async_trait]
impl TranscriptStore for NoTranscriptStore {
    async fn save(&self, _: &str, _: &Transcript) -> Result<(), AgentError> {
        Ok(())
    }

    async fn load(&self, _: &str) -> Result<Option<Transcript>, AgentError> {
        Ok(None)
    }

    async fn clear(&self, _: &str) -> Result<(), AgentError> {
        Ok(())
    }
}

// --- FileTranscriptStore ---

/// Saves transcripts to disk as JSON, one file per conversation.
pub struct FileTranscriptStore {
    dir: PathBuf,
}

impl FileTranscriptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File for a conversation. Names must stay inside the store directory.
    fn path(&self, conversation: &str) -> Result<PathBuf, AgentError> {
        if conversation.is_empty()
            || conversation == "."
            || conversation.contains("..")
            || conversation.contains(['/', '\\'])
        {
            return Err(AgentError::Session(format!(
                "invalid conversation name: {conversation:?}"
            )));
        }
        Ok(self.dir.join(format!("{conversation}.json")))
    }
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    async fn save(&self, conversation: &str, transcript: &Transcript) -> Result<(), AgentError> {
        let path = self.path(conversation)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AgentError::Session(e.to_string()))?;
        let saved = SavedTranscript {
            conversation: conversation.to_string(),
            transcript: transcript.clone(),
            saved_at: chrono::Utc::now(),
        };
        let json = serde_json::to_string_pretty(&saved)
            .map_err(|e| AgentError::Session(e.to_string()))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| AgentError::Session(e.to_string()))?;
        Ok(())
    }

    async fn load(&self, conversation: &str) -> Result<Option<Transcript>, AgentError> {
        match tokio::fs::read_to_string(self.path(conversation)?).await {
            Ok(json) => {
                let saved: SavedTranscript = serde_json::from_str(&json)
                    .map_err(|e| AgentError::Session(e.to_string()))?;
                Ok(Some(saved.transcript))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AgentError::Session(e.to_string())),
        }
    }

    async fn clear(&self, conversation: &str) -> Result<(), AgentError> {
        match tokio::fs::remove_file(self.path(conversation)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AgentError::Session(e.to_string())),
        }
    }
}
