use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetState {
    /// Uploaded but not referenced by any committed record
    Pending,
    /// Referenced by the session's committed record
    Committed,
}

/// An asset uploaded during an editing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedAsset {
    pub url: String,
    pub session_id: SessionId,
    pub state: AssetState,
    pub tracked_at: DateTime<Utc>,
}

impl TrackedAsset {
    pub fn pending(session_id: SessionId, url: String) -> Self {
        Self {
            url,
            session_id,
            state: AssetState::Pending,
            tracked_at: Utc::now(),
        }
    }

    pub fn into_committed(self) -> Self {
        Self {
            state: AssetState::Committed,
            ..self
        }
    }
}

/// Binary upload handed to object storage
#[derive(Debug, Clone, PartialEq)]
pub struct AssetUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl AssetUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// File name reduced to characters that are safe inside an object key
    pub fn sanitized_file_name(&self) -> String {
        let cleaned: String = self
            .file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if cleaned.is_empty() {
            "upload.bin".to_string()
        } else {
            cleaned
        }
    }
}
