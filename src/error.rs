use crate::model::{Identifier, SessionPhase};

/// Errors raised by the draft lifecycle protocol
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    /// Reading or writing the category counter failed; creation is blocked
    #[error("failed to reserve an identifier for '{category}': {message}")]
    Allocation { category: String, message: String },

    /// An upload failed; previously tracked assets are unaffected
    #[error("failed to upload '{file_name}': {message}")]
    Upload { file_name: String, message: String },

    /// The client sent an upload without any bytes
    #[error("upload '{file_name}' is empty")]
    EmptyUpload { file_name: String },

    /// Best-effort cleanup failed; only ever logged
    #[error("cleanup of {resource} failed: {message}")]
    Cleanup { resource: String, message: String },

    /// Saving the record failed; any pending navigation stays open
    #[error("failed to save: {message}")]
    Save { message: String },

    #[error("a navigation to '{target}' is already waiting for a decision")]
    NavigationPending { target: String },

    #[error("no navigation is waiting for a decision")]
    NoPendingNavigation,

    /// A save-then-go for `target` has not returned yet
    #[error("the save before navigating to '{target}' is still running")]
    SaveInProgress { target: String },

    #[error("cannot {operation} while session is {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: SessionPhase,
    },

    #[error("session '{0}' not found")]
    SessionNotFound(String),

    #[error("unknown tab '{0}'")]
    UnknownTab(String),

    #[error("identifier {category}/{id} is already committed")]
    AlreadyCommitted { category: String, id: Identifier },
}

impl DraftError {
    pub fn allocation(category: &str, err: &anyhow::Error) -> Self {
        DraftError::Allocation {
            category: category.to_string(),
            message: format!("{:#}", err),
        }
    }

    pub fn upload(file_name: &str, err: &anyhow::Error) -> Self {
        DraftError::Upload {
            file_name: file_name.to_string(),
            message: format!("{:#}", err),
        }
    }

    pub fn cleanup(resource: impl Into<String>, err: &anyhow::Error) -> Self {
        DraftError::Cleanup {
            resource: resource.into(),
            message: format!("{:#}", err),
        }
    }

    pub fn save(err: &anyhow::Error) -> Self {
        DraftError::Save {
            message: format!("{:#}", err),
        }
    }
}

pub type DraftResult<T> = std::result::Result<T, DraftError>;
