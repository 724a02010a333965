use serde::{Deserialize, Serialize};

/// Editor identity extracted from request headers, recorded as record author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorContext {
    pub editor_id: String,
    pub editor_email: Option<String>,
    pub editor_name: Option<String>,
}

impl EditorContext {
    /// Create a new EditorContext with just an editor ID
    pub fn new(editor_id: String) -> Self {
        Self {
            editor_id,
            editor_email: None,
            editor_name: None,
        }
    }

    /// Create an EditorContext with full editor information
    pub fn with_details(editor_id: String, email: Option<String>, name: Option<String>) -> Self {
        Self {
            editor_id,
            editor_email: email,
            editor_name: name,
        }
    }

    /// Create a default editor context for development/testing
    pub fn default_editor() -> Self {
        Self {
            editor_id: "dev-editor".to_string(),
            editor_email: Some("dev@localhost".to_string()),
            editor_name: Some("Development Editor".to_string()),
        }
    }

    /// Name written into `created_by` of committed records
    pub fn display_name(&self) -> &str {
        self.editor_name.as_deref().unwrap_or(&self.editor_id)
    }
}

impl Default for EditorContext {
    fn default() -> Self {
        Self::default_editor()
    }
}
