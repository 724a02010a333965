use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Identifier;

/// A content record written with a reserved identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub category: String,
    pub id: Identifier,
    pub content: serde_json::Value,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}
