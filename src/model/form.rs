use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last-saved serialized value of a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSnapshot {
    pub value: serde_json::Value,
    pub saved_at: DateTime<Utc>,
}

impl FormSnapshot {
    pub fn new(value: serde_json::Value) -> Self {
        Self {
            value,
            saved_at: Utc::now(),
        }
    }
}

/// A navigation request held back because the active form has unsaved changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationIntent {
    pub target: String,
    /// A save-then-go for this intent is in flight
    pub saving: bool,
    pub requested_at: DateTime<Utc>,
}

impl NavigationIntent {
    pub fn new(target: String) -> Self {
        Self {
            target,
            saving: false,
            requested_at: Utc::now(),
        }
    }
}

/// The user's answer to the unsaved-changes dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationDecision {
    SaveThenGo,
    DiscardThenGo,
    Cancel,
}

/// What the host should do after a navigation request or resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    /// Navigate to `target` now
    Proceed { target: String },
    /// Show the save/discard/cancel dialog for this intent
    Blocked { intent: NavigationIntent },
    /// Remain on the current surface
    Stay,
}

impl NavigationOutcome {
    pub fn is_proceed(&self) -> bool {
        matches!(self, NavigationOutcome::Proceed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_decision_wire_names() {
        let decision: NavigationDecision = serde_json::from_str("\"discard_then_go\"").unwrap();
        assert_eq!(decision, NavigationDecision::DiscardThenGo);
        assert!(serde_json::from_str::<NavigationDecision>("\"later\"").is_err());
    }

    #[test]
    fn test_navigation_outcome_tagging() {
        let outcome = NavigationOutcome::Proceed {
            target: "/team".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "proceed");
        assert_eq!(json["target"], "/team");
    }
}
