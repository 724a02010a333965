use serde::{Deserialize, Serialize};

use crate::model::{Identifier, Reservation, SessionId};

/// Lifecycle of one content-creation editing session
///
/// `Idle -> Reserving -> Active -> {Committing -> Done} | {Abandoning -> Cleaned | PartiallyCleaned}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Reserving,
    Active,
    Committing,
    Done,
    Abandoning,
    Cleaned,
    PartiallyCleaned,
}

impl SessionPhase {
    /// No further work happens without a user trigger
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionPhase::Done | SessionPhase::Cleaned | SessionPhase::PartiallyCleaned
        )
    }

    /// Cleanup left orphans that another exit trigger may reclaim
    pub fn can_retry_cleanup(&self) -> bool {
        matches!(self, SessionPhase::PartiallyCleaned)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Reserving => "reserving",
            SessionPhase::Active => "active",
            SessionPhase::Committing => "committing",
            SessionPhase::Done => "done",
            SessionPhase::Abandoning => "abandoning",
            SessionPhase::Cleaned => "cleaned",
            SessionPhase::PartiallyCleaned => "partially_cleaned",
        };
        write!(f, "{}", name)
    }
}

/// Read-only view of a session for the editing surface
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub category: String,
    pub phase: SessionPhase,
    pub reserved_id: Option<Identifier>,
    pub reservation: Option<Reservation>,
    pub pending_assets: Vec<String>,
    pub has_unsaved_changes: bool,
    pub can_submit: bool,
}
