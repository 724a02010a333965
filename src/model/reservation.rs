use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationState {
    /// Identifier is held for a record that does not exist yet
    Reserved,
    /// A record was written with this identifier
    Committed,
    /// Cleanup gave the identifier back
    Released,
}

impl std::fmt::Display for ReservationState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ReservationState::Reserved => write!(f, "reserved"),
            ReservationState::Committed => write!(f, "committed"),
            ReservationState::Released => write!(f, "released"),
        }
    }
}

/// A pre-allocated identifier for a content record that does not exist yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub category: String,
    pub id: Identifier,
    pub reserved_at: DateTime<Utc>,
    pub state: ReservationState,
}

impl Reservation {
    pub fn new(category: String, id: Identifier) -> Self {
        Self {
            category,
            id,
            reserved_at: Utc::now(),
            state: ReservationState::Reserved,
        }
    }

    pub fn is_reserved(&self) -> bool {
        self.state == ReservationState::Reserved
    }

    pub fn mark_committed(&mut self) {
        self.state = ReservationState::Committed;
    }

    /// Releasing never downgrades a committed reservation
    pub fn mark_released(&mut self) {
        if self.state == ReservationState::Reserved {
            self.state = ReservationState::Released;
        }
    }
}
