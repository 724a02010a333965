use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::DraftError;
use crate::logic::reservation::ReservationService;
use crate::model::{Reservation, SessionId};
use crate::store::traits::ContentStore;

/// Exit path that ended an editing session without a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupTrigger {
    /// Explicit cancel button, awaited
    Cancel,
    /// Browser unload, fired and forgotten
    Unload,
    /// Client-side back navigation, awaited
    BackNavigation,
}

impl CleanupTrigger {
    /// Whether the caller waits for the cleanup pass to finish
    pub fn is_awaited(&self) -> bool {
        !matches!(self, CleanupTrigger::Unload)
    }
}

impl std::fmt::Display for CleanupTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CleanupTrigger::Cancel => write!(f, "cancel"),
            CleanupTrigger::Unload => write!(f, "unload"),
            CleanupTrigger::BackNavigation => write!(f, "back_navigation"),
        }
    }
}

/// What a cleanup pass has to reclaim
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupPlan {
    pub session_id: SessionId,
    pub reservation: Option<Reservation>,
    pub pending_assets: Vec<String>,
}

/// Result of one cleanup pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupReport {
    pub session_id: SessionId,
    pub trigger: CleanupTrigger,
    pub deleted_assets: Vec<String>,
    pub failed_assets: Vec<String>,
    pub reservation: Option<Reservation>,
    pub reservation_released: bool,
}

impl CleanupReport {
    /// Everything in the plan was reclaimed
    pub fn is_complete(&self) -> bool {
        self.failed_assets.is_empty()
            && self
                .reservation
                .as_ref()
                .map_or(true, |r| !r.is_reserved())
    }
}

/// Best-effort reclamation of a session's reservation and pending assets
pub struct CleanupCoordinator<S> {
    store: Arc<S>,
    reservations: ReservationService<S>,
}

impl<S> Clone for CleanupCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            reservations: self.reservations.clone(),
        }
    }
}

impl<S: ContentStore + 'static> CleanupCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            reservations: ReservationService::new(Arc::clone(&store)),
            store,
        }
    }

    /// Delete every pending asset and release the reservation.
    ///
    /// Every resource is attempted even when an earlier one fails. Failures
    /// are logged and reported, never returned.
    pub async fn run(&self, trigger: CleanupTrigger, plan: CleanupPlan) -> CleanupReport {
        let CleanupPlan {
            session_id,
            reservation,
            pending_assets,
        } = plan;

        let mut deleted_assets = Vec::new();
        let mut failed_assets = Vec::new();

        for url in pending_assets {
            match self.store.delete_asset(&url).await {
                Ok(existed) => {
                    if !existed {
                        debug!("Asset {} was already gone", url);
                    }
                    deleted_assets.push(url);
                }
                Err(e) => {
                    warn!("{}", DraftError::cleanup(format!("asset {}", url), &e));
                    failed_assets.push(url);
                }
            }
        }

        let mut reservation_released = false;
        let reservation = match reservation {
            Some(mut reservation) => {
                let released = self.reservations.release(&mut reservation).await;
                match released {
                    Ok(()) => reservation_released = true,
                    Err(e) => warn!(
                        "{}",
                        DraftError::cleanup(
                            format!("reservation {}/{}", reservation.category, reservation.id),
                            &e
                        )
                    ),
                }
                Some(reservation)
            }
            None => None,
        };

        let report = CleanupReport {
            session_id,
            trigger,
            deleted_assets,
            failed_assets,
            reservation,
            reservation_released,
        };

        if report.is_complete() {
            info!(
                "Cleanup after {} for session {} finished: deleted [{}]",
                trigger,
                report.session_id,
                report.deleted_assets.iter().join(", ")
            );
        } else {
            warn!(
                "Cleanup after {} for session {} left orphans: assets [{}], reservation released: {}",
                trigger,
                report.session_id,
                report.failed_assets.iter().join(", "),
                report.reservation_released
            );
        }

        report
    }

    /// Start a cleanup pass without waiting for it.
    ///
    /// Used for unload: the host may tear the process down before the
    /// deletes land, so this can leave orphans. That gap is accepted.
    pub fn dispatch<F>(&self, trigger: CleanupTrigger, plan: CleanupPlan, on_done: F)
    where
        F: FnOnce(CleanupReport) + Send + 'static,
    {
        let coordinator = self.clone();
        // Handle dropped on purpose; nobody waits for this result
        let _ = tokio::spawn(async move {
            let report = coordinator.run(trigger, plan).await;
            on_done(report);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssetUpload, ReservationState};
    use crate::store::memory::InMemoryStore;
    use crate::store::traits::{AssetStore, ReservationStore};

    async fn seeded_plan(store: &InMemoryStore) -> CleanupPlan {
        let id = store.reserve_next_id("news").await.unwrap();
        let mut pending_assets = Vec::new();
        for name in ["a.png", "b.png"] {
            let url = store
                .upload_asset(AssetUpload::new(name, "image/png", vec![1]), "news/1")
                .await
                .unwrap();
            pending_assets.push(url);
        }

        CleanupPlan {
            session_id: "session-1".to_string(),
            reservation: Some(Reservation::new("news".to_string(), id)),
            pending_assets,
        }
    }

    #[tokio::test]
    async fn test_run_reclaims_assets_and_reservation() {
        let store = Arc::new(InMemoryStore::new());
        let plan = seeded_plan(&store).await;
        let coordinator = CleanupCoordinator::new(Arc::clone(&store));

        let report = coordinator.run(CleanupTrigger::Cancel, plan).await;

        assert!(report.is_complete());
        assert_eq!(report.deleted_assets.len(), 2);
        assert!(report.reservation_released);
        assert_eq!(
            report.reservation.as_ref().map(|r| r.state),
            Some(ReservationState::Released)
        );
        assert_eq!(store.asset_count(), 0);
        assert!(store.live_reservations("news").is_empty());
    }

    #[tokio::test]
    async fn test_run_tolerates_missing_assets() {
        let store = Arc::new(InMemoryStore::new());
        let coordinator = CleanupCoordinator::new(Arc::clone(&store));

        let plan = CleanupPlan {
            session_id: "session-1".to_string(),
            reservation: Some(Reservation::new("news".to_string(), 5)),
            pending_assets: vec!["memory://assets/gone.png".to_string()],
        };
        let report = coordinator.run(CleanupTrigger::BackNavigation, plan).await;

        assert!(report.is_complete());
        assert!(report.reservation_released);
    }

    #[tokio::test]
    async fn test_dispatch_reports_when_done() {
        let store = Arc::new(InMemoryStore::new());
        let plan = seeded_plan(&store).await;
        let coordinator = CleanupCoordinator::new(Arc::clone(&store));

        let (tx, rx) = tokio::sync::oneshot::channel();
        coordinator.dispatch(CleanupTrigger::Unload, plan, move |report| {
            let _ = tx.send(report);
        });

        let report = rx.await.unwrap();
        assert_eq!(report.trigger, CleanupTrigger::Unload);
        assert!(report.is_complete());
        assert_eq!(store.asset_count(), 0);
    }

    #[test]
    fn test_empty_plan() {
        let plan = CleanupPlan {
            session_id: "s".to_string(),
            reservation: None,
            pending_assets: vec![],
        };
        assert!(plan.is_empty());
        assert!(CleanupTrigger::Cancel.is_awaited());
        assert!(!CleanupTrigger::Unload.is_awaited());
    }
}
