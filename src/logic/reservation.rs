use log::{debug, info, warn};
use std::sync::Arc;

use crate::error::{DraftError, DraftResult};
use crate::model::{normalize_category, Reservation};
use crate::store::traits::ReservationStore;

/// Hands out identifiers ahead of content and gives them back on cleanup
pub struct ReservationService<S> {
    store: Arc<S>,
}

impl<S> Clone for ReservationService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ReservationStore> ReservationService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Reserve the next identifier for `category`.
    ///
    /// Allocation is optimistic: two editors reserving in the same category at
    /// the same moment can race, which shows up later as a commit conflict.
    pub async fn reserve(&self, category: &str) -> DraftResult<Reservation> {
        let Some(category) = normalize_category(category) else {
            return Err(DraftError::Allocation {
                category: category.to_string(),
                message: "category must not be empty".to_string(),
            });
        };

        let id = self.store.reserve_next_id(&category).await.map_err(|e| {
            warn!("Identifier reservation for '{}' failed: {:#}", category, e);
            DraftError::allocation(&category, &e)
        })?;

        info!("Reserved identifier {}/{}", category, id);
        Ok(Reservation::new(category, id))
    }

    /// Give a reservation back. Releasing one that is already gone or
    /// committed is a no-op, not an error.
    pub async fn release(&self, reservation: &mut Reservation) -> anyhow::Result<()> {
        if !reservation.is_reserved() {
            debug!(
                "Skipping release of {}/{}: reservation is {}",
                reservation.category, reservation.id, reservation.state
            );
            return Ok(());
        }

        let removed = self
            .store
            .release_reserved_id(&reservation.category, reservation.id)
            .await?;
        if !removed {
            debug!(
                "Reservation {}/{} was already gone",
                reservation.category, reservation.id
            );
        }

        reservation.mark_released();
        info!("Released identifier {}/{}", reservation.category, reservation.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReservationState;
    use crate::store::memory::InMemoryStore;
    use crate::store::traits::RecordStore;

    #[tokio::test]
    async fn test_reserve_normalizes_category() {
        let store = Arc::new(InMemoryStore::new());
        let service = ReservationService::new(Arc::clone(&store));

        let reservation = service.reserve("  News ").await.unwrap();
        assert_eq!(reservation.category, "news");
        assert_eq!(reservation.id, 1);
        assert!(store.is_reserved("news", 1));
    }

    #[tokio::test]
    async fn test_reserve_rejects_empty_category() {
        let service = ReservationService::new(Arc::new(InMemoryStore::new()));
        let err = service.reserve("   ").await.unwrap_err();
        assert!(matches!(err, DraftError::Allocation { .. }));
    }

    #[tokio::test]
    async fn test_release_twice_is_noop() {
        let store = Arc::new(InMemoryStore::new());
        let service = ReservationService::new(Arc::clone(&store));

        let mut reservation = service.reserve("news").await.unwrap();
        service.release(&mut reservation).await.unwrap();
        assert_eq!(reservation.state, ReservationState::Released);
        assert!(!store.is_reserved("news", reservation.id));

        service.release(&mut reservation).await.unwrap();
        assert_eq!(reservation.state, ReservationState::Released);
    }

    #[tokio::test]
    async fn test_release_never_touches_committed_record() {
        let store = Arc::new(InMemoryStore::new());
        let service = ReservationService::new(Arc::clone(&store));

        let mut reservation = service.reserve("news").await.unwrap();
        store
            .create_with_reserved_id("news", reservation.id, serde_json::json!({}), "test")
            .await
            .unwrap();
        reservation.mark_committed();

        service.release(&mut reservation).await.unwrap();
        assert_eq!(reservation.state, ReservationState::Committed);
        assert!(store.get_record("news", reservation.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sequential_reservations_after_commit_differ() {
        let store = Arc::new(InMemoryStore::new());
        let service = ReservationService::new(Arc::clone(&store));

        let first = service.reserve("news").await.unwrap();
        store
            .create_with_reserved_id("news", first.id, serde_json::json!({}), "test")
            .await
            .unwrap();
        let second = service.reserve("news").await.unwrap();

        assert_ne!(first.id, second.id);
    }
}
