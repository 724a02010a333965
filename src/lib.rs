pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;

// Export API types
pub use api::routes;

pub use error::{DraftError, DraftResult};

// Export protocol types
pub use logic::{
    AbandonOutcome, AssetRegistry, CleanupCoordinator, CleanupReport, CleanupTrigger,
    EditingSession, EditingSurface, FormSaver, FormState, NavigationGuard, ReservationService,
    SavingForm, SessionManager, TabHost,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{ContentStore, InMemoryStore, PostgresStore};

use crate::config::{AppConfig, StorageBackend};
use std::sync::Arc;

/// Build the application router on the configured storage backend
pub async fn build_app(config: &AppConfig) -> anyhow::Result<axum::Router> {
    match config.storage.backend {
        StorageBackend::Memory => {
            log::warn!("Using in-memory storage; drafts and assets are lost on restart");
            let store = Arc::new(InMemoryStore::with_base_url(&config.storage.public_base_url));
            let manager = Arc::new(SessionManager::new(store));
            Ok(api::routes::create_router::<InMemoryStore>().with_state(manager))
        }
        StorageBackend::Postgres => {
            let database_url = config.database_url()?;
            let postgres_store = PostgresStore::new(
                &database_url,
                config.max_connections(),
                &config.storage.public_base_url,
            )
            .await?;

            // Run migrations
            postgres_store.migrate().await?;

            let manager = Arc::new(SessionManager::new(Arc::new(postgres_store)));
            Ok(api::routes::create_router::<PostgresStore>().with_state(manager))
        }
    }
}
