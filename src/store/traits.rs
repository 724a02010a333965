use crate::model::{AssetUpload, ContentRecord, Identifier};
use anyhow::Result;

/// Raised by `create_with_reserved_id` when a record already holds the identifier
#[derive(Debug, thiserror::Error)]
#[error("record {category}/{id} already exists")]
pub struct RecordConflict {
    pub category: String,
    pub id: Identifier,
}

/// Identifier counters per content category
#[async_trait::async_trait]
pub trait ReservationStore: Send + Sync {
    /// Reserve `max(existing) + 1` for the category
    async fn reserve_next_id(&self, category: &str) -> Result<Identifier>;
    /// Drop a live reservation. Returns false when it was already gone or committed
    async fn release_reserved_id(&self, category: &str, id: Identifier) -> Result<bool>;
}

/// Content records keyed by (category, identifier)
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Write the record and retire its reservation in one step.
    /// Fails with [`RecordConflict`] when the identifier is already committed
    async fn create_with_reserved_id(
        &self,
        category: &str,
        id: Identifier,
        content: serde_json::Value,
        created_by: &str,
    ) -> Result<ContentRecord>;
    async fn get_record(&self, category: &str, id: Identifier) -> Result<Option<ContentRecord>>;
}

/// Binary object storage
#[async_trait::async_trait]
pub trait AssetStore: Send + Sync {
    /// Store the upload under `folder` and return its public URL
    async fn upload_asset(&self, upload: AssetUpload, folder: &str) -> Result<String>;
    /// Returns false when nothing was stored under the URL
    async fn delete_asset(&self, url: &str) -> Result<bool>;
}

pub trait ContentStore: ReservationStore + RecordStore + AssetStore + Send + Sync {}
impl<T: ReservationStore + RecordStore + AssetStore + Send + Sync> ContentStore for T {}
