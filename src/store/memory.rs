use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use crate::model::{generate_id, AssetUpload, ContentRecord, Identifier};
use crate::store::traits::{AssetStore, RecordConflict, RecordStore, ReservationStore};

#[derive(Debug, Default)]
struct MemoryState {
    /// Records keyed by (category, id)
    records: BTreeMap<(String, Identifier), ContentRecord>,
    /// Live reservations keyed by (category, id)
    reservations: BTreeMap<(String, Identifier), DateTime<Utc>>,
    /// Objects keyed by public URL
    assets: HashMap<String, AssetUpload>,
}

/// In-process content and asset store, used for development and tests
#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
    public_base_url: String,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_base_url("memory://assets")
    }

    pub fn with_base_url(public_base_url: &str) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn has_asset(&self, url: &str) -> bool {
        self.state.read().assets.contains_key(url)
    }

    pub fn asset_count(&self) -> usize {
        self.state.read().assets.len()
    }

    pub fn is_reserved(&self, category: &str, id: Identifier) -> bool {
        self.state
            .read()
            .reservations
            .contains_key(&(category.to_string(), id))
    }

    pub fn live_reservations(&self, category: &str) -> Vec<Identifier> {
        self.state
            .read()
            .reservations
            .keys()
            .filter(|(c, _)| c == category)
            .map(|(_, id)| *id)
            .collect()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ReservationStore for InMemoryStore {
    async fn reserve_next_id(&self, category: &str) -> Result<Identifier> {
        let mut state = self.state.write();

        let max_record = state
            .records
            .keys()
            .filter(|(c, _)| c == category)
            .map(|(_, id)| *id)
            .max();
        let max_reserved = state
            .reservations
            .keys()
            .filter(|(c, _)| c == category)
            .map(|(_, id)| *id)
            .max();

        let next = max_record.max(max_reserved).unwrap_or(0) + 1;
        state
            .reservations
            .insert((category.to_string(), next), Utc::now());
        Ok(next)
    }

    async fn release_reserved_id(&self, category: &str, id: Identifier) -> Result<bool> {
        let mut state = self.state.write();
        Ok(state
            .reservations
            .remove(&(category.to_string(), id))
            .is_some())
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryStore {
    async fn create_with_reserved_id(
        &self,
        category: &str,
        id: Identifier,
        content: serde_json::Value,
        created_by: &str,
    ) -> Result<ContentRecord> {
        let mut state = self.state.write();
        let key = (category.to_string(), id);

        if state.records.contains_key(&key) {
            return Err(RecordConflict {
                category: category.to_string(),
                id,
            }
            .into());
        }

        let record = ContentRecord {
            category: category.to_string(),
            id,
            content,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        state.reservations.remove(&key);
        state.records.insert(key, record.clone());
        Ok(record)
    }

    async fn get_record(&self, category: &str, id: Identifier) -> Result<Option<ContentRecord>> {
        Ok(self
            .state
            .read()
            .records
            .get(&(category.to_string(), id))
            .cloned())
    }
}

#[async_trait::async_trait]
impl AssetStore for InMemoryStore {
    async fn upload_asset(&self, upload: AssetUpload, folder: &str) -> Result<String> {
        if upload.bytes.is_empty() {
            return Err(anyhow!("Refusing to store empty upload '{}'", upload.file_name));
        }

        let url = format!(
            "{}/{}/{}-{}",
            self.public_base_url,
            folder.trim_matches('/'),
            generate_id(),
            upload.sanitized_file_name()
        );

        self.state.write().assets.insert(url.clone(), upload);
        Ok(url)
    }

    async fn delete_asset(&self, url: &str) -> Result<bool> {
        Ok(self.state.write().assets.remove(url).is_some())
    }
}
