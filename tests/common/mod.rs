#![allow(dead_code)]

use anyhow::{anyhow, Result};
use draft_lifecycle::model::{AssetUpload, ContentRecord, Identifier};
use draft_lifecycle::store::{AssetStore, InMemoryStore, RecordStore, ReservationStore};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// One call made against the collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Reserve(String),
    Release(String, Identifier),
    Create(String, Identifier),
    Upload(String),
    Delete(String),
}

/// Wraps the in-memory store, records every call and injects failures
#[derive(Default)]
pub struct RecordingStore {
    pub inner: InMemoryStore,
    calls: Mutex<Vec<Call>>,
    pub fail_reserve: AtomicBool,
    pub fail_release: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_upload: AtomicBool,
    failing_deletes: Mutex<HashSet<String>>,
    /// When set, reserve/create park until the matching release gate is notified
    pub hold_reserve: AtomicBool,
    pub hold_create: AtomicBool,
    pub reserve_entered: Notify,
    pub reserve_gate: Notify,
    pub create_entered: Notify,
    pub create_gate: Notify,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn releases(&self) -> Vec<(String, Identifier)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Release(category, id) => Some((category, id)),
                _ => None,
            })
            .collect()
    }

    pub fn fail_delete_of(&self, url: &str) {
        self.failing_deletes.lock().insert(url.to_string());
    }

    pub fn heal_deletes(&self) {
        self.failing_deletes.lock().clear();
    }

    /// Make the next reservation in `category` come out as `next`
    pub async fn seed_records(&self, category: &str, up_to: Identifier) {
        for id in 1..=up_to {
            self.inner
                .create_with_reserved_id(category, id, serde_json::json!({"seed": id}), "seed")
                .await
                .unwrap();
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

#[async_trait::async_trait]
impl ReservationStore for RecordingStore {
    async fn reserve_next_id(&self, category: &str) -> Result<Identifier> {
        self.record(Call::Reserve(category.to_string()));
        if self.hold_reserve.load(Ordering::SeqCst) {
            self.reserve_entered.notify_one();
            self.reserve_gate.notified().await;
        }
        if self.fail_reserve.load(Ordering::SeqCst) {
            return Err(anyhow!("counter read failed: connection reset"));
        }
        self.inner.reserve_next_id(category).await
    }

    async fn release_reserved_id(&self, category: &str, id: Identifier) -> Result<bool> {
        self.record(Call::Release(category.to_string(), id));
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(anyhow!("counter write failed"));
        }
        self.inner.release_reserved_id(category, id).await
    }
}

#[async_trait::async_trait]
impl RecordStore for RecordingStore {
    async fn create_with_reserved_id(
        &self,
        category: &str,
        id: Identifier,
        content: serde_json::Value,
        created_by: &str,
    ) -> Result<ContentRecord> {
        self.record(Call::Create(category.to_string(), id));
        if self.hold_create.load(Ordering::SeqCst) {
            self.create_entered.notify_one();
            self.create_gate.notified().await;
        }
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(anyhow!("document store write timed out"));
        }
        self.inner
            .create_with_reserved_id(category, id, content, created_by)
            .await
    }

    async fn get_record(&self, category: &str, id: Identifier) -> Result<Option<ContentRecord>> {
        self.inner.get_record(category, id).await
    }
}

#[async_trait::async_trait]
impl AssetStore for RecordingStore {
    async fn upload_asset(&self, upload: AssetUpload, folder: &str) -> Result<String> {
        self.record(Call::Upload(folder.to_string()));
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(anyhow!("object storage quota exceeded"));
        }
        self.inner.upload_asset(upload, folder).await
    }

    async fn delete_asset(&self, url: &str) -> Result<bool> {
        self.record(Call::Delete(url.to_string()));
        if self.failing_deletes.lock().contains(url) {
            return Err(anyhow!("object storage unavailable"));
        }
        self.inner.delete_asset(url).await
    }
}

pub fn image(name: &str) -> AssetUpload {
    AssetUpload::new(name, "image/jpeg", vec![0xff, 0xd8, 0xff, 0xe0])
}
