use std::collections::HashMap;

use crate::model::{SessionId, TrackedAsset};

/// Pending uploads per editing session.
///
/// Entries leave the map once resolved (committed or discarded), so an empty
/// registry means no session has work outstanding.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    pending: HashMap<SessionId, Vec<TrackedAsset>>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an upload as pending. Returns false for a URL already tracked
    pub fn track(&mut self, session_id: &SessionId, url: &str) -> bool {
        let assets = self.pending.entry(session_id.clone()).or_default();
        if assets.iter().any(|asset| asset.url == url) {
            return false;
        }
        assets.push(TrackedAsset::pending(session_id.clone(), url.to_string()));
        true
    }

    /// Move every pending asset of the session out of reach of cleanup.
    /// Only call this once the parent record's write has been confirmed.
    pub fn commit_all(&mut self, session_id: &SessionId) -> Vec<TrackedAsset> {
        self.pending
            .remove(session_id)
            .unwrap_or_default()
            .into_iter()
            .map(TrackedAsset::into_committed)
            .collect()
    }

    pub fn list_pending(&self, session_id: &SessionId) -> Vec<String> {
        self.pending
            .get(session_id)
            .map(|assets| assets.iter().map(|asset| asset.url.clone()).collect())
            .unwrap_or_default()
    }

    /// Forget the session's pending set without touching remote storage
    pub fn discard(&mut self, session_id: &SessionId) -> usize {
        self.pending
            .remove(session_id)
            .map(|assets| assets.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AssetState;

    fn session() -> SessionId {
        "session-1".to_string()
    }

    #[test]
    fn test_track_is_idempotent() {
        let mut registry = AssetRegistry::new();
        assert!(registry.track(&session(), "https://cdn/a.png"));
        assert!(!registry.track(&session(), "https://cdn/a.png"));
        assert!(registry.track(&session(), "https://cdn/b.png"));

        assert_eq!(
            registry.list_pending(&session()),
            vec!["https://cdn/a.png".to_string(), "https://cdn/b.png".to_string()]
        );
    }

    #[test]
    fn test_commit_all_empties_pending() {
        let mut registry = AssetRegistry::new();
        registry.track(&session(), "https://cdn/a.png");
        registry.track(&session(), "https://cdn/b.png");

        let committed = registry.commit_all(&session());
        assert_eq!(committed.len(), 2);
        assert!(committed.iter().all(|asset| asset.state == AssetState::Committed));

        assert!(registry.list_pending(&session()).is_empty());
        assert!(registry.is_empty());
        assert!(registry.commit_all(&session()).is_empty());
    }

    #[test]
    fn test_discard_clears_without_commit() {
        let mut registry = AssetRegistry::new();
        registry.track(&session(), "https://cdn/a.png");

        assert_eq!(registry.discard(&session()), 1);
        assert!(registry.is_empty());
        assert_eq!(registry.discard(&session()), 0);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut registry = AssetRegistry::new();
        let other = "session-2".to_string();
        registry.track(&session(), "https://cdn/a.png");
        registry.track(&other, "https://cdn/b.png");

        registry.commit_all(&session());
        assert_eq!(registry.list_pending(&other), vec!["https://cdn/b.png".to_string()]);
    }
}
