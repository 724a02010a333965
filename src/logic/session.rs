use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DraftError, DraftResult};
use crate::logic::cleanup::{CleanupCoordinator, CleanupPlan, CleanupReport, CleanupTrigger};
use crate::logic::guard::{FormState, NavigationGuard};
use crate::logic::registry::AssetRegistry;
use crate::logic::reservation::ReservationService;
use crate::model::{
    draft_folder, generate_id, AssetUpload, ContentRecord, EditorContext, Identifier,
    NavigationDecision, NavigationIntent, NavigationOutcome, Reservation, SessionId,
    SessionPhase, SessionSummary,
};
use crate::store::traits::{ContentStore, RecordConflict};

/// What happened when an exit trigger fired
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AbandonOutcome {
    /// Cleanup ran to completion (possibly leaving orphans, see the report)
    Cleaned { report: CleanupReport },
    /// Cleanup was started in the background and not awaited
    Dispatched,
    /// A reservation or commit is in flight; cleanup runs only if it does not succeed
    Deferred,
    /// Nothing to do, the session already reached `phase`
    Skipped { phase: SessionPhase },
}

/// Protocol state guarded by one lock that is never held across an await
#[derive(Debug)]
struct SessionInner {
    phase: SessionPhase,
    reservation: Option<Reservation>,
    registry: AssetRegistry,
    deferred_cleanup: Option<CleanupTrigger>,
    last_report: Option<CleanupReport>,
}

/// Form value and its navigation guard; never held across a store call
#[derive(Debug)]
struct FormGate {
    form: FormState,
    guard: NavigationGuard,
}

/// One content-creation editing interaction, from mount to commit or abandonment
pub struct EditingSession<S> {
    id: SessionId,
    category: String,
    editor: EditorContext,
    store: Arc<S>,
    reservations: ReservationService<S>,
    cleanup: CleanupCoordinator<S>,
    inner: Arc<Mutex<SessionInner>>,
    form: tokio::sync::Mutex<FormGate>,
}

fn record_report(inner: &Mutex<SessionInner>, report: CleanupReport) {
    let mut inner = inner.lock();
    inner.phase = if report.is_complete() {
        SessionPhase::Cleaned
    } else {
        SessionPhase::PartiallyCleaned
    };
    if let Some(reservation) = &report.reservation {
        inner.reservation = Some(reservation.clone());
    }
    inner.last_report = Some(report);
}

impl<S: ContentStore + 'static> EditingSession<S> {
    /// A session in `Idle`; call [`EditingSession::begin`] to reserve its identifier
    pub fn new(store: Arc<S>, category: &str, editor: EditorContext, initial_form: Value) -> Self {
        Self {
            id: generate_id(),
            category: category.trim().to_lowercase(),
            editor,
            reservations: ReservationService::new(Arc::clone(&store)),
            cleanup: CleanupCoordinator::new(Arc::clone(&store)),
            store,
            inner: Arc::new(Mutex::new(SessionInner {
                phase: SessionPhase::Idle,
                reservation: None,
                registry: AssetRegistry::new(),
                deferred_cleanup: None,
                last_report: None,
            })),
            form: tokio::sync::Mutex::new(FormGate {
                form: FormState::new(initial_form),
                guard: NavigationGuard::new(),
            }),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.lock().phase
    }

    pub fn reservation(&self) -> Option<Reservation> {
        self.inner.lock().reservation.clone()
    }

    pub fn reserved_id(&self) -> Option<Identifier> {
        self.inner.lock().reservation.as_ref().map(|r| r.id)
    }

    pub fn pending_assets(&self) -> Vec<String> {
        self.inner.lock().registry.list_pending(&self.id)
    }

    pub fn last_cleanup(&self) -> Option<CleanupReport> {
        self.inner.lock().last_report.clone()
    }

    /// Submit stays disabled until an identifier is held and no commit is in flight
    pub fn can_submit(&self) -> bool {
        self.phase() == SessionPhase::Active
    }

    /// Reserve the session's identifier: `Idle -> Reserving -> Active`.
    ///
    /// An exit trigger that fires while the reservation is in flight is
    /// replayed as soon as it returns, releasing the fresh identifier.
    pub async fn begin(&self) -> DraftResult<Reservation> {
        {
            let mut inner = self.inner.lock();
            if inner.phase != SessionPhase::Idle {
                return Err(DraftError::InvalidPhase {
                    operation: "reserve an identifier",
                    phase: inner.phase,
                });
            }
            inner.phase = SessionPhase::Reserving;
        }

        let result = self.reservations.reserve(&self.category).await;

        let deferred = {
            let mut inner = self.inner.lock();
            match &result {
                Ok(reservation) => {
                    inner.reservation = Some(reservation.clone());
                    inner.phase = SessionPhase::Active;
                }
                Err(_) => inner.phase = SessionPhase::Idle,
            }
            inner
                .deferred_cleanup
                .take()
                .map(|trigger| (trigger, self.start_abandon(&mut inner)))
        };

        if let Some((trigger, plan)) = deferred {
            info!(
                "Session {} was abandoned ({}) while reserving; reclaiming",
                self.id, trigger
            );
            self.execute_cleanup(trigger, plan).await;
            result?;
            return Err(DraftError::InvalidPhase {
                operation: "reserve an identifier",
                phase: self.phase(),
            });
        }

        result
    }

    /// Register an upload that finished while the session is open.
    ///
    /// Returns false for a URL already tracked. An upload finishing after the
    /// session ended is deleted right away instead of being left orphaned.
    pub async fn track_upload(&self, url: &str) -> DraftResult<bool> {
        let rejected_in = {
            let mut inner = self.inner.lock();
            match inner.phase {
                SessionPhase::Idle
                | SessionPhase::Reserving
                | SessionPhase::Active
                | SessionPhase::Committing => {
                    return Ok(inner.registry.track(&self.id, url));
                }
                phase => phase,
            }
        };

        warn!(
            "Upload {} finished after session {} became {}; deleting it",
            url, self.id, rejected_in
        );
        if let Err(e) = self.store.delete_asset(url).await {
            warn!("{}", DraftError::cleanup(format!("asset {}", url), &e));
        }
        Err(DraftError::InvalidPhase {
            operation: "track an upload",
            phase: rejected_in,
        })
    }

    /// Upload a binary into the draft's folder and track it as pending
    pub async fn upload(&self, upload: AssetUpload) -> DraftResult<String> {
        let phase = self.phase();
        if phase.is_terminal() || phase == SessionPhase::Abandoning {
            return Err(DraftError::InvalidPhase {
                operation: "upload an asset",
                phase,
            });
        }

        if upload.bytes.is_empty() {
            return Err(DraftError::EmptyUpload {
                file_name: upload.file_name,
            });
        }

        let folder = draft_folder(&self.category, self.reserved_id());
        let file_name = upload.file_name.clone();
        let url = self
            .store
            .upload_asset(upload, &folder)
            .await
            .map_err(|e| {
                warn!("Upload of '{}' failed: {:#}", file_name, e);
                DraftError::upload(&file_name, &e)
            })?;

        debug!("Uploaded {} for session {}", url, self.id);
        self.track_upload(&url).await?;
        Ok(url)
    }

    /// Write the record under the reserved identifier.
    ///
    /// `Committing` disarms every cleanup trigger before the write is issued.
    /// On success the registry is committed and the phase becomes `Done` in the
    /// same critical section, before any further async work is scheduled.
    async fn commit_content(&self, content: Value) -> DraftResult<ContentRecord> {
        let reservation = {
            let mut inner = self.inner.lock();
            let reservation = match (&inner.phase, &inner.reservation) {
                (SessionPhase::Active, Some(reservation)) => reservation.clone(),
                (phase, _) => {
                    return Err(DraftError::InvalidPhase {
                        operation: "commit",
                        phase: *phase,
                    })
                }
            };
            inner.phase = SessionPhase::Committing;
            reservation
        };

        let result = self
            .store
            .create_with_reserved_id(
                &reservation.category,
                reservation.id,
                content,
                self.editor.display_name(),
            )
            .await;

        match result {
            Ok(record) => {
                let committed = {
                    let mut inner = self.inner.lock();
                    inner.phase = SessionPhase::Done;
                    inner.deferred_cleanup = None;
                    if let Some(reservation) = inner.reservation.as_mut() {
                        reservation.mark_committed();
                    }
                    inner.registry.commit_all(&self.id)
                };
                info!(
                    "Committed {}/{} with {} asset(s)",
                    record.category,
                    record.id,
                    committed.len()
                );
                Ok(record)
            }
            Err(e) => {
                let err = match e.downcast_ref::<RecordConflict>() {
                    Some(conflict) => DraftError::AlreadyCommitted {
                        category: conflict.category.clone(),
                        id: conflict.id,
                    },
                    None => DraftError::save(&e),
                };
                warn!("Commit of session {} failed: {}", self.id, err);

                let deferred = {
                    let mut inner = self.inner.lock();
                    inner.phase = SessionPhase::Active;
                    inner
                        .deferred_cleanup
                        .take()
                        .map(|trigger| (trigger, self.start_abandon(&mut inner)))
                };
                if let Some((trigger, plan)) = deferred {
                    info!(
                        "Running cleanup ({}) deferred during the failed commit of session {}",
                        trigger, self.id
                    );
                    self.execute_cleanup(trigger, plan).await;
                }
                Err(err)
            }
        }
    }

    /// Commit the record; the committed content becomes the form's saved snapshot
    pub async fn commit_session(&self, content: Value) -> DraftResult<ContentRecord> {
        let record = self.commit_content(content.clone()).await?;
        self.form.lock().await.form.mark_saved_as(content);
        Ok(record)
    }

    /// Commit whatever the form currently holds
    pub async fn commit_form(&self) -> DraftResult<ContentRecord> {
        let content = self.form.lock().await.form.live().clone();
        self.commit_session(content).await
    }

    /// End the session without a commit.
    ///
    /// All exit triggers converge here. Once a commit has started nothing is
    /// ever deleted; a trigger during an in-flight reservation or commit is
    /// deferred until that call returns. A trigger after a partial cleanup
    /// retries whatever that pass left behind.
    pub async fn abandon(&self, trigger: CleanupTrigger) -> AbandonOutcome {
        let plan = {
            let mut inner = self.inner.lock();
            let phase = inner.phase;
            match phase {
                SessionPhase::Idle | SessionPhase::Active => self.start_abandon(&mut inner),
                phase if phase.can_retry_cleanup() => match self.retry_plan(&mut inner) {
                    Some(plan) => plan,
                    None => return AbandonOutcome::Skipped { phase },
                },
                SessionPhase::Reserving | SessionPhase::Committing => {
                    debug!(
                        "Deferring {} cleanup of session {} while {}",
                        trigger, self.id, inner.phase
                    );
                    inner.deferred_cleanup.get_or_insert(trigger);
                    return AbandonOutcome::Deferred;
                }
                phase => {
                    debug!(
                        "Ignoring {} for session {}: already {}",
                        trigger, self.id, phase
                    );
                    return AbandonOutcome::Skipped { phase };
                }
            }
        };

        self.execute_cleanup(trigger, plan).await
    }

    /// Move to `Abandoning` and hand the pending work over to a cleanup plan
    fn start_abandon(&self, inner: &mut SessionInner) -> CleanupPlan {
        inner.phase = SessionPhase::Abandoning;
        let pending_assets = inner.registry.list_pending(&self.id);
        // Deletes are about to be issued for these
        inner.registry.discard(&self.id);

        CleanupPlan {
            session_id: self.id.clone(),
            reservation: inner.reservation.clone(),
            pending_assets,
        }
    }

    /// Orphans of the last partial cleanup, moving back to `Abandoning`
    fn retry_plan(&self, inner: &mut SessionInner) -> Option<CleanupPlan> {
        let report = inner.last_report.as_ref()?;
        let plan = CleanupPlan {
            session_id: self.id.clone(),
            reservation: report.reservation.clone().filter(|r| r.is_reserved()),
            pending_assets: report.failed_assets.clone(),
        };
        info!(
            "Retrying cleanup of session {}: {} asset(s), reservation pending: {}",
            self.id,
            plan.pending_assets.len(),
            plan.reservation.is_some()
        );
        inner.phase = SessionPhase::Abandoning;
        Some(plan)
    }

    async fn execute_cleanup(&self, trigger: CleanupTrigger, plan: CleanupPlan) -> AbandonOutcome {
        if trigger.is_awaited() {
            let report = self.cleanup.run(trigger, plan).await;
            record_report(&self.inner, report.clone());
            return AbandonOutcome::Cleaned { report };
        }

        // Accepted reliability gap: during unload nothing waits for these deletes
        let inner = Arc::clone(&self.inner);
        self.cleanup
            .dispatch(trigger, plan, move |report| record_report(&inner, report));
        AbandonOutcome::Dispatched
    }

    pub async fn form_value(&self) -> Value {
        self.form.lock().await.form.live().clone()
    }

    pub async fn update_form(&self, value: Value) {
        self.form.lock().await.form.replace(value);
    }

    pub async fn set_field(&self, field: &str, value: Value) {
        self.form.lock().await.form.set_field(field, value);
    }

    pub async fn has_unsaved_changes(&self) -> bool {
        self.form.lock().await.form.has_changes()
    }

    pub async fn pending_navigation(&self) -> Option<NavigationIntent> {
        self.form.lock().await.guard.pending().cloned()
    }

    pub async fn request_navigate(&self, target: &str) -> DraftResult<NavigationOutcome> {
        let mut gate = self.form.lock().await;
        let has_changes = gate.form.has_changes();
        gate.guard.request_navigate(has_changes, target)
    }

    /// Apply the user's answer to the pending navigation.
    ///
    /// Save-then-go commits the live form. The form lock is released while
    /// the commit runs; the intent is marked as saving instead, and a failed
    /// commit leaves it open.
    pub async fn resolve_navigation(
        &self,
        decision: NavigationDecision,
    ) -> DraftResult<NavigationOutcome> {
        match decision {
            NavigationDecision::SaveThenGo => self.save_then_go().await,
            NavigationDecision::DiscardThenGo => {
                let mut gate = self.form.lock().await;
                let target = gate.guard.close()?;
                gate.form.reset();
                Ok(NavigationOutcome::Proceed { target })
            }
            NavigationDecision::Cancel => {
                self.form.lock().await.guard.close()?;
                Ok(NavigationOutcome::Stay)
            }
        }
    }

    async fn save_then_go(&self) -> DraftResult<NavigationOutcome> {
        let content = {
            let mut gate = self.form.lock().await;
            gate.guard.begin_save()?;
            gate.form.live().clone()
        };

        let result = self.commit_content(content.clone()).await;

        let mut gate = self.form.lock().await;
        match result {
            Ok(_) => {
                gate.form.mark_saved_value(content);
                gate.guard.finish_save(true)
            }
            Err(e) => {
                gate.guard.finish_save(false)?;
                Err(e)
            }
        }
    }

    pub async fn summary(&self) -> SessionSummary {
        let has_unsaved_changes = self.has_unsaved_changes().await;
        let inner = self.inner.lock();
        SessionSummary {
            session_id: self.id.clone(),
            category: self.category.clone(),
            phase: inner.phase,
            reserved_id: inner.reservation.as_ref().map(|r| r.id),
            reservation: inner.reservation.clone(),
            pending_assets: inner.registry.list_pending(&self.id),
            has_unsaved_changes,
            can_submit: inner.phase == SessionPhase::Active,
        }
    }
}

/// Open editing sessions by id. Each session owns its own registry
pub struct SessionManager<S> {
    store: Arc<S>,
    sessions: RwLock<HashMap<SessionId, Arc<EditingSession<S>>>>,
}

impl<S: ContentStore + 'static> SessionManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Mount an editing surface for a new item in `category`
    pub async fn begin_session(
        &self,
        category: &str,
        editor: EditorContext,
        initial_form: Value,
    ) -> DraftResult<Arc<EditingSession<S>>> {
        let session = Arc::new(EditingSession::new(
            Arc::clone(&self.store),
            category,
            editor,
            initial_form,
        ));
        self.sessions
            .write()
            .insert(session.id().clone(), Arc::clone(&session));

        if let Err(e) = session.begin().await {
            self.sessions.write().remove(session.id());
            return Err(e);
        }
        Ok(session)
    }

    pub fn get(&self, session_id: &str) -> DraftResult<Arc<EditingSession<S>>> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| DraftError::SessionNotFound(session_id.to_string()))
    }

    pub async fn commit_session(
        &self,
        session_id: &str,
        content: Option<Value>,
    ) -> DraftResult<ContentRecord> {
        let session = self.get(session_id)?;
        let result = match content {
            Some(content) => session.commit_session(content).await,
            None => session.commit_form().await,
        };
        self.drop_if_finished(&session);
        result
    }

    /// Stop hosting a session that no user action can move any more
    fn drop_if_finished(&self, session: &EditingSession<S>) {
        let phase = session.phase();
        if phase.is_terminal() && !phase.can_retry_cleanup() {
            debug!("Dropping session {} in phase {}", session.id(), phase);
            self.sessions.write().remove(session.id());
        }
    }

    /// Run an exit trigger. A partially cleaned session stays hosted so the
    /// user can trigger the retry; every other finished session is dropped
    pub async fn abandon_session(
        &self,
        session_id: &str,
        trigger: CleanupTrigger,
    ) -> DraftResult<AbandonOutcome> {
        let session = self.get(session_id)?;
        let outcome = session.abandon(trigger).await;
        if matches!(outcome, AbandonOutcome::Dispatched) {
            // Nobody is left on the page to retry
            self.sessions.write().remove(session_id);
        } else {
            self.drop_if_finished(&session);
        }
        Ok(outcome)
    }

    /// Resolve a pending navigation; a session committed by save-then-go is dropped
    pub async fn resolve_navigation(
        &self,
        session_id: &str,
        decision: NavigationDecision,
    ) -> DraftResult<NavigationOutcome> {
        let session = self.get(session_id)?;
        let result = session.resolve_navigation(decision).await;
        self.drop_if_finished(&session);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssetUpload, ReservationState};
    use crate::store::memory::InMemoryStore;
    use crate::store::traits::{AssetStore, RecordStore};
    use serde_json::json;

    fn session_for(store: &Arc<InMemoryStore>) -> EditingSession<InMemoryStore> {
        EditingSession::new(
            Arc::clone(store),
            "news",
            EditorContext::new("editor-1".to_string()),
            json!({"title": ""}),
        )
    }

    fn image(name: &str) -> AssetUpload {
        AssetUpload::new(name, "image/png", vec![0x89, 0x50, 0x4e, 0x47])
    }

    #[tokio::test]
    async fn test_begin_reserves_and_activates() {
        let store = Arc::new(InMemoryStore::new());
        let session = session_for(&store);
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(!session.can_submit());

        let reservation = session.begin().await.unwrap();
        assert_eq!(reservation.category, "news");
        assert_eq!(session.phase(), SessionPhase::Active);
        assert!(session.can_submit());
        assert!(!session.has_unsaved_changes().await);

        let err = session.begin().await.unwrap_err();
        assert!(matches!(err, DraftError::InvalidPhase { .. }));
    }

    #[tokio::test]
    async fn test_commit_disarms_cleanup() {
        let store = Arc::new(InMemoryStore::new());
        let session = session_for(&store);
        session.begin().await.unwrap();
        let url = session.upload(image("hero.png")).await.unwrap();

        let record = session
            .commit_session(json!({"title": "Launch", "image": url}))
            .await
            .unwrap();
        assert_eq!(record.created_by, "editor-1");
        assert_eq!(session.phase(), SessionPhase::Done);
        assert!(session.pending_assets().is_empty());
        assert_eq!(
            session.reservation().map(|r| r.state),
            Some(ReservationState::Committed)
        );
        assert!(!session.has_unsaved_changes().await);

        let outcome = session.abandon(CleanupTrigger::Cancel).await;
        assert!(matches!(
            outcome,
            AbandonOutcome::Skipped {
                phase: SessionPhase::Done
            }
        ));
        assert!(store.has_asset(&url));
    }

    #[tokio::test]
    async fn test_cancel_reclaims_everything() {
        let store = Arc::new(InMemoryStore::new());
        let session = session_for(&store);
        let reservation = session.begin().await.unwrap();
        session.upload(image("a.png")).await.unwrap();
        session.upload(image("b.png")).await.unwrap();

        let outcome = session.abandon(CleanupTrigger::Cancel).await;
        let AbandonOutcome::Cleaned { report } = outcome else {
            panic!("Cancel must run cleanup to completion");
        };
        assert_eq!(report.deleted_assets.len(), 2);
        assert!(report.reservation_released);
        assert_eq!(session.phase(), SessionPhase::Cleaned);
        assert_eq!(store.asset_count(), 0);
        assert!(!store.is_reserved("news", reservation.id));

        // A second trigger is a no-op
        let outcome = session.abandon(CleanupTrigger::BackNavigation).await;
        assert!(matches!(outcome, AbandonOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_late_upload_is_deleted() {
        let store = Arc::new(InMemoryStore::new());
        let session = session_for(&store);
        session.begin().await.unwrap();
        session.abandon(CleanupTrigger::Cancel).await;

        let url = store
            .upload_asset(image("late.png"), "news/1")
            .await
            .unwrap();
        let err = session.track_upload(&url).await.unwrap_err();
        assert!(matches!(
            err,
            DraftError::InvalidPhase {
                phase: SessionPhase::Cleaned,
                ..
            }
        ));
        assert!(!store.has_asset(&url));
    }

    #[tokio::test]
    async fn test_upload_after_abandon_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let session = session_for(&store);
        session.begin().await.unwrap();
        session.abandon(CleanupTrigger::Cancel).await;

        let err = session.upload(image("late.png")).await.unwrap_err();
        assert!(matches!(err, DraftError::InvalidPhase { .. }));
        assert_eq!(store.asset_count(), 0);
    }

    #[tokio::test]
    async fn test_commit_conflict_keeps_session_active() {
        let store = Arc::new(InMemoryStore::new());
        let session = session_for(&store);
        let reservation = session.begin().await.unwrap();

        // Another tab committed the same identifier first
        store
            .create_with_reserved_id("news", reservation.id, json!({"title": "other"}), "someone")
            .await
            .unwrap();

        let err = session.commit_session(json!({"title": "mine"})).await.unwrap_err();
        assert!(matches!(err, DraftError::AlreadyCommitted { .. }));
        assert_eq!(session.phase(), SessionPhase::Active);

        let record = store.get_record("news", reservation.id).await.unwrap().unwrap();
        assert_eq!(record.content, json!({"title": "other"}));
    }

    #[tokio::test]
    async fn test_navigation_save_then_go_commits() {
        let store = Arc::new(InMemoryStore::new());
        let session = session_for(&store);
        let reservation = session.begin().await.unwrap();

        session.set_field("title", json!("Spring fair")).await;
        assert!(session.has_unsaved_changes().await);

        let outcome = session.request_navigate("/admin/events").await.unwrap();
        assert!(matches!(outcome, NavigationOutcome::Blocked { .. }));

        let outcome = session
            .resolve_navigation(NavigationDecision::SaveThenGo)
            .await
            .unwrap();
        assert!(outcome.is_proceed());
        assert_eq!(session.phase(), SessionPhase::Done);
        assert!(!session.has_unsaved_changes().await);

        let record = store.get_record("news", reservation.id).await.unwrap().unwrap();
        assert_eq!(record.content, json!({"title": "Spring fair"}));
    }

    #[tokio::test]
    async fn test_manager_lifecycle() {
        let store = Arc::new(InMemoryStore::new());
        let manager = SessionManager::new(Arc::clone(&store));

        let session = manager
            .begin_session("news", EditorContext::default(), json!({}))
            .await
            .unwrap();
        assert_eq!(manager.len(), 1);

        manager
            .commit_session(session.id(), Some(json!({"title": "x"})))
            .await
            .unwrap();
        assert!(manager.is_empty());
        assert!(matches!(
            manager.get(session.id()),
            Err(DraftError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_manager_rejects_empty_category() {
        let manager = SessionManager::new(Arc::new(InMemoryStore::new()));
        let err = manager
            .begin_session("  ", EditorContext::default(), json!({}))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DraftError::Allocation { .. }));
        assert!(manager.is_empty());
    }
}
