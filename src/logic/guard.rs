use log::debug;
use serde_json::Value;

use crate::error::{DraftError, DraftResult};
use crate::model::{FormSnapshot, NavigationDecision, NavigationIntent, NavigationOutcome};

/// Structural inequality between the live form value and the last save
pub fn has_changes(live: &Value, snapshot: &FormSnapshot) -> bool {
    live != &snapshot.value
}

/// Live form value plus the snapshot it was last saved as.
///
/// Dirtiness is always derived by comparing the two, never tracked as a flag.
#[derive(Debug, Clone)]
pub struct FormState {
    snapshot: FormSnapshot,
    live: Value,
}

impl FormState {
    pub fn new(initial: Value) -> Self {
        Self {
            snapshot: FormSnapshot::new(initial.clone()),
            live: initial,
        }
    }

    pub fn live(&self) -> &Value {
        &self.live
    }

    pub fn snapshot(&self) -> &FormSnapshot {
        &self.snapshot
    }

    pub fn has_changes(&self) -> bool {
        has_changes(&self.live, &self.snapshot)
    }

    pub fn replace(&mut self, live: Value) {
        self.live = live;
    }

    /// Set one top-level field, turning a non-object form into an object
    pub fn set_field(&mut self, field: &str, value: Value) {
        if !self.live.is_object() {
            self.live = Value::Object(serde_json::Map::new());
        }
        if let Value::Object(map) = &mut self.live {
            map.insert(field.to_string(), value);
        }
    }

    /// The live value has been persisted
    pub fn mark_saved(&mut self) {
        self.snapshot = FormSnapshot::new(self.live.clone());
    }

    /// `value` has been persisted; edits made since it was read stay live
    pub fn mark_saved_value(&mut self, value: Value) {
        self.snapshot = FormSnapshot::new(value);
    }

    /// `value` has been persisted and becomes both snapshot and live state
    pub fn mark_saved_as(&mut self, value: Value) {
        self.snapshot = FormSnapshot::new(value.clone());
        self.live = value;
    }

    pub fn reset(&mut self) {
        self.live = self.snapshot.value.clone();
    }
}

/// Something whose unsaved state can block navigation
#[async_trait::async_trait]
pub trait EditingSurface: Send {
    fn has_changes(&self) -> bool;
    /// Persist the live state; on success the surface is clean
    async fn save(&mut self) -> anyhow::Result<()>;
    /// Drop the live state back to the last save
    fn discard(&mut self);
}

/// Persists a serialized form value
#[async_trait::async_trait]
pub trait FormSaver: Send + Sync {
    async fn save(&self, value: &Value) -> anyhow::Result<()>;
}

/// A form backed by a saver, the usual editing surface
pub struct SavingForm<F> {
    pub form: FormState,
    saver: F,
}

impl<F: FormSaver> SavingForm<F> {
    pub fn new(initial: Value, saver: F) -> Self {
        Self {
            form: FormState::new(initial),
            saver,
        }
    }
}

#[async_trait::async_trait]
impl<F: FormSaver> EditingSurface for SavingForm<F> {
    fn has_changes(&self) -> bool {
        self.form.has_changes()
    }

    async fn save(&mut self) -> anyhow::Result<()> {
        self.saver.save(self.form.live()).await?;
        self.form.mark_saved();
        Ok(())
    }

    fn discard(&mut self) {
        self.form.reset();
    }
}

/// Holds at most one navigation waiting on a save/discard/cancel decision
#[derive(Debug, Default)]
pub struct NavigationGuard {
    intent: Option<NavigationIntent>,
}

impl NavigationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&NavigationIntent> {
        self.intent.as_ref()
    }

    /// Navigate right away when the form is clean, otherwise raise an intent
    pub fn request_navigate(
        &mut self,
        has_changes: bool,
        target: &str,
    ) -> DraftResult<NavigationOutcome> {
        if let Some(intent) = &self.intent {
            return Err(DraftError::NavigationPending {
                target: intent.target.clone(),
            });
        }

        if !has_changes {
            return Ok(NavigationOutcome::Proceed {
                target: target.to_string(),
            });
        }

        debug!("Navigation to '{}' blocked by unsaved changes", target);
        let intent = NavigationIntent::new(target.to_string());
        self.intent = Some(intent.clone());
        Ok(NavigationOutcome::Blocked { intent })
    }

    /// The pending intent, unless a save for it is still running
    fn open_intent(&mut self) -> DraftResult<&mut NavigationIntent> {
        match self.intent.as_mut() {
            None => Err(DraftError::NoPendingNavigation),
            Some(intent) if intent.saving => Err(DraftError::SaveInProgress {
                target: intent.target.clone(),
            }),
            Some(intent) => Ok(intent),
        }
    }

    /// Mark the intent as saving and return its target.
    ///
    /// Until [`NavigationGuard::finish_save`] runs, every other resolution is
    /// rejected with `SaveInProgress`.
    pub fn begin_save(&mut self) -> DraftResult<String> {
        let intent = self.open_intent()?;
        intent.saving = true;
        Ok(intent.target.clone())
    }

    /// Close a save started with [`NavigationGuard::begin_save`].
    ///
    /// A successful save proceeds to the target; a failed one leaves the
    /// intent open for another decision.
    pub fn finish_save(&mut self, saved: bool) -> DraftResult<NavigationOutcome> {
        if !saved {
            if let Some(intent) = self.intent.as_mut() {
                intent.saving = false;
            }
            return Ok(NavigationOutcome::Stay);
        }

        self.intent
            .take()
            .map(|intent| NavigationOutcome::Proceed {
                target: intent.target,
            })
            .ok_or(DraftError::NoPendingNavigation)
    }

    /// Drop the intent for a discard or cancel decision and return its target
    pub fn close(&mut self) -> DraftResult<String> {
        let target = self.open_intent()?.target.clone();
        self.intent = None;
        Ok(target)
    }

    /// Apply the user's decision to the pending intent.
    ///
    /// A failed save keeps the intent open and returns the save error.
    pub async fn resolve<E: EditingSurface + ?Sized>(
        &mut self,
        surface: &mut E,
        decision: NavigationDecision,
    ) -> DraftResult<NavigationOutcome> {
        match decision {
            NavigationDecision::SaveThenGo => {
                self.begin_save()?;
                match surface.save().await {
                    Ok(()) => self.finish_save(true),
                    Err(e) => {
                        self.finish_save(false)?;
                        Err(DraftError::save(&e))
                    }
                }
            }
            NavigationDecision::DiscardThenGo => {
                let target = self.close()?;
                surface.discard();
                Ok(NavigationOutcome::Proceed { target })
            }
            NavigationDecision::Cancel => {
                self.close()?;
                Ok(NavigationOutcome::Stay)
            }
        }
    }
}

/// Several independently managed surfaces on one page, one active at a time
pub struct TabHost {
    tabs: Vec<(String, Box<dyn EditingSurface>)>,
    active: usize,
    guard: NavigationGuard,
}

impl TabHost {
    pub fn new() -> Self {
        Self {
            tabs: Vec::new(),
            active: 0,
            guard: NavigationGuard::new(),
        }
    }

    pub fn with_tab(mut self, name: &str, surface: Box<dyn EditingSurface>) -> Self {
        self.tabs.push((name.to_string(), surface));
        self
    }

    pub fn active_tab(&self) -> Option<&str> {
        self.tabs.get(self.active).map(|(name, _)| name.as_str())
    }

    pub fn pending(&self) -> Option<&NavigationIntent> {
        self.guard.pending()
    }

    pub fn surface(&self, name: &str) -> Option<&dyn EditingSurface> {
        self.tabs
            .iter()
            .find(|(tab, _)| tab == name)
            .map(|(_, surface)| surface.as_ref())
    }

    /// Whether the currently active surface has unsaved changes
    pub fn has_changes(&self) -> bool {
        self.tabs
            .get(self.active)
            .map_or(false, |(_, surface)| surface.has_changes())
    }

    fn index_of(&self, name: &str) -> DraftResult<usize> {
        self.tabs
            .iter()
            .position(|(tab, _)| tab == name)
            .ok_or_else(|| DraftError::UnknownTab(name.to_string()))
    }

    /// Ask the active surface before switching to `target`
    pub fn request_switch(&mut self, target: &str) -> DraftResult<NavigationOutcome> {
        let target_index = self.index_of(target)?;
        let (_, surface) = self
            .tabs
            .get(self.active)
            .ok_or_else(|| DraftError::UnknownTab(target.to_string()))?;

        let outcome = self.guard.request_navigate(surface.has_changes(), target)?;
        if outcome.is_proceed() {
            self.active = target_index;
        }
        Ok(outcome)
    }

    /// Resolve the pending switch against whichever surface is active now
    pub async fn resolve(&mut self, decision: NavigationDecision) -> DraftResult<NavigationOutcome> {
        let (_, surface) = self
            .tabs
            .get_mut(self.active)
            .ok_or(DraftError::NoPendingNavigation)?;

        let outcome = self.guard.resolve(surface.as_mut(), decision).await?;
        if let NavigationOutcome::Proceed { target } = &outcome {
            self.active = self.index_of(target)?;
        }
        Ok(outcome)
    }
}

impl Default for TabHost {
    fn default() -> Self {
        Self::new()
    }
}
