//! One user's live editing session: slot manager + autosave, wired.
//!
//! The session is the piece the UI talks to. Edits flow through
//! [`EditSession::edit`], which repairs them, refreshes the draft, and
//! arms the autosave debounce; the debounce fires back into the slot
//! manager's persist operation. Lifecycle operations that change which
//! layout is active re-seat the autosave baseline so no stale persist
//! crosses layouts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::autosave::{AutosaveController, PersistSink, AUTOSAVE_DEBOUNCE};
use crate::draft::DraftStorage;
use crate::error::CoreError;
use crate::layout::LayoutConfig;
use crate::slots::SlotManager;
use crate::types::DbId;

/// Bridges the autosave timer back into the slot manager.
struct ManagerSink<S: DraftStorage> {
    manager: Arc<Mutex<SlotManager<S>>>,
}

#[async_trait]
impl<S: DraftStorage + 'static> PersistSink for ManagerSink<S> {
    async fn persist(&self, config: &LayoutConfig) -> Result<(), CoreError> {
        let mut manager = self.manager.lock().await;
        manager.persist_config(config).await.map(|_| ())
    }
}

/// An open dashboard-editing session for one (user, entity).
pub struct EditSession<S: DraftStorage + 'static> {
    manager: Arc<Mutex<SlotManager<S>>>,
    autosave: AutosaveController,
}

impl<S: DraftStorage + 'static> EditSession<S> {
    pub fn start(manager: SlotManager<S>) -> Self {
        Self::with_debounce(manager, AUTOSAVE_DEBOUNCE)
    }

    pub fn with_debounce(manager: SlotManager<S>, debounce: Duration) -> Self {
        let baseline = manager.active().config.clone();
        let manager = Arc::new(Mutex::new(manager));
        let sink = Arc::new(ManagerSink {
            manager: Arc::clone(&manager),
        });
        let autosave = AutosaveController::with_delay(baseline, sink, debounce);
        Self { manager, autosave }
    }

    /// Direct access to the slot manager for lifecycle operations not
    /// wrapped here (rename, delete, default flag, drafts).
    pub fn manager(&self) -> &Arc<Mutex<SlotManager<S>>> {
        &self.manager
    }

    /// Apply a config edit from the grid. Immutable layouts accept the
    /// in-memory change but never schedule persistence.
    pub async fn edit(&self, config: LayoutConfig) {
        let (immutable, applied) = {
            let mut manager = self.manager.lock().await;
            manager.note_edit(config);
            (manager.active().is_immutable, manager.active().config.clone())
        };
        if !immutable {
            self.autosave.note_change(&applied);
        }
    }

    /// Undo the last persisted change and apply the popped snapshot.
    pub async fn undo(&self) -> Option<LayoutConfig> {
        let config = self.autosave.undo()?;
        let mut manager = self.manager.lock().await;
        manager.note_edit(config.clone());
        Some(config)
    }

    /// Persist any pending debounced edit immediately.
    pub async fn save_now(&self) -> Result<(), CoreError> {
        self.autosave.flush().await
    }

    /// Switch layouts, re-seating the autosave baseline.
    pub async fn select_layout(&self, id: DbId) -> Result<(), CoreError> {
        let mut manager = self.manager.lock().await;
        let config = manager.select_layout(id)?.config.clone();
        self.autosave.reset(config);
        Ok(())
    }

    /// Create a new custom layout and make it active.
    pub async fn create_new_layout(&self, name: &str) -> Result<(), CoreError> {
        let mut manager = self.manager.lock().await;
        let config = manager.create_new_layout(name)?.config.clone();
        self.autosave.reset(config);
        Ok(())
    }

    /// Tear down the session, cancelling any pending autosave.
    pub fn close(&self) {
        self.autosave.shutdown();
    }
}
