//! Lifecycle of the Default layout and up to three custom layout slots.
//!
//! One [`SlotManager`] drives a single user's layouts for a single
//! entity: the synthetic immutable Default plus the persisted customs,
//! in creation order. All persistence goes through the injected
//! [`LayoutPersistence`] collaborator; the Default is never written to
//! it.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::defaults::default_layout_config;
use crate::draft::{Draft, DraftData, DraftKey, DraftStorage, DraftStore};
use crate::error::CoreError;
use crate::layout::{
    validate_layout_name, ActiveLayout, LayoutConfig, DEFAULT_LAYOUT_ID, MAX_CUSTOM_LAYOUTS,
    UNSAVED_LAYOUT_ID,
};
use crate::registry::WidgetRegistry;
use crate::sanitize::sanitize;
use crate::types::{DbId, EntityType, Timestamp};

// ---------------------------------------------------------------------------
// Persistence collaborator
// ---------------------------------------------------------------------------

/// Which user's layouts for which entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutScope {
    pub organization_id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: DbId,
    pub user_id: DbId,
}

/// A persisted custom layout as the engine sees it.
#[derive(Debug, Clone)]
pub struct LayoutRecord {
    pub id: DbId,
    pub name: String,
    pub is_user_default: bool,
    pub config: LayoutConfig,
    pub widget_prefs: serde_json::Value,
    pub timeline_state: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields for inserting a new custom layout.
#[derive(Debug, Clone)]
pub struct NewLayoutData {
    pub name: String,
    pub config: LayoutConfig,
    pub widget_prefs: serde_json::Value,
    pub timeline_state: serde_json::Value,
}

/// Partial update of a persisted layout; `None` fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct LayoutPatch {
    pub name: Option<String>,
    pub config: Option<LayoutConfig>,
    pub widget_prefs: Option<serde_json::Value>,
    pub timeline_state: Option<serde_json::Value>,
}

/// The save/load/delete contract of the persistence layer.
///
/// `create` must reject a fourth slot with [`CoreError::Conflict`] even
/// under concurrent inserts; the capacity invariant ultimately belongs
/// to the storage, and the manager only pre-checks it for a friendlier
/// error.
#[async_trait]
pub trait LayoutPersistence: Send + Sync {
    async fn create(&self, scope: &LayoutScope, data: NewLayoutData)
        -> Result<LayoutRecord, CoreError>;
    async fn update(
        &self,
        scope: &LayoutScope,
        id: DbId,
        patch: LayoutPatch,
    ) -> Result<LayoutRecord, CoreError>;
    async fn delete(&self, scope: &LayoutScope, id: DbId) -> Result<(), CoreError>;
    /// All layouts in the scope, in creation order.
    async fn list(&self, scope: &LayoutScope) -> Result<Vec<LayoutRecord>, CoreError>;
    /// Make `id` the single user default within the scope.
    async fn set_user_default(&self, scope: &LayoutScope, id: DbId) -> Result<(), CoreError>;
}

// ---------------------------------------------------------------------------
// Slot manager
// ---------------------------------------------------------------------------

/// Per-(user, entity) layout lifecycle state machine.
pub struct SlotManager<S: DraftStorage> {
    scope: LayoutScope,
    registry: Arc<WidgetRegistry>,
    persistence: Arc<dyn LayoutPersistence>,
    drafts: Arc<DraftStore<S>>,
    saved: Vec<LayoutRecord>,
    active: ActiveLayout,
}

impl<S: DraftStorage> SlotManager<S> {
    /// Load the scope's saved layouts and activate the user's default
    /// custom layout, or the synthetic Default if none is flagged.
    pub async fn open(
        scope: LayoutScope,
        registry: Arc<WidgetRegistry>,
        persistence: Arc<dyn LayoutPersistence>,
        drafts: Arc<DraftStore<S>>,
    ) -> Result<Self, CoreError> {
        let saved = persistence.list(&scope).await?;
        let active = match saved.iter().find(|r| r.is_user_default) {
            Some(record) => active_from_record(record),
            None => ActiveLayout::synthetic_default(default_layout_config(scope.entity_type)),
        };
        Ok(Self {
            scope,
            registry,
            persistence,
            drafts,
            saved,
            active,
        })
    }

    pub fn active(&self) -> &ActiveLayout {
        &self.active
    }

    /// Persisted custom layouts, in creation order.
    pub fn saved(&self) -> &[LayoutRecord] {
        &self.saved
    }

    pub fn custom_count(&self) -> usize {
        self.saved.len()
    }

    pub fn scope(&self) -> &LayoutScope {
        &self.scope
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Switch the active pointer. No mutation of any layout.
    pub fn select_layout(&mut self, id: DbId) -> Result<&ActiveLayout, CoreError> {
        if id == DEFAULT_LAYOUT_ID {
            self.active =
                ActiveLayout::synthetic_default(default_layout_config(self.scope.entity_type));
            return Ok(&self.active);
        }
        let record = self
            .saved
            .iter()
            .find(|r| r.id == id)
            .ok_or(CoreError::NotFound {
                entity: "SavedLayout",
                id,
            })?;
        self.active = active_from_record(record);
        Ok(&self.active)
    }

    // -----------------------------------------------------------------------
    // Creation and saving
    // -----------------------------------------------------------------------

    /// Start a new custom layout from a clone of the Default config.
    /// Not persisted until [`SlotManager::save_layout`].
    pub fn create_new_layout(&mut self, name: &str) -> Result<&ActiveLayout, CoreError> {
        validate_layout_name(name)?;
        self.check_capacity()?;
        self.active = ActiveLayout::new_custom(
            name.to_string(),
            default_layout_config(self.scope.entity_type),
        );
        Ok(&self.active)
    }

    /// Sanitize and persist the active layout, inserting or updating as
    /// appropriate. On success the active layout carries the sanitized
    /// config, is clean, and its draft is gone.
    pub async fn save_layout(&mut self) -> Result<DbId, CoreError> {
        let config = self.active.config.clone();
        let record = self.persist_config(&config).await?;
        let id = record.id;
        self.active.id = id;
        self.active.config = record.config.clone();
        self.active.is_dirty = false;
        self.drafts.clear(&self.draft_key(id));
        Ok(id)
    }

    /// Persist `config` into the active layout's slot without touching
    /// the in-memory config. Backbone of both explicit saves and the
    /// autosave sink, which may be persisting a snapshot that already
    /// lags behind the in-memory state.
    pub async fn persist_config(
        &mut self,
        config: &LayoutConfig,
    ) -> Result<LayoutRecord, CoreError> {
        if self.active.is_immutable {
            return Err(CoreError::Forbidden(
                "The default layout cannot be modified".to_string(),
            ));
        }

        let raw = serde_json::to_value(config)
            .map_err(|e| CoreError::Internal(format!("Layout serialization failed: {e}")))?;
        let sanitized = sanitize(&raw, self.scope.entity_type, &self.registry);

        let record = if self.active.is_persisted() {
            let patch = LayoutPatch {
                config: Some(sanitized),
                widget_prefs: Some(self.active.widget_prefs.clone()),
                timeline_state: Some(self.active.timeline_state.clone()),
                ..LayoutPatch::default()
            };
            let record = self
                .persistence
                .update(&self.scope, self.active.id, patch)
                .await?;
            self.replace_saved(record.clone());
            record
        } else {
            self.check_capacity()?;
            let data = NewLayoutData {
                name: self.active.name.clone(),
                config: sanitized,
                widget_prefs: self.active.widget_prefs.clone(),
                timeline_state: self.active.timeline_state.clone(),
            };
            let record = self.persistence.create(&self.scope, data).await?;
            // The pre-save draft was keyed under the unsaved sentinel.
            self.drafts.clear(&self.draft_key(UNSAVED_LAYOUT_ID));
            self.active.id = record.id;
            self.saved.push(record.clone());
            record
        };

        // A successful persist of the current in-memory state settles
        // the layout: the draft has nothing the server does not.
        if self.active.config == record.config {
            self.active.is_dirty = false;
            self.drafts.clear(&self.draft_key(self.active.id));
        }

        tracing::debug!(
            layout_id = record.id,
            entity_type = %self.scope.entity_type,
            entity_id = self.scope.entity_id,
            "Layout persisted"
        );
        Ok(record)
    }

    // -----------------------------------------------------------------------
    // Rename / delete / default flag
    // -----------------------------------------------------------------------

    /// Rename the active custom layout.
    pub async fn rename_layout(&mut self, name: &str) -> Result<(), CoreError> {
        if self.active.is_immutable {
            return Err(CoreError::Forbidden(
                "The default layout cannot be renamed".to_string(),
            ));
        }
        validate_layout_name(name)?;

        if self.active.is_persisted() {
            let patch = LayoutPatch {
                name: Some(name.to_string()),
                ..LayoutPatch::default()
            };
            let record = self
                .persistence
                .update(&self.scope, self.active.id, patch)
                .await?;
            self.replace_saved(record);
        }
        self.active.name = name.to_string();
        Ok(())
    }

    /// Delete the active custom layout and fall back to the Default.
    pub async fn delete_layout(&mut self) -> Result<(), CoreError> {
        if self.active.is_immutable {
            return Err(CoreError::Forbidden(
                "The default layout cannot be deleted".to_string(),
            ));
        }

        let id = self.active.id;
        if self.active.is_persisted() {
            self.persistence.delete(&self.scope, id).await?;
            self.saved.retain(|r| r.id != id);
        }
        self.drafts.clear(&self.draft_key(id));
        self.active =
            ActiveLayout::synthetic_default(default_layout_config(self.scope.entity_type));
        Ok(())
    }

    /// Flag the active custom layout as the user's default, clearing
    /// the flag everywhere else in the scope.
    pub async fn set_as_user_default(&mut self) -> Result<(), CoreError> {
        if self.active.is_immutable {
            return Err(CoreError::Forbidden(
                "The default layout cannot hold the user-default flag".to_string(),
            ));
        }
        if !self.active.is_persisted() {
            return Err(CoreError::Conflict(
                "Save the layout before making it the default".to_string(),
            ));
        }

        let id = self.active.id;
        self.persistence.set_user_default(&self.scope, id).await?;
        for record in &mut self.saved {
            record.is_user_default = record.id == id;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Edits, reverts, drafts
    // -----------------------------------------------------------------------

    /// Apply an edited config to the active layout. The config is
    /// repaired on the way in, the layout becomes dirty, and (for
    /// custom layouts) the draft is refreshed.
    pub fn note_edit(&mut self, config: LayoutConfig) {
        let sanitized = match serde_json::to_value(&config) {
            Ok(raw) => sanitize(&raw, self.scope.entity_type, &self.registry),
            Err(_) => config,
        };
        self.active.config = sanitized;
        if self.active.is_immutable {
            return;
        }
        self.active.is_dirty = true;
        self.write_draft();
    }

    /// Replace the active config with a fresh copy of the entity
    /// default, discarding the current arrangement. Counts as an edit.
    pub fn revert_to_default(&mut self) {
        let config = default_layout_config(self.scope.entity_type);
        self.note_edit(config);
    }

    /// Throw away unsaved edits: reload the last-persisted snapshot of
    /// the active custom layout and drop its draft. An unsaved layout
    /// has no snapshot, so it is abandoned for the Default.
    pub fn discard_changes(&mut self) -> &ActiveLayout {
        let id = self.active.id;
        self.drafts.clear(&self.draft_key(id));

        if self.active.is_persisted() {
            if let Some(record) = self.saved.iter().find(|r| r.id == id) {
                self.active = active_from_record(record);
            }
        } else if !self.active.is_immutable {
            self.active =
                ActiveLayout::synthetic_default(default_layout_config(self.scope.entity_type));
        }
        &self.active
    }

    /// The stored draft for the active layout, if one is loadable.
    pub fn pending_draft(&self) -> Option<Draft> {
        self.drafts.load(&self.draft_key(self.active.id))
    }

    /// True when `draft` should win a draft-vs-server prompt for the
    /// active layout. The caller prompts; the engine never merges.
    pub fn draft_is_newer(&self, draft: &Draft) -> bool {
        let server_updated_at = self
            .saved
            .iter()
            .find(|r| r.id == self.active.id)
            .map(|r| r.updated_at);
        DraftStore::<S>::is_newer_than_server(draft, server_updated_at)
    }

    /// Adopt a previously stored draft as the in-memory state.
    pub fn apply_draft(&mut self, draft: Draft) {
        self.active.widget_prefs = draft.data.widget_prefs;
        self.active.timeline_state = draft.data.timeline_state;
        self.note_edit(draft.data.config);
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn check_capacity(&self) -> Result<(), CoreError> {
        if self.saved.len() >= MAX_CUSTOM_LAYOUTS {
            return Err(CoreError::Conflict(format!(
                "Layout limit reached: at most {MAX_CUSTOM_LAYOUTS} custom layouts per dashboard"
            )));
        }
        Ok(())
    }

    fn draft_key(&self, layout_id: DbId) -> DraftKey {
        DraftKey {
            entity_type: self.scope.entity_type,
            entity_id: self.scope.entity_id,
            layout_id,
            user_id: self.scope.user_id,
        }
    }

    fn write_draft(&self) {
        self.drafts.save(
            &self.draft_key(self.active.id),
            DraftData {
                config: self.active.config.clone(),
                timeline_state: self.active.timeline_state.clone(),
                widget_prefs: self.active.widget_prefs.clone(),
            },
        );
    }

    fn replace_saved(&mut self, record: LayoutRecord) {
        if let Some(existing) = self.saved.iter_mut().find(|r| r.id == record.id) {
            *existing = record;
        }
    }
}

fn active_from_record(record: &LayoutRecord) -> ActiveLayout {
    ActiveLayout {
        id: record.id,
        name: record.name.clone(),
        is_default: false,
        is_immutable: false,
        config: record.config.clone(),
        widget_prefs: record.widget_prefs.clone(),
        timeline_state: record.timeline_state.clone(),
        is_dirty: false,
    }
}
