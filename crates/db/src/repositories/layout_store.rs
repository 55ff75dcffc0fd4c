//! [`LayoutPersistence`] implementation backed by [`LayoutRepo`].
//!
//! Adapts the engine's persistence collaborator contract onto the
//! Postgres repository so a [`coldwatch_core::slots::SlotManager`] can
//! run against the real database.

use async_trait::async_trait;
use sqlx::PgPool;

use coldwatch_core::error::CoreError;
use coldwatch_core::layout::LayoutConfig;
use coldwatch_core::slots::{
    LayoutPatch, LayoutPersistence, LayoutRecord, LayoutScope, NewLayoutData,
};
use coldwatch_core::types::DbId;

use crate::models::layout::{CreateSavedLayout, SavedLayout, UpdateSavedLayout};
use crate::repositories::LayoutRepo;

/// Postgres-backed layout persistence.
pub struct PgLayoutStore {
    pool: PgPool,
}

impl PgLayoutStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LayoutPersistence for PgLayoutStore {
    async fn create(
        &self,
        scope: &LayoutScope,
        data: NewLayoutData,
    ) -> Result<LayoutRecord, CoreError> {
        let dto = CreateSavedLayout {
            entity_type: scope.entity_type.as_str().to_string(),
            entity_id: scope.entity_id,
            name: data.name,
            layout_json: config_json(&data.config)?,
            widget_prefs_json: Some(data.widget_prefs),
            timeline_state_json: Some(data.timeline_state),
        };
        let row = LayoutRepo::create(
            &self.pool,
            scope.organization_id,
            scope.user_id,
            data.config.version,
            &dto,
        )
        .await
        .map_err(db_error)?
        .ok_or_else(|| CoreError::Conflict("layout slot limit reached".to_string()))?;
        Ok(to_record(row))
    }

    async fn update(
        &self,
        scope: &LayoutScope,
        id: DbId,
        patch: LayoutPatch,
    ) -> Result<LayoutRecord, CoreError> {
        let dto = UpdateSavedLayout {
            name: patch.name,
            layout_json: patch.config.as_ref().map(config_json).transpose()?,
            widget_prefs_json: patch.widget_prefs,
            timeline_state_json: patch.timeline_state,
        };
        let row = LayoutRepo::update(&self.pool, id, scope.user_id, &dto)
            .await
            .map_err(db_error)?
            .ok_or(CoreError::NotFound {
                entity: "SavedLayout",
                id,
            })?;
        Ok(to_record(row))
    }

    async fn delete(&self, scope: &LayoutScope, id: DbId) -> Result<(), CoreError> {
        let deleted = LayoutRepo::delete(&self.pool, id, scope.user_id)
            .await
            .map_err(db_error)?;
        if deleted {
            Ok(())
        } else {
            Err(CoreError::NotFound {
                entity: "SavedLayout",
                id,
            })
        }
    }

    async fn list(&self, scope: &LayoutScope) -> Result<Vec<LayoutRecord>, CoreError> {
        let rows = LayoutRepo::list_for_entity(
            &self.pool,
            scope.entity_type.as_str(),
            scope.entity_id,
            scope.user_id,
        )
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(to_record).collect())
    }

    async fn set_user_default(&self, scope: &LayoutScope, id: DbId) -> Result<(), CoreError> {
        let found = LayoutRepo::set_user_default(&self.pool, id, scope.user_id)
            .await
            .map_err(db_error)?;
        if found {
            Ok(())
        } else {
            Err(CoreError::NotFound {
                entity: "SavedLayout",
                id,
            })
        }
    }
}

fn db_error(e: sqlx::Error) -> CoreError {
    CoreError::Internal(format!("database error: {e}"))
}

fn config_json(config: &LayoutConfig) -> Result<serde_json::Value, CoreError> {
    serde_json::to_value(config)
        .map_err(|e| CoreError::Internal(format!("layout serialization failed: {e}")))
}

fn to_record(row: SavedLayout) -> LayoutRecord {
    let config = match serde_json::from_value(row.layout_json) {
        Ok(config) => config,
        Err(e) => {
            // Rows are sanitized before every write, so this indicates
            // manual tampering; the engine re-repairs on the next edit.
            tracing::warn!(layout_id = row.id, error = %e, "Stored layout config unreadable");
            LayoutConfig::empty()
        }
    };
    LayoutRecord {
        id: row.id,
        name: row.name,
        is_user_default: row.is_user_default,
        config,
        widget_prefs: row.widget_prefs_json,
        timeline_state: row.timeline_state_json,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
