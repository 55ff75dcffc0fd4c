//! Saved layout models and DTOs.
//!
//! Covers the per-user custom dashboard layouts for units and sites.
//! The `layout_json` payload is opaque at this layer; the API re-runs
//! the engine's sanitizer on it before any row is written.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use uuid::Uuid;

use coldwatch_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `saved_layouts` table.
#[derive(Debug, Clone, FromRow, Serialize, TS)]
#[ts(export)]
pub struct SavedLayout {
    pub id: DbId,
    pub organization_id: Uuid,
    pub entity_type: String,
    pub entity_id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub is_user_default: bool,
    pub layout_json: serde_json::Value,
    pub widget_prefs_json: serde_json::Value,
    pub timeline_state_json: serde_json::Value,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

/// DTO for creating a new saved layout.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct CreateSavedLayout {
    pub entity_type: String,
    pub entity_id: DbId,
    pub name: String,
    pub layout_json: serde_json::Value,
    pub widget_prefs_json: Option<serde_json::Value>,
    pub timeline_state_json: Option<serde_json::Value>,
}

/// DTO for partially updating a saved layout.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct UpdateSavedLayout {
    pub name: Option<String>,
    pub layout_json: Option<serde_json::Value>,
    pub widget_prefs_json: Option<serde_json::Value>,
    pub timeline_state_json: Option<serde_json::Value>,
}
