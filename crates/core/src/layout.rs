//! Layout configuration data model.
//!
//! A [`LayoutConfig`] is the persisted/drafted shape of a dashboard grid:
//! a list of positioned widgets plus the ids the user has hidden. The
//! JSON form is camelCase because the payload is produced and consumed
//! by the grid component in the web frontend.
//!
//! Invariants a well-formed config satisfies (enforced by
//! [`crate::sanitize::sanitize`], checked by [`crate::validate::validate`]):
//! - widget ids are unique and known to the registry
//! - every mandatory widget for the entity type is present and not hidden
//! - no two widget rectangles overlap
//! - each widget's size respects the registry's min/max bounds

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Grid constants
// ---------------------------------------------------------------------------

/// Number of columns in the dashboard grid.
pub const GRID_COLS: u32 = 12;

/// Current layout config schema version. Persisted payloads and drafts
/// carry this; an unsupported version is discarded, never migrated.
pub const LAYOUT_SCHEMA_VERSION: i32 = 2;

/// Maximum number of persisted custom layouts per (user, entity).
pub const MAX_CUSTOM_LAYOUTS: usize = 3;

/// Reserved id of the synthetic, immutable per-entity Default layout.
/// Never written to the persistence layer.
pub const DEFAULT_LAYOUT_ID: DbId = 0;

/// Sentinel id of a freshly created custom layout that has not been
/// saved yet. Real rows are BIGSERIAL and start at 1.
pub const UNSAVED_LAYOUT_ID: DbId = -1;

/// Maximum length of a custom layout name.
pub const MAX_LAYOUT_NAME_LEN: usize = 60;

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// One widget's placement on the grid, in grid units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetPosition {
    pub id: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_h: Option<u32>,
}

impl WidgetPosition {
    /// True if the occupied rectangles of `self` and `other` intersect.
    pub fn intersects(&self, other: &WidgetPosition) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

/// A full dashboard grid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    #[serde(default = "default_schema_version")]
    pub version: i32,
    pub widgets: Vec<WidgetPosition>,
    #[serde(default)]
    pub hidden_widgets: Vec<String>,
}

fn default_schema_version() -> i32 {
    LAYOUT_SCHEMA_VERSION
}

impl LayoutConfig {
    /// An empty config at the current schema version.
    pub fn empty() -> Self {
        Self {
            version: LAYOUT_SCHEMA_VERSION,
            widgets: Vec::new(),
            hidden_widgets: Vec::new(),
        }
    }

    pub fn contains_widget(&self, id: &str) -> bool {
        self.widgets.iter().any(|w| w.id == id)
    }

    pub fn position_of(&self, id: &str) -> Option<&WidgetPosition> {
        self.widgets.iter().find(|w| w.id == id)
    }
}

// ---------------------------------------------------------------------------
// Active (in-memory) layout
// ---------------------------------------------------------------------------

/// The layout currently being viewed or edited in a session.
///
/// Exactly one synthetic Default instance exists per entity
/// (`is_default && is_immutable`, id [`DEFAULT_LAYOUT_ID`]); everything
/// else is a mutable custom layout.
#[derive(Debug, Clone)]
pub struct ActiveLayout {
    pub id: DbId,
    pub name: String,
    pub is_default: bool,
    pub is_immutable: bool,
    pub config: LayoutConfig,
    /// Per-widget display preferences, opaque to the engine.
    pub widget_prefs: serde_json::Value,
    /// Timeline/zoom state of the dashboard, opaque to the engine.
    pub timeline_state: serde_json::Value,
    pub is_dirty: bool,
}

impl ActiveLayout {
    /// The synthetic immutable Default layout for an entity.
    pub fn synthetic_default(config: LayoutConfig) -> Self {
        Self {
            id: DEFAULT_LAYOUT_ID,
            name: "Default".to_string(),
            is_default: true,
            is_immutable: true,
            config,
            widget_prefs: serde_json::Value::Null,
            timeline_state: serde_json::Value::Null,
            is_dirty: false,
        }
    }

    /// A freshly created, not-yet-persisted custom layout.
    pub fn new_custom(name: String, config: LayoutConfig) -> Self {
        Self {
            id: UNSAVED_LAYOUT_ID,
            name,
            is_default: false,
            is_immutable: false,
            config,
            widget_prefs: serde_json::Value::Null,
            timeline_state: serde_json::Value::Null,
            is_dirty: true,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != DEFAULT_LAYOUT_ID && self.id != UNSAVED_LAYOUT_ID
    }
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

/// Validate a custom layout name: non-blank and within length limit.
pub fn validate_layout_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Layout name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_LAYOUT_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Layout name too long: {} chars (max {MAX_LAYOUT_NAME_LEN})",
            name.len()
        )));
    }
    Ok(())
}
