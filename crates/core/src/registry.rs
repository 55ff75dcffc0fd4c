//! Static widget catalog for the dashboard.
//!
//! Every widget a user can place on a unit or site dashboard is described
//! here: its grid size bounds, whether it is mandatory, which entity
//! types it applies to, and which sensor capabilities it needs. The
//! catalog is built once at startup ([`WidgetRegistry::builtin`]) and
//! injected; definitions are never mutated afterwards.

use serde::Serialize;

use crate::capability::Capability;
use crate::types::EntityType;

// ---------------------------------------------------------------------------
// Definition types
// ---------------------------------------------------------------------------

/// Broad rendering category, used by the frontend widget picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetCategory {
    Chart,
    Stat,
    Status,
    List,
}

/// Which entity types a widget may be placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityScope {
    /// Available on every entity type.
    All,
    /// Available only on the listed entity types.
    Only(&'static [EntityType]),
}

impl EntityScope {
    pub fn includes(&self, entity_type: EntityType) -> bool {
        match self {
            EntityScope::All => true,
            EntityScope::Only(types) => types.contains(&entity_type),
        }
    }
}

/// A single widget definition from the static catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub category: WidgetCategory,
    /// Mandatory widgets must be visible in every layout for the entity
    /// types they apply to and can never be hidden.
    pub mandatory: bool,
    pub min_w: u32,
    pub min_h: u32,
    pub max_w: u32,
    pub max_h: u32,
    pub default_w: u32,
    pub default_h: u32,
    #[serde(skip)]
    pub entity_types: EntityScope,
    pub required_capabilities: &'static [Capability],
    pub optional_capabilities: &'static [Capability],
}

impl WidgetDefinition {
    pub fn applies_to(&self, entity_type: EntityType) -> bool {
        self.entity_types.includes(entity_type)
    }
}

// ---------------------------------------------------------------------------
// Builtin catalog
// ---------------------------------------------------------------------------

const UNIT: EntityScope = EntityScope::Only(&[EntityType::Unit]);
const SITE: EntityScope = EntityScope::Only(&[EntityType::Site]);

use Capability::{Battery, Door, Humidity, Power, Signal, Temperature};

/// The full widget catalog for the cold-chain deployment.
const CATALOG: &[WidgetDefinition] = &[
    // --- Unit widgets ---
    WidgetDefinition {
        id: "temperature_chart",
        title: "Temperature history",
        category: WidgetCategory::Chart,
        mandatory: true,
        min_w: 4,
        min_h: 3,
        max_w: 12,
        max_h: 8,
        default_w: 8,
        default_h: 6,
        entity_types: UNIT,
        required_capabilities: &[Temperature],
        optional_capabilities: &[Humidity],
    },
    WidgetDefinition {
        id: "current_temp",
        title: "Current temperature",
        category: WidgetCategory::Stat,
        mandatory: true,
        min_w: 2,
        min_h: 2,
        max_w: 6,
        max_h: 4,
        default_w: 4,
        default_h: 3,
        entity_types: UNIT,
        required_capabilities: &[Temperature],
        optional_capabilities: &[],
    },
    WidgetDefinition {
        id: "device_status",
        title: "Device status",
        category: WidgetCategory::Status,
        mandatory: true,
        min_w: 2,
        min_h: 2,
        max_w: 6,
        max_h: 4,
        default_w: 4,
        default_h: 3,
        entity_types: UNIT,
        required_capabilities: &[],
        optional_capabilities: &[Battery, Signal],
    },
    WidgetDefinition {
        id: "humidity_chart",
        title: "Humidity history",
        category: WidgetCategory::Chart,
        mandatory: false,
        min_w: 4,
        min_h: 3,
        max_w: 12,
        max_h: 8,
        default_w: 6,
        default_h: 4,
        entity_types: UNIT,
        required_capabilities: &[Humidity],
        optional_capabilities: &[Temperature],
    },
    WidgetDefinition {
        id: "door_events",
        title: "Door events",
        category: WidgetCategory::List,
        mandatory: false,
        min_w: 3,
        min_h: 3,
        max_w: 8,
        max_h: 8,
        default_w: 6,
        default_h: 4,
        entity_types: UNIT,
        required_capabilities: &[Door],
        optional_capabilities: &[],
    },
    WidgetDefinition {
        id: "battery_gauge",
        title: "Battery",
        category: WidgetCategory::Stat,
        mandatory: false,
        min_w: 2,
        min_h: 2,
        max_w: 4,
        max_h: 4,
        default_w: 3,
        default_h: 3,
        entity_types: UNIT,
        required_capabilities: &[Battery],
        optional_capabilities: &[],
    },
    WidgetDefinition {
        id: "signal_strength",
        title: "Signal strength",
        category: WidgetCategory::Stat,
        mandatory: false,
        min_w: 2,
        min_h: 2,
        max_w: 4,
        max_h: 4,
        default_w: 3,
        default_h: 3,
        entity_types: UNIT,
        required_capabilities: &[Signal],
        optional_capabilities: &[],
    },
    // --- Site widgets ---
    WidgetDefinition {
        id: "unit_list",
        title: "Units",
        category: WidgetCategory::List,
        mandatory: true,
        min_w: 4,
        min_h: 4,
        max_w: 12,
        max_h: 10,
        default_w: 8,
        default_h: 6,
        entity_types: SITE,
        required_capabilities: &[],
        optional_capabilities: &[],
    },
    WidgetDefinition {
        id: "alert_feed",
        title: "Alerts",
        category: WidgetCategory::List,
        mandatory: true,
        min_w: 3,
        min_h: 3,
        max_w: 6,
        max_h: 10,
        default_w: 4,
        default_h: 6,
        entity_types: SITE,
        required_capabilities: &[],
        optional_capabilities: &[],
    },
    WidgetDefinition {
        id: "site_temperature_overview",
        title: "Temperature overview",
        category: WidgetCategory::Chart,
        mandatory: false,
        min_w: 4,
        min_h: 3,
        max_w: 12,
        max_h: 8,
        default_w: 8,
        default_h: 4,
        entity_types: SITE,
        required_capabilities: &[Temperature],
        optional_capabilities: &[],
    },
    WidgetDefinition {
        id: "open_doors",
        title: "Open doors",
        category: WidgetCategory::Stat,
        mandatory: false,
        min_w: 2,
        min_h: 2,
        max_w: 6,
        max_h: 4,
        default_w: 4,
        default_h: 3,
        entity_types: SITE,
        required_capabilities: &[Door],
        optional_capabilities: &[],
    },
    WidgetDefinition {
        id: "gateway_status",
        title: "Gateway status",
        category: WidgetCategory::Status,
        mandatory: false,
        min_w: 3,
        min_h: 3,
        max_w: 6,
        max_h: 6,
        default_w: 4,
        default_h: 4,
        entity_types: SITE,
        required_capabilities: &[Signal],
        optional_capabilities: &[Power],
    },
    // --- Shared widgets ---
    WidgetDefinition {
        id: "event_log",
        title: "Event log",
        category: WidgetCategory::List,
        mandatory: false,
        min_w: 3,
        min_h: 3,
        max_w: 12,
        max_h: 10,
        default_w: 6,
        default_h: 4,
        entity_types: EntityScope::All,
        required_capabilities: &[],
        optional_capabilities: &[],
    },
];

/// Look up a definition in the builtin catalog without constructing a
/// registry. Used by the static default-layout tables.
pub(crate) fn builtin_definition(id: &str) -> Option<&'static WidgetDefinition> {
    CATALOG.iter().find(|d| d.id == id)
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable widget catalog, injected wherever widget metadata is needed.
pub struct WidgetRegistry {
    definitions: Vec<WidgetDefinition>,
}

impl WidgetRegistry {
    /// The catalog shipped with this deployment.
    pub fn builtin() -> Self {
        Self {
            definitions: CATALOG.to_vec(),
        }
    }

    /// A registry with custom definitions. Intended for tests.
    pub fn with_definitions(definitions: Vec<WidgetDefinition>) -> Self {
        Self { definitions }
    }

    /// Look up a definition by widget id.
    pub fn get(&self, id: &str) -> Option<&WidgetDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// All widgets that must be visible on every layout for `entity_type`.
    pub fn mandatory_for(&self, entity_type: EntityType) -> Vec<&WidgetDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.mandatory && d.applies_to(entity_type))
            .collect()
    }

    /// All widgets available for `entity_type`, in catalog order.
    pub fn all_for(&self, entity_type: EntityType) -> Vec<&WidgetDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.applies_to(entity_type))
            .collect()
    }
}
