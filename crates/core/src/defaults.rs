//! Entity default layouts.
//!
//! One versioned, static default grid per entity type. The default is
//! the sanitizer's fallback target for unrepairable input, the cloning
//! source for new custom layouts, and the config behind the synthetic
//! immutable Default slot.

use crate::layout::{LayoutConfig, WidgetPosition, LAYOUT_SCHEMA_VERSION};
use crate::registry::builtin_definition;
use crate::types::EntityType;

/// Placement table: (widget id, x, y, w, h).
type Placement = (&'static str, u32, u32, u32, u32);

const UNIT_PLACEMENTS: &[Placement] = &[
    ("temperature_chart", 0, 0, 8, 6),
    ("current_temp", 8, 0, 4, 3),
    ("device_status", 8, 3, 4, 3),
    ("humidity_chart", 0, 6, 6, 4),
    ("door_events", 6, 6, 6, 4),
];

const UNIT_HIDDEN: &[&str] = &["battery_gauge", "signal_strength", "event_log"];

const SITE_PLACEMENTS: &[Placement] = &[
    ("unit_list", 0, 0, 8, 6),
    ("alert_feed", 8, 0, 4, 6),
    ("site_temperature_overview", 0, 6, 8, 4),
    ("gateway_status", 8, 6, 4, 4),
];

const SITE_HIDDEN: &[&str] = &["open_doors", "event_log"];

fn placements_for(entity_type: EntityType) -> (&'static [Placement], &'static [&'static str]) {
    match entity_type {
        EntityType::Unit => (UNIT_PLACEMENTS, UNIT_HIDDEN),
        EntityType::Site => (SITE_PLACEMENTS, SITE_HIDDEN),
    }
}

/// A fresh copy of the default layout configuration for an entity type.
pub fn default_layout_config(entity_type: EntityType) -> LayoutConfig {
    let (placements, hidden) = placements_for(entity_type);
    LayoutConfig {
        version: LAYOUT_SCHEMA_VERSION,
        widgets: placements.iter().map(|p| to_position(p)).collect(),
        hidden_widgets: hidden.iter().map(|id| id.to_string()).collect(),
    }
}

/// The default placement of a single widget, if it appears on the
/// entity's default grid.
pub fn default_position(entity_type: EntityType, widget_id: &str) -> Option<WidgetPosition> {
    let (placements, _) = placements_for(entity_type);
    placements
        .iter()
        .find(|(id, ..)| *id == widget_id)
        .map(to_position)
}

fn to_position(&(id, x, y, w, h): &Placement) -> WidgetPosition {
    // Defaults ship with the catalog's authoritative size bounds so they
    // are already in fully sanitized form.
    let def = builtin_definition(id);
    WidgetPosition {
        id: id.to_string(),
        x,
        y,
        w,
        h,
        min_w: def.map(|d| d.min_w),
        min_h: def.map(|d| d.min_h),
        max_w: def.map(|d| d.max_w),
        max_h: def.map(|d| d.max_h),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::WidgetRegistry;

    #[test]
    fn defaults_contain_every_mandatory_widget() {
        let registry = WidgetRegistry::builtin();
        for et in EntityType::ALL {
            let config = default_layout_config(*et);
            for def in registry.mandatory_for(*et) {
                assert!(config.contains_widget(def.id), "{} missing {}", et, def.id);
                assert!(!config.hidden_widgets.iter().any(|h| h == def.id));
            }
        }
    }

    #[test]
    fn defaults_have_no_overlaps() {
        for et in EntityType::ALL {
            let config = default_layout_config(*et);
            for (i, a) in config.widgets.iter().enumerate() {
                for b in &config.widgets[i + 1..] {
                    assert!(!a.intersects(b), "{} overlaps {} on {}", a.id, b.id, et);
                }
            }
        }
    }

    #[test]
    fn defaults_reference_only_known_widgets_within_bounds() {
        let registry = WidgetRegistry::builtin();
        for et in EntityType::ALL {
            let config = default_layout_config(*et);
            for pos in &config.widgets {
                let def = registry.get(&pos.id).expect("unknown widget in default");
                assert!(def.applies_to(*et), "{} not applicable to {}", pos.id, et);
                assert!(pos.w >= def.min_w && pos.w <= def.max_w, "{}", pos.id);
                assert!(pos.h >= def.min_h && pos.h <= def.max_h, "{}", pos.id);
            }
            for hidden in &config.hidden_widgets {
                let def = registry.get(hidden).expect("unknown hidden widget");
                assert!(!def.mandatory, "{hidden} is mandatory but hidden");
            }
        }
    }

    #[test]
    fn default_position_matches_default_layout() {
        let config = default_layout_config(EntityType::Unit);
        let pos = default_position(EntityType::Unit, "current_temp").unwrap();
        assert_eq!(config.position_of("current_temp"), Some(&pos));
        assert!(default_position(EntityType::Unit, "unit_list").is_none());
    }

    #[test]
    fn each_call_returns_a_fresh_copy() {
        let mut first = default_layout_config(EntityType::Unit);
        first.widgets.clear();
        let second = default_layout_config(EntityType::Unit);
        assert!(!second.widgets.is_empty());
    }
}
