//! Total repair of layout configurations.
//!
//! [`sanitize`] turns *any* JSON payload into a [`LayoutConfig`] that
//! satisfies every invariant, falling back to the entity default when
//! the input is beyond repair. It never fails: a dashboard must always
//! have something usable to render.

use std::collections::HashSet;

use serde_json::Value;

use crate::defaults::{default_layout_config, default_position};
use crate::layout::{LayoutConfig, WidgetPosition, LAYOUT_SCHEMA_VERSION};
use crate::registry::{WidgetDefinition, WidgetRegistry};
use crate::types::EntityType;
use crate::validate::validate;

/// Repair a raw layout payload into an invariant-satisfying config.
///
/// Steps, in order:
/// 1. Reject-and-fallback: any validation *error* returns a fresh copy
///    of the entity default.
/// 2. Drop widgets (and hidden entries) unknown to the registry.
/// 3. Insert any mandatory widget that is still missing, at its
///    position from the entity default layout.
/// 4. Strip mandatory ids from the hidden list.
/// 5. Clamp sizes to the registry bounds and overwrite the stored
///    min/max fields from the registry; the registry is authoritative,
///    never the persisted payload.
/// 6. Resolve overlaps by shifting widgets downward (see
///    [`resolve_overlaps`]).
pub fn sanitize(raw: &Value, entity_type: EntityType, registry: &WidgetRegistry) -> LayoutConfig {
    let report = validate(raw, entity_type, registry);
    if !report.is_valid {
        tracing::warn!(
            entity_type = %entity_type,
            errors = report.errors.len(),
            "Layout config unrepairable, falling back to entity default"
        );
        return default_layout_config(entity_type);
    }

    let mut config = parse_validated(raw);

    // Unknown ids: validated as warnings, removed here.
    config.widgets.retain(|w| registry.get(&w.id).is_some());
    let visible: HashSet<String> = config.widgets.iter().map(|w| w.id.clone()).collect();
    let mut seen_hidden = HashSet::new();
    config.hidden_widgets.retain(|id| {
        registry.get(id).is_some() && !visible.contains(id) && seen_hidden.insert(id.clone())
    });

    for def in registry.mandatory_for(entity_type) {
        if !config.contains_widget(def.id) {
            config.widgets.push(mandatory_placement(entity_type, def));
        }
        config.hidden_widgets.retain(|id| id != def.id);
    }

    for pos in &mut config.widgets {
        // Known to exist after the retain above.
        if let Some(def) = registry.get(&pos.id) {
            clamp_to_definition(pos, def);
        }
    }

    resolve_overlaps(&mut config.widgets);

    config.version = LAYOUT_SCHEMA_VERSION;
    config
}

/// Build a [`LayoutConfig`] from a payload that already passed
/// validation. Lenient on the fields validation does not bound (an
/// oversized `h` saturates and is clamped to the registry maximum in a
/// later step); stored min/max fields are discarded.
fn parse_validated(raw: &Value) -> LayoutConfig {
    let widgets = raw["widgets"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let id = entry.get("id")?.as_str()?;
                    Some(WidgetPosition {
                        id: id.to_string(),
                        x: u32_field(entry, "x"),
                        y: u32_field(entry, "y"),
                        w: u32_field(entry, "w"),
                        h: u32_field(entry, "h"),
                        min_w: None,
                        min_h: None,
                        max_w: None,
                        max_h: None,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let hidden_widgets = raw
        .get("hiddenWidgets")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    LayoutConfig {
        version: LAYOUT_SCHEMA_VERSION,
        widgets,
        hidden_widgets,
    }
}

fn u32_field(entry: &Value, name: &str) -> u32 {
    entry
        .get(name)
        .and_then(Value::as_u64)
        .map(|v| v.min(u32::MAX as u64) as u32)
        .unwrap_or(0)
}

/// Placement for a mandatory widget that has to be re-inserted: its
/// spot on the entity default grid, or a registry-sized widget at the
/// top-left as a last resort (overlap resolution will find it a row).
fn mandatory_placement(entity_type: EntityType, def: &WidgetDefinition) -> WidgetPosition {
    default_position(entity_type, def.id).unwrap_or(WidgetPosition {
        id: def.id.to_string(),
        x: 0,
        y: 0,
        w: def.default_w,
        h: def.default_h,
        min_w: None,
        min_h: None,
        max_w: None,
        max_h: None,
    })
}

fn clamp_to_definition(pos: &mut WidgetPosition, def: &WidgetDefinition) {
    pos.w = pos.w.clamp(def.min_w, def.max_w);
    pos.h = pos.h.clamp(def.min_h, def.max_h);
    pos.min_w = Some(def.min_w);
    pos.min_h = Some(def.min_h);
    pos.max_w = Some(def.max_w);
    pos.max_h = Some(def.max_h);
}

/// Deterministic, monotonic-downward overlap resolution.
///
/// Widgets are processed in `(y, x)` order (stable for ties). Each one
/// keeps its `x` and is pushed down one row at a time until its
/// rectangle is free of every already-placed cell. Vertical compactness
/// is deliberately traded for determinism; never "improve" this with
/// horizontal repacking.
pub fn resolve_overlaps(widgets: &mut Vec<WidgetPosition>) {
    widgets.sort_by_key(|w| (w.y, w.x));

    let mut occupied: HashSet<(u32, u32)> = HashSet::new();

    for pos in widgets.iter_mut() {
        while rect_hits(&occupied, pos) {
            pos.y += 1;
        }
        for x in pos.x..pos.x + pos.w {
            for y in pos.y..pos.y + pos.h {
                occupied.insert((x, y));
            }
        }
    }

    // Shifting can leave the sequence unsorted relative to the final
    // coordinates; emit in canonical (y, x) order so repeated
    // sanitization is a fixed point.
    widgets.sort_by_key(|w| (w.y, w.x));
}

fn rect_hits(occupied: &HashSet<(u32, u32)>, pos: &WidgetPosition) -> bool {
    (pos.x..pos.x + pos.w)
        .any(|x| (pos.y..pos.y + pos.h).any(|y| occupied.contains(&(x, y))))
}
