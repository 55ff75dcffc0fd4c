//! Structural and semantic validation of layout configurations.
//!
//! Persisted and drafted payloads are duck-typed JSON and must never be
//! trusted directly; [`validate`] walks the raw value and reports every
//! violation it finds. Validation never mutates — repair is the
//! sanitizer's job ([`crate::sanitize`]).

use serde::Serialize;
use serde_json::Value;

use crate::layout::GRID_COLS;
use crate::registry::WidgetRegistry;
use crate::types::EntityType;

/// A single validation finding.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutIssue {
    /// The widget the issue concerns, when attributable to one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget: Option<String>,
    pub message: String,
}

impl LayoutIssue {
    fn config(message: impl Into<String>) -> Self {
        Self {
            widget: None,
            message: message.into(),
        }
    }

    fn widget(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            widget: Some(id.into()),
            message: message.into(),
        }
    }
}

/// Aggregated result of validating one layout configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<LayoutIssue>,
    pub warnings: Vec<LayoutIssue>,
}

impl ValidationReport {
    fn from_issues(errors: Vec<LayoutIssue>, warnings: Vec<LayoutIssue>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Validate a raw layout config payload against the grid invariants and
/// the mandatory-widget rules for `entity_type`.
///
/// A payload that is not even an object with a `widgets` array fails
/// with a single structural error and no further checks. Everything
/// else is collected: per-widget shape/range violations and duplicate
/// ids are errors, ids unknown to the registry are warnings (the
/// sanitizer removes them), and a missing or hidden mandatory widget is
/// an error.
pub fn validate(
    raw: &Value,
    entity_type: EntityType,
    registry: &WidgetRegistry,
) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Structural check: nothing else is meaningful without it.
    let Some(widgets) = raw.get("widgets").and_then(Value::as_array) else {
        errors.push(LayoutIssue::config(
            "Layout config must be an object with a 'widgets' array",
        ));
        return ValidationReport::from_issues(errors, warnings);
    };

    let mut seen_ids: Vec<&str> = Vec::new();

    for (index, entry) in widgets.iter().enumerate() {
        let Some(id) = valid_entry_id(index, entry, &mut errors) else {
            continue;
        };

        if seen_ids.contains(&id) {
            errors.push(LayoutIssue::widget(id, format!("Duplicate widget id '{id}'")));
        } else {
            seen_ids.push(id);
        }

        check_position_ranges(id, entry, &mut errors);

        if registry.get(id).is_none() {
            warnings.push(LayoutIssue::widget(
                id,
                format!("Unknown widget '{id}' will be removed"),
            ));
        }
    }

    let hidden = validate_hidden_list(raw, &mut errors);

    for def in registry.mandatory_for(entity_type) {
        if !seen_ids.contains(&def.id) {
            errors.push(LayoutIssue::widget(
                def.id,
                format!("Mandatory widget '{}' is missing", def.id),
            ));
        }
        if hidden.iter().any(|h| h == def.id) {
            errors.push(LayoutIssue::widget(
                def.id,
                format!("Mandatory widget '{}' cannot be hidden", def.id),
            ));
        }
    }

    ValidationReport::from_issues(errors, warnings)
}

/// Check an entry is an object with a non-empty string id; returns the id.
fn valid_entry_id<'a>(
    index: usize,
    entry: &'a Value,
    errors: &mut Vec<LayoutIssue>,
) -> Option<&'a str> {
    if !entry.is_object() {
        errors.push(LayoutIssue::config(format!(
            "Widget entry {index} is not an object"
        )));
        return None;
    }
    match entry.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Some(id),
        _ => {
            errors.push(LayoutIssue::config(format!(
                "Widget entry {index} has no string 'id'"
            )));
            None
        }
    }
}

/// Check the x/y/w/h fields of one entry against the grid invariants:
/// `x ∈ [0, 11]`, `w ∈ [1, 12]`, `h ≥ 1`, `y ≥ 0`, all integers.
fn check_position_ranges(id: &str, entry: &Value, errors: &mut Vec<LayoutIssue>) {
    let field = |name: &str| entry.get(name).and_then(Value::as_u64);

    match field("x") {
        Some(x) if x < GRID_COLS as u64 => {}
        Some(x) => errors.push(LayoutIssue::widget(id, format!("x out of range: {x}"))),
        None => errors.push(LayoutIssue::widget(id, "x must be a non-negative integer")),
    }
    match field("w") {
        Some(w) if (1..=GRID_COLS as u64).contains(&w) => {}
        Some(w) => errors.push(LayoutIssue::widget(id, format!("w out of range: {w}"))),
        None => errors.push(LayoutIssue::widget(id, "w must be a positive integer")),
    }
    match field("h") {
        Some(h) if h >= 1 => {}
        Some(h) => errors.push(LayoutIssue::widget(id, format!("h out of range: {h}"))),
        None => errors.push(LayoutIssue::widget(id, "h must be a positive integer")),
    }
    if field("y").is_none() {
        errors.push(LayoutIssue::widget(id, "y must be a non-negative integer"));
    }
}

/// Validate the optional `hiddenWidgets` list and return its string ids.
fn validate_hidden_list(raw: &Value, errors: &mut Vec<LayoutIssue>) -> Vec<String> {
    match raw.get("hiddenWidgets") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => {
            let mut hidden = Vec::new();
            for entry in entries {
                match entry.as_str() {
                    Some(id) => hidden.push(id.to_string()),
                    None => errors.push(LayoutIssue::config(
                        "hiddenWidgets entries must be widget id strings",
                    )),
                }
            }
            hidden
        }
        Some(_) => {
            errors.push(LayoutIssue::config("hiddenWidgets must be an array"));
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_layout_config;
    use serde_json::json;

    fn registry() -> WidgetRegistry {
        WidgetRegistry::builtin()
    }

    #[test]
    fn default_layouts_validate_cleanly() {
        for et in EntityType::ALL {
            let raw = serde_json::to_value(default_layout_config(*et)).unwrap();
            let report = validate(&raw, *et, &registry());
            assert!(report.is_valid, "{et}: {:?}", report.errors);
            assert!(report.warnings.is_empty());
        }
    }

    #[test]
    fn non_object_payload_fails_structurally_with_one_error() {
        for raw in [json!(null), json!([]), json!("layout"), json!({ "widgets": 5 })] {
            let report = validate(&raw, EntityType::Unit, &registry());
            assert!(!report.is_valid);
            assert_eq!(report.errors.len(), 1, "{raw}");
        }
    }

    #[test]
    fn range_violations_are_collected_not_fatal() {
        let raw = json!({
            "widgets": [
                { "id": "temperature_chart", "x": 14, "y": 0, "w": 0, "h": 6 },
                { "id": "current_temp", "x": 8, "y": 0, "w": 4, "h": 3 },
                { "id": "device_status", "x": 8, "y": 3, "w": 4, "h": 3 },
            ],
        });
        let report = validate(&raw, EntityType::Unit, &registry());
        assert!(!report.is_valid);
        // Both violations on the first entry are reported.
        let messages: Vec<&str> = report.errors.iter().map(|e| e.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("x out of range: 14")));
        assert!(messages.iter().any(|m| m.contains("w out of range: 0")));
    }

    #[test]
    fn negative_and_fractional_coordinates_are_rejected() {
        let raw = json!({
            "widgets": [
                { "id": "current_temp", "x": -1, "y": 0.5, "w": 4, "h": 3 },
            ],
        });
        let report = validate(&raw, EntityType::Unit, &registry());
        let messages: Vec<&str> = report.errors.iter().map(|e| e.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("x must be")));
        assert!(messages.iter().any(|m| m.contains("y must be")));
    }

    #[test]
    fn duplicate_ids_error_per_duplicate() {
        let raw = json!({
            "widgets": [
                { "id": "temperature_chart", "x": 0, "y": 0, "w": 8, "h": 6 },
                { "id": "current_temp", "x": 8, "y": 0, "w": 4, "h": 3 },
                { "id": "current_temp", "x": 8, "y": 3, "w": 4, "h": 3 },
                { "id": "current_temp", "x": 8, "y": 6, "w": 4, "h": 3 },
                { "id": "device_status", "x": 0, "y": 6, "w": 4, "h": 3 },
            ],
        });
        let report = validate(&raw, EntityType::Unit, &registry());
        let duplicates = report
            .errors
            .iter()
            .filter(|e| e.message.contains("Duplicate"))
            .count();
        assert_eq!(duplicates, 2);
    }

    #[test]
    fn unknown_widget_is_a_warning_not_an_error() {
        let mut raw = serde_json::to_value(default_layout_config(EntityType::Unit)).unwrap();
        raw["widgets"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "id": "retired_widget", "x": 0, "y": 20, "w": 4, "h": 3 }));
        let report = validate(&raw, EntityType::Unit, &registry());
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].message.contains("will be removed"));
    }

    #[test]
    fn missing_mandatory_widget_is_an_error() {
        let raw = json!({
            "widgets": [
                { "id": "temperature_chart", "x": 0, "y": 0, "w": 8, "h": 6 },
            ],
        });
        let report = validate(&raw, EntityType::Unit, &registry());
        assert!(!report.is_valid);
        let missing: Vec<&str> = report
            .errors
            .iter()
            .filter(|e| e.message.contains("is missing"))
            .filter_map(|e| e.widget.as_deref())
            .collect();
        assert_eq!(missing, vec!["current_temp", "device_status"]);
    }

    #[test]
    fn hidden_mandatory_widget_is_an_error() {
        let mut config = default_layout_config(EntityType::Unit);
        config.hidden_widgets.push("current_temp".to_string());
        let raw = serde_json::to_value(config).unwrap();
        let report = validate(&raw, EntityType::Unit, &registry());
        assert!(!report.is_valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.message.contains("cannot be hidden")));
    }

    #[test]
    fn malformed_hidden_list_is_an_error() {
        let mut raw = serde_json::to_value(default_layout_config(EntityType::Unit)).unwrap();
        raw["hiddenWidgets"] = json!("battery_gauge");
        let report = validate(&raw, EntityType::Unit, &registry());
        assert!(!report.is_valid);
    }
}
