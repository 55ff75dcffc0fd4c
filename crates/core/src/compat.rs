//! Capability-based widget compatibility matching.
//!
//! Decides whether a widget can run against what a device actually
//! measures. Both entry points are pure and total: every input maps to
//! a [`CompatibilityResult`], never an error.

use serde::Serialize;

use crate::capability::{Capability, CapabilityCatalog};
use crate::registry::WidgetRegistry;

/// Verdict of matching one widget against an available capability set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityResult {
    /// The widget can be rendered at all.
    pub compatible: bool,
    /// Compatible, but some optional capabilities are missing and the
    /// widget will run with reduced functionality.
    pub partial: bool,
    /// Human-readable explanation when not fully compatible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub missing_required: Vec<Capability>,
    pub missing_optional: Vec<Capability>,
}

impl CompatibilityResult {
    fn full() -> Self {
        Self {
            compatible: true,
            partial: false,
            reason: None,
            missing_required: Vec::new(),
            missing_optional: Vec::new(),
        }
    }

    fn incompatible(reason: String, missing_required: Vec<Capability>) -> Self {
        Self {
            compatible: false,
            partial: false,
            reason: Some(reason),
            missing_required,
            missing_optional: Vec::new(),
        }
    }
}

/// Match a widget's capability requirements against an available set.
pub fn check_compatibility(
    registry: &WidgetRegistry,
    widget_id: &str,
    available: &[Capability],
) -> CompatibilityResult {
    let Some(def) = registry.get(widget_id) else {
        return CompatibilityResult::incompatible(
            format!("Unknown widget '{widget_id}'"),
            Vec::new(),
        );
    };

    // Widgets with no capability requirements render everywhere, even
    // when their optional feeds are absent.
    if def.required_capabilities.is_empty() {
        return CompatibilityResult::full();
    }

    let missing_required: Vec<Capability> = def
        .required_capabilities
        .iter()
        .copied()
        .filter(|c| !available.contains(c))
        .collect();

    if !missing_required.is_empty() {
        let names = CapabilityCatalog::display_names(&missing_required).join(", ");
        return CompatibilityResult::incompatible(format!("Requires {names}"), missing_required);
    }

    let missing_optional: Vec<Capability> = def
        .optional_capabilities
        .iter()
        .copied()
        .filter(|c| !available.contains(c))
        .collect();

    if missing_optional.is_empty() {
        return CompatibilityResult::full();
    }

    let names = CapabilityCatalog::display_names(&missing_optional).join(", ");
    CompatibilityResult {
        compatible: true,
        partial: true,
        reason: Some(format!("Limited functionality without {names}")),
        missing_required: Vec::new(),
        missing_optional,
    }
}

/// Match a widget against a legacy sensor-type string.
///
/// This is the sole fallback path for devices that predate capability
/// tagging. A device with no sensor assigned is incompatible with any
/// widget that requires capabilities.
pub fn check_compatibility_by_sensor_type(
    registry: &WidgetRegistry,
    catalog: &CapabilityCatalog,
    widget_id: &str,
    sensor_type: Option<&str>,
) -> CompatibilityResult {
    match sensor_type {
        Some(sensor_type) => {
            let available = catalog.capabilities_for_sensor_type(sensor_type);
            check_compatibility(registry, widget_id, available)
        }
        None => {
            let requires_capabilities = registry
                .get(widget_id)
                .map(|d| !d.required_capabilities.is_empty())
                // Unknown widgets fall through to check_compatibility for
                // the canonical "unknown widget" verdict.
                .unwrap_or(false);

            if requires_capabilities {
                CompatibilityResult::incompatible(
                    "No sensor assigned".to_string(),
                    Vec::new(),
                )
            } else {
                check_compatibility(registry, widget_id, &[])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> WidgetRegistry {
        WidgetRegistry::builtin()
    }

    #[test]
    fn unknown_widget_is_incompatible() {
        let result = check_compatibility(&registry(), "ghost_widget", &[Capability::Temperature]);
        assert!(!result.compatible);
        assert_eq!(result.reason.as_deref(), Some("Unknown widget 'ghost_widget'"));
    }

    #[test]
    fn no_required_capabilities_is_always_compatible() {
        // event_log requires nothing.
        let result = check_compatibility(&registry(), "event_log", &[]);
        assert!(result.compatible);
        assert!(!result.partial);
        assert!(result.reason.is_none());

        // The short-circuit also skips the optional check: device_status
        // has optional feeds but no requirements, so it is never partial.
        let result = check_compatibility(&registry(), "device_status", &[]);
        assert_eq!(result, CompatibilityResult::full());
    }

    #[test]
    fn missing_required_capability_lists_display_names() {
        // Scenario: humidity widget against a temperature-only device.
        let result =
            check_compatibility(&registry(), "humidity_chart", &[Capability::Temperature]);
        assert!(!result.compatible);
        assert_eq!(result.missing_required, vec![Capability::Humidity]);
        assert_eq!(result.reason.as_deref(), Some("Requires Humidity"));
    }

    #[test]
    fn missing_optional_capability_degrades_to_partial() {
        let result =
            check_compatibility(&registry(), "temperature_chart", &[Capability::Temperature]);
        assert!(result.compatible);
        assert!(result.partial);
        assert_eq!(result.missing_optional, vec![Capability::Humidity]);
        assert_eq!(
            result.reason.as_deref(),
            Some("Limited functionality without Humidity")
        );
    }

    #[test]
    fn full_capability_set_is_fully_compatible() {
        let result = check_compatibility(
            &registry(),
            "temperature_chart",
            &[Capability::Temperature, Capability::Humidity],
        );
        assert_eq!(result, CompatibilityResult::full());
    }

    #[test]
    fn compatibility_is_monotone_in_the_available_set() {
        // Growing the capability set can never break a compatible widget.
        let registry = registry();
        let small = &[Capability::Temperature];
        let large = Capability::ALL;
        for def in registry.all_for(crate::types::EntityType::Unit) {
            if check_compatibility(&registry, def.id, small).compatible {
                assert!(
                    check_compatibility(&registry, def.id, large).compatible,
                    "{} lost compatibility when capabilities grew",
                    def.id
                );
            }
        }
    }

    #[test]
    fn sensor_type_resolution_delegates_to_capability_match() {
        let registry = registry();
        let catalog = CapabilityCatalog::builtin();
        let result = check_compatibility_by_sensor_type(
            &registry,
            &catalog,
            "humidity_chart",
            Some("tempod-h"),
        );
        assert!(result.compatible);

        let result = check_compatibility_by_sensor_type(
            &registry,
            &catalog,
            "humidity_chart",
            Some("tempod"),
        );
        assert!(!result.compatible);
        assert_eq!(result.missing_required, vec![Capability::Humidity]);
    }

    #[test]
    fn no_sensor_assigned_blocks_capability_widgets_only() {
        let registry = registry();
        let catalog = CapabilityCatalog::builtin();

        let result =
            check_compatibility_by_sensor_type(&registry, &catalog, "current_temp", None);
        assert!(!result.compatible);
        assert_eq!(result.reason.as_deref(), Some("No sensor assigned"));

        // Widgets without required capabilities still render.
        let result = check_compatibility_by_sensor_type(&registry, &catalog, "event_log", None);
        assert!(result.compatible);
    }

    #[test]
    fn unknown_sensor_type_behaves_like_empty_capability_set() {
        let registry = registry();
        let catalog = CapabilityCatalog::builtin();
        let result = check_compatibility_by_sensor_type(
            &registry,
            &catalog,
            "current_temp",
            Some("quantum-probe"),
        );
        assert!(!result.compatible);
        assert_eq!(result.missing_required, vec![Capability::Temperature]);
    }
}
