//! Sensor capability tokens and the sensor-type mapping catalog.
//!
//! Widgets declare what they need in terms of abstract [`Capability`]
//! tokens rather than concrete sensor hardware. Devices that predate
//! capability tagging only report a legacy sensor-type string; the
//! [`CapabilityCatalog`] translates those strings into capability sets.
//!
//! The catalog is an immutable lookup table built once at startup and
//! injected wherever it is needed; there is no ambient singleton.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An abstract sensing/feature token a widget may require or use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Temperature,
    Humidity,
    Door,
    Battery,
    Signal,
    Power,
}

impl Capability {
    /// All capabilities, in display order.
    pub const ALL: &'static [Capability] = &[
        Capability::Temperature,
        Capability::Humidity,
        Capability::Door,
        Capability::Battery,
        Capability::Signal,
        Capability::Power,
    ];

    /// Human-readable name used in compatibility messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Capability::Temperature => "Temperature",
            Capability::Humidity => "Humidity",
            Capability::Door => "Door state",
            Capability::Battery => "Battery level",
            Capability::Signal => "Signal strength",
            Capability::Power => "Power state",
        }
    }
}

/// Immutable mapping from legacy sensor-type strings to capability sets.
pub struct CapabilityCatalog {
    by_sensor_type: HashMap<&'static str, &'static [Capability]>,
}

impl CapabilityCatalog {
    /// Build the catalog for the sensor hardware this deployment supports.
    ///
    /// Unknown sensor types resolve to an empty capability set rather
    /// than an error; fleets routinely contain devices newer than the
    /// software that monitors them.
    pub fn builtin() -> Self {
        use Capability::*;

        let mut by_sensor_type: HashMap<&'static str, &'static [Capability]> = HashMap::new();
        by_sensor_type.insert("tempod", &[Temperature]);
        by_sensor_type.insert("tempod-h", &[Temperature, Humidity]);
        by_sensor_type.insert("door-beacon", &[Door, Battery]);
        by_sensor_type.insert(
            "multiprobe",
            &[Temperature, Humidity, Door, Battery, Signal],
        );
        by_sensor_type.insert("gateway", &[Signal, Power]);

        Self { by_sensor_type }
    }

    /// Capabilities provided by a legacy sensor type. Empty for unknown types.
    pub fn capabilities_for_sensor_type(&self, sensor_type: &str) -> &[Capability] {
        self.by_sensor_type
            .get(sensor_type)
            .copied()
            .unwrap_or(&[])
    }

    /// Display names for a set of capabilities, in the given order.
    pub fn display_names(capabilities: &[Capability]) -> Vec<&'static str> {
        capabilities.iter().map(|c| c.display_name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_sensor_types_resolve() {
        let catalog = CapabilityCatalog::builtin();
        assert_eq!(
            catalog.capabilities_for_sensor_type("tempod"),
            &[Capability::Temperature]
        );
        assert_eq!(
            catalog.capabilities_for_sensor_type("tempod-h"),
            &[Capability::Temperature, Capability::Humidity]
        );
        assert_eq!(
            catalog.capabilities_for_sensor_type("gateway"),
            &[Capability::Signal, Capability::Power]
        );
    }

    #[test]
    fn unknown_sensor_type_resolves_to_empty_set() {
        let catalog = CapabilityCatalog::builtin();
        assert!(catalog.capabilities_for_sensor_type("quantum-probe").is_empty());
        assert!(catalog.capabilities_for_sensor_type("").is_empty());
    }

    #[test]
    fn display_names_preserve_order() {
        let names =
            CapabilityCatalog::display_names(&[Capability::Humidity, Capability::Temperature]);
        assert_eq!(names, vec!["Humidity", "Temperature"]);
    }

    #[test]
    fn capability_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Capability::Battery).unwrap(),
            "\"battery\""
        );
        let parsed: Capability = serde_json::from_str("\"door\"").unwrap();
        assert_eq!(parsed, Capability::Door);
    }
}
