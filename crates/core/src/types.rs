//! Shared scalar types and the entity taxonomy.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// The kind of entity a dashboard layout is scoped to.
///
/// A *unit* is a single monitored asset (a fridge, freezer or cold room);
/// a *site* is a location grouping many units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Unit,
    Site,
}

impl EntityType {
    /// All entity types, in display order.
    pub const ALL: &'static [EntityType] = &[EntityType::Unit, EntityType::Site];

    /// The canonical lowercase string used in URLs, storage keys and rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Unit => "unit",
            EntityType::Site => "site",
        }
    }

    /// Parse the canonical lowercase string form.
    pub fn parse(s: &str) -> Result<EntityType, CoreError> {
        match s {
            "unit" => Ok(EntityType::Unit),
            "site" => Ok(EntityType::Site),
            other => Err(CoreError::Validation(format!(
                "Invalid entity type '{other}'. Must be one of: unit, site"
            ))),
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_round_trips_through_str() {
        for et in EntityType::ALL {
            assert_eq!(EntityType::parse(et.as_str()).unwrap(), *et);
        }
    }

    #[test]
    fn entity_type_rejects_unknown_strings() {
        assert!(EntityType::parse("gateway").is_err());
        assert!(EntityType::parse("").is_err());
        assert!(EntityType::parse("Unit").is_err());
    }

    #[test]
    fn entity_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EntityType::Unit).unwrap(),
            "\"unit\""
        );
        assert_eq!(
            serde_json::to_string(&EntityType::Site).unwrap(),
            "\"site\""
        );
    }
}
