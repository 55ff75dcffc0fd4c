//! Widget catalog endpoint powering the dashboard's widget picker.
//!
//! For each widget available on the entity type, returns the static
//! definition together with a compatibility verdict against the
//! device's capabilities, so the picker can grey out widgets the
//! hardware cannot feed.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use coldwatch_core::compat::{check_compatibility_by_sensor_type, CompatibilityResult};
use coldwatch_core::registry::WidgetDefinition;
use coldwatch_core::types::EntityType;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WidgetCatalogQuery {
    pub entity_type: String,
    /// Legacy sensor-type string of the device backing the dashboard.
    /// Absent means no sensor is assigned yet.
    pub sensor_type: Option<String>,
}

/// One catalog entry: the widget definition plus its verdict.
#[derive(Debug, Serialize)]
pub struct WidgetCatalogEntry {
    pub widget: WidgetDefinition,
    pub compatibility: CompatibilityResult,
}

/// GET /api/v1/widgets?entity_type=&sensor_type=
pub async fn list_widgets(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<WidgetCatalogQuery>,
) -> AppResult<impl IntoResponse> {
    let entity_type = EntityType::parse(&query.entity_type).map_err(AppError::Core)?;

    let entries: Vec<WidgetCatalogEntry> = state
        .registry
        .all_for(entity_type)
        .into_iter()
        .map(|def| WidgetCatalogEntry {
            widget: def.clone(),
            compatibility: check_compatibility_by_sensor_type(
                &state.registry,
                &state.capabilities,
                def.id,
                query.sensor_type.as_deref(),
            ),
        })
        .collect();

    Ok(Json(DataResponse { data: entries }))
}
