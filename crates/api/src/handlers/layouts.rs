//! Handlers for saved dashboard layouts.
//!
//! The server is the last line of defence for layout invariants: every
//! `layout_json` that reaches the database goes through the engine's
//! sanitizer first, and the three-slot capacity limit is enforced by
//! the insert itself. Clients may send garbage; rows never contain it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use coldwatch_core::defaults::default_layout_config;
use coldwatch_core::error::CoreError;
use coldwatch_core::layout::validate_layout_name;
use coldwatch_core::sanitize::sanitize;
use coldwatch_core::types::{DbId, EntityType};
use coldwatch_db::models::layout::{CreateSavedLayout, UpdateSavedLayout};
use coldwatch_db::repositories::LayoutRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters selecting one entity's layouts.
#[derive(Debug, Deserialize)]
pub struct EntityScopeQuery {
    pub entity_type: String,
    pub entity_id: DbId,
}

// ---------------------------------------------------------------------------
// Saved layout endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/layouts?entity_type=&entity_id=
///
/// List the caller's saved layouts for one entity, in creation order.
pub async fn list_layouts(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(scope): Query<EntityScopeQuery>,
) -> AppResult<impl IntoResponse> {
    let entity_type = EntityType::parse(&scope.entity_type).map_err(AppError::Core)?;

    let layouts =
        LayoutRepo::list_for_entity(&state.pool, entity_type.as_str(), scope.entity_id, user.user_id)
            .await?;

    Ok(Json(DataResponse { data: layouts }))
}

/// POST /api/v1/layouts
///
/// Create a new saved layout for the caller. The payload's
/// `layout_json` is sanitized before the row is written; a full scope
/// rejects with 409.
pub async fn create_layout(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(mut input): Json<CreateSavedLayout>,
) -> AppResult<impl IntoResponse> {
    let entity_type = EntityType::parse(&input.entity_type).map_err(AppError::Core)?;
    validate_layout_name(&input.name).map_err(AppError::Core)?;

    let config = sanitize(&input.layout_json, entity_type, &state.registry);
    let version = config.version;
    input.layout_json = serde_json::to_value(config)
        .map_err(|e| AppError::InternalError(format!("Layout serialization failed: {e}")))?;

    let layout = LayoutRepo::create(&state.pool, user.organization_id, user.user_id, version, &input)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Layout limit reached: at most 3 custom layouts per dashboard".to_string(),
            ))
        })?;

    tracing::info!(
        layout_id = layout.id,
        user_id = user.user_id,
        entity_type = %layout.entity_type,
        entity_id = layout.entity_id,
        name = %layout.name,
        "Saved layout created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: layout })))
}

/// GET /api/v1/layouts/{id}
///
/// Retrieve a single saved layout owned by the caller.
pub async fn get_layout(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(layout_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let layout = LayoutRepo::find_by_id(&state.pool, layout_id, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "SavedLayout",
            id: layout_id,
        }))?;

    Ok(Json(DataResponse { data: layout }))
}

/// PUT /api/v1/layouts/{id}
///
/// Partially update a saved layout. A provided `layout_json` is
/// sanitized against the row's entity type before being stored.
pub async fn update_layout(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(layout_id): Path<DbId>,
    Json(mut input): Json<UpdateSavedLayout>,
) -> AppResult<impl IntoResponse> {
    let existing = LayoutRepo::find_by_id(&state.pool, layout_id, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "SavedLayout",
            id: layout_id,
        }))?;

    if let Some(name) = &input.name {
        validate_layout_name(name).map_err(AppError::Core)?;
    }
    if let Some(layout_json) = &input.layout_json {
        let entity_type = EntityType::parse(&existing.entity_type).map_err(AppError::Core)?;
        let config = sanitize(layout_json, entity_type, &state.registry);
        input.layout_json = Some(
            serde_json::to_value(config)
                .map_err(|e| AppError::InternalError(format!("Layout serialization failed: {e}")))?,
        );
    }

    let layout = LayoutRepo::update(&state.pool, layout_id, user.user_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "SavedLayout",
            id: layout_id,
        }))?;

    tracing::info!(layout_id, user_id = user.user_id, "Saved layout updated",);

    Ok(Json(DataResponse { data: layout }))
}

/// DELETE /api/v1/layouts/{id}
///
/// Delete a saved layout owned by the caller.
pub async fn delete_layout(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(layout_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = LayoutRepo::delete(&state.pool, layout_id, user.user_id).await?;

    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "SavedLayout",
            id: layout_id,
        }));
    }

    tracing::info!(layout_id, user_id = user.user_id, "Saved layout deleted",);

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/layouts/{id}/default
///
/// Flag a layout as the caller's default for its entity, clearing the
/// flag on every sibling.
pub async fn set_user_default(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(layout_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let found = LayoutRepo::set_user_default(&state.pool, layout_id, user.user_id).await?;

    if !found {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "SavedLayout",
            id: layout_id,
        }));
    }

    tracing::info!(layout_id, user_id = user.user_id, "User default layout set",);

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/layouts/default-config/{entity_type}
///
/// The immutable entity default layout configuration. This is what the
/// dashboard renders before any customization and what new custom
/// layouts start from.
pub async fn get_default_config(
    RequireAuth(_user): RequireAuth,
    Path(entity_type): Path<String>,
) -> AppResult<impl IntoResponse> {
    let entity_type = EntityType::parse(&entity_type).map_err(AppError::Core)?;

    Ok(Json(DataResponse {
        data: default_layout_config(entity_type),
    }))
}
