//! Route definitions for the saved layout system.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::layouts;
use crate::state::AppState;

/// Layout routes mounted at `/layouts`.
///
/// ```text
/// GET    /                             -> list_layouts
/// POST   /                             -> create_layout
/// GET    /{id}                         -> get_layout
/// PUT    /{id}                         -> update_layout
/// DELETE /{id}                         -> delete_layout
/// POST   /{id}/default                 -> set_user_default
/// GET    /default-config/{entity_type} -> get_default_config
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(layouts::list_layouts).post(layouts::create_layout))
        .route(
            "/default-config/{entity_type}",
            get(layouts::get_default_config),
        )
        .route(
            "/{id}",
            get(layouts::get_layout)
                .put(layouts::update_layout)
                .delete(layouts::delete_layout),
        )
        .route("/{id}/default", post(layouts::set_user_default))
}
