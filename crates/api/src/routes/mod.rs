pub mod health;
pub mod layouts;
pub mod widgets;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /layouts                          list, create
/// /layouts/{id}                     get, update, delete
/// /layouts/{id}/default             set as user default (POST)
/// /layouts/default-config/{entity_type}   entity default config
///
/// /widgets                          catalog with compatibility verdicts
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/layouts", layouts::router())
        .nest("/widgets", widgets::router())
}
