//! Route definitions for the widget catalog.

use axum::routing::get;
use axum::Router;

use crate::handlers::widgets;
use crate::state::AppState;

/// Widget catalog routes mounted at `/widgets`.
///
/// ```text
/// GET / -> list_widgets
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(widgets::list_widgets))
}
