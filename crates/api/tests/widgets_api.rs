//! HTTP-level integration tests for the `/widgets` catalog endpoint.

mod common;

use axum::http::StatusCode;
use common::{auth_token, body_json, build_test_app, get, get_unauthed};
use sqlx::PgPool;

const USER_ID: i64 = 7;

fn entry<'a>(catalog: &'a serde_json::Value, widget_id: &str) -> &'a serde_json::Value {
    catalog["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["widget"]["id"] == widget_id)
        .unwrap_or_else(|| panic!("{widget_id} missing from catalog"))
}

#[sqlx::test(migrations = "../db/migrations")]
async fn catalog_requires_auth(pool: PgPool) {
    let response = get_unauthed(build_test_app(pool), "/api/v1/widgets?entity_type=unit").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn verdicts_follow_the_device_sensor_type(pool: PgPool) {
    let response = get(
        build_test_app(pool),
        "/api/v1/widgets?entity_type=unit&sensor_type=tempod",
        &auth_token(USER_ID),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let catalog = body_json(response).await;

    // Temperature-only device: humidity widgets are out...
    let humidity = entry(&catalog, "humidity_chart");
    assert_eq!(humidity["compatibility"]["compatible"], false);
    assert_eq!(humidity["compatibility"]["missingRequired"][0], "humidity");

    // ...the temperature chart runs degraded without its optional feed...
    let chart = entry(&catalog, "temperature_chart");
    assert_eq!(chart["compatibility"]["compatible"], true);
    assert_eq!(chart["compatibility"]["partial"], true);

    // ...and capability-free widgets are untouched.
    let log = entry(&catalog, "event_log");
    assert_eq!(log["compatibility"]["compatible"], true);
    assert_eq!(log["compatibility"]["partial"], false);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_sensor_blocks_capability_widgets(pool: PgPool) {
    let response = get(
        build_test_app(pool),
        "/api/v1/widgets?entity_type=unit",
        &auth_token(USER_ID),
    )
    .await;
    let catalog = body_json(response).await;

    let current = entry(&catalog, "current_temp");
    assert_eq!(current["compatibility"]["compatible"], false);
    assert_eq!(current["compatibility"]["reason"], "No sensor assigned");

    let log = entry(&catalog, "event_log");
    assert_eq!(log["compatibility"]["compatible"], true);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn catalog_is_scoped_by_entity_type(pool: PgPool) {
    let response = get(
        build_test_app(pool),
        "/api/v1/widgets?entity_type=site&sensor_type=multiprobe",
        &auth_token(USER_ID),
    )
    .await;
    let catalog = body_json(response).await;
    let ids: Vec<&str> = catalog["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["widget"]["id"].as_str().unwrap())
        .collect();

    assert!(ids.contains(&"unit_list"));
    assert!(ids.contains(&"event_log"));
    assert!(!ids.contains(&"temperature_chart"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_entity_type_is_rejected(pool: PgPool) {
    let response = get(
        build_test_app(pool),
        "/api/v1/widgets?entity_type=warehouse",
        &auth_token(USER_ID),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
