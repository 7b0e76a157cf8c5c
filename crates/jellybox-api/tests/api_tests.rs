//! Integration tests for the HTTP API.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` over an
//! in-memory repository, so no TCP listener or database is needed.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use jellybox_api::{AppState, build_router};
use jellybox_core::{BoxService, JellyboxConfig, MemoryRepository};
use jellybox_types::{Group, SpeciesMeta};
use serde_json::Value;
use tower::ServiceExt;

fn species(id: &str, name: &str, group: Group) -> SpeciesMeta {
    SpeciesMeta {
        id: id.to_owned(),
        name: name.to_owned(),
        group,
        description: format!("The {name}"),
        reproductive_rate: 0.0,
        draw_size: 1.0,
    }
}

fn config() -> JellyboxConfig {
    let mut config = JellyboxConfig::default();
    config.box_settings.styles = vec!["normal".to_owned(), "other".to_owned()];
    config
}

fn router_with(catalogue: Vec<SpeciesMeta>) -> Router {
    let repo = MemoryRepository::with_catalogue(catalogue, Vec::new());
    let service = BoxService::with_seed(repo, config(), 7);
    build_router(Arc::new(AppState::new(service)))
}

fn router() -> Router {
    router_with(vec![species("moon_jelly", "Moon Jelly", Group::Normal)])
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn post_json(path: &str, body: &Value) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn health_reports_ok() {
    let (status, json) = send(
        &router(),
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn open_creates_empty_box() {
    let (status, json) = send(
        &router(),
        Request::get("/api/boxes/onebot/42")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["record"]["user_id"], "42");
    assert_eq!(json["record"]["platform"], "onebot");
    assert_eq!(json["record"]["style"], "normal");
    assert!(json["record"]["inventory"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn catch_then_cooldown() {
    let router = router();
    let (status, json) = send(&router, post_json("/api/boxes/onebot/42/catch", &Value::Null)).await;
    assert_eq!(status, StatusCode::OK);
    let count = json["added"]["count"].as_u64().unwrap();
    assert!((4..=6).contains(&count));
    assert_eq!(json["added"]["species_id"], "moon_jelly");
    assert_eq!(json["record"]["inventory"]["moon_jelly"], count);

    let (status, json) = send(&router, post_json("/api/boxes/onebot/42/catch", &Value::Null)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["status"], 429);
    assert!(json["details"]["remaining_seconds"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn catch_with_empty_catalogue_conflicts() {
    let router = router_with(Vec::new());
    let (status, json) = send(&router, post_json("/api/boxes/onebot/7/catch", &Value::Null)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["status"], 409);
}

#[tokio::test]
async fn release_tokens_after_catch() {
    let router = router();
    let (_, caught) = send(&router, post_json("/api/boxes/onebot/42/catch", &Value::Null)).await;
    let count = caught["added"]["count"].clone();

    let body = serde_json::json!({ "tokens": ["Moon Jelly", "all"] });
    let (status, json) = send(&router, post_json("/api/boxes/onebot/42/release", &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["released"][0]["species_id"], "moon_jelly");
    assert_eq!(json["released"][0]["quantity"], count);
    assert!(json["record"]["inventory"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn release_structured_requests() {
    let router = router();
    send(&router, post_json("/api/boxes/onebot/42/catch", &Value::Null)).await;

    let body = serde_json::json!({ "requests": [{ "name": "moon_jelly", "quantity": 2 }] });
    let (status, json) = send(&router, post_json("/api/boxes/onebot/42/release", &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["released"][0]["quantity"], 2);
}

#[tokio::test]
async fn release_collects_every_problem() {
    let router = router();
    let body = serde_json::json!({
        "requests": [
            { "name": "ghost_jelly", "quantity": 1 },
            { "name": "moon_jelly", "quantity": "lots" }
        ]
    });
    let (status, json) = send(&router, post_json("/api/boxes/onebot/42/release", &body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let details = json["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(json["details"][0]["kind"], "unknown_species");
}

#[tokio::test]
async fn statistics_counts_population() {
    let router = router();
    let (_, caught) = send(&router, post_json("/api/boxes/onebot/42/catch", &Value::Null)).await;

    let (status, json) = send(
        &router,
        Request::get("/api/boxes/onebot/42/statistics")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["statistics"]["population"], caught["added"]["count"]);
    assert_eq!(json["statistics"]["entries"][0]["group"], "normal");
}

#[tokio::test]
async fn style_change_and_unknown_style() {
    let router = router();
    let set = |style: &str| {
        Request::put("/api/boxes/onebot/42/style")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "style": style }).to_string()))
            .unwrap()
    };

    let (status, json) = send(&router, set("other")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["record"]["style"], "other");

    let (status, json) = send(&router, set("neon")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"]["style"], "neon");
}

#[tokio::test]
async fn catalogue_with_and_without_box() {
    let router = router_with(vec![
        species("moon_jelly", "Moon Jelly", Group::Normal),
        species("crown", "Crown Jelly", Group::Perfect),
    ]);

    let (status, json) = send(
        &router,
        Request::get("/api/catalogue").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["species_id"], "crown");
    assert_eq!(json[1]["owned"], 0);

    let (status, json) = send(
        &router,
        Request::get("/api/catalogue?platform=onebot&user_id=42")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (status, _) = send(
        &router,
        Request::get("/api/catalogue?platform=onebot")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn nonexistent_route_returns_404() {
    let response = router()
        .oneshot(Request::get("/api/nonexistent").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
