mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use common::{harness, harness_with_auth, Harness};
use layer_registry::app::ports::DocumentStorePort;
use layer_registry::constants::{
    CLIENT_HEADER, INVALID_REFRESH_ARGUMENT, MAX_REQUEST_BODY_BYTES, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};
use layer_registry::infra::signature::{sign, SharedSecretAuthenticator};
use layer_registry::server::create_server;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

const WMS: &str = "http://geo.example.com/wms";
const FEATURES: &str = "http://maps.example.com/arcgis/rest/services/Roads/MapServer/0";

fn app(h: &Harness) -> Router {
    create_server(h.state.clone())
}

fn request(method: &str, uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn wms_request() -> String {
    json!({ "en": { "service_url": WMS }, "fr": { "service_url": WMS } }).to_string()
}

#[tokio::test]
async fn health_is_reachable() {
    let h = harness();
    let (status, body) = send(app(&h), request("GET", "/health", "")).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], json!("healthy"));
}

#[tokio::test]
async fn put_registers_and_returns_the_key() {
    let h = harness();
    h.http.ogc_service(WMS);

    let (status, body) = send(app(&h), request("PUT", "/wms1", wms_request())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, "wms1");
    assert!(h.store.get("wms1").await.unwrap().is_some());
}

#[tokio::test]
async fn put_reports_schema_errors() {
    let h = harness();
    let (status, body) = send(
        app(&h),
        request("PUT", "/bad", json!({ "en": { "service_url": WMS } }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({ "errors": [r#""fr" is a required property"#] }));
}

#[tokio::test]
async fn unparsable_body_is_a_validation_error() {
    let h = harness();
    let (status, body) = send(app(&h), request("PUT", "/bad", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({ "errors": ["Unparsable json"] }));
}

#[tokio::test]
async fn update_of_missing_or_wrong_type_is_rejected() {
    let h = harness();
    h.http.ogc_service(WMS);

    let (status, body) = send(app(&h), request("POST", "/missing", r#"{"service_name":"x"}"#)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({ "errors": ["Record not found in database"] }));

    send(app(&h), request("PUT", "/wms1", wms_request())).await;
    let (status, body) = send(app(&h), request("POST", "/wms1", r#"{"service_name":"x"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({ "errors": ["Record is not a feature layer"] }));
}

#[tokio::test]
async fn update_of_feature_layer_succeeds() {
    let h = harness();
    h.http.esri_service(FEATURES, json!({ "type": "Feature Layer" }));
    let request_body =
        json!({ "en": { "service_url": FEATURES }, "fr": { "service_url": FEATURES } }).to_string();
    send(app(&h), request("PUT", "/roads", request_body)).await;

    let (status, body) = send(
        app(&h),
        request(
            "POST",
            "/roads",
            json!({ "en": { "service_name": "Roads" }, "fr": { "service_name": "Routes" } })
                .to_string(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "roads");
}

#[tokio::test]
async fn delete_returns_no_content_then_not_found() {
    let h = harness();
    h.http.ogc_service(WMS);
    send(app(&h), request("PUT", "/wms1", wms_request())).await;

    let (status, body) = send(app(&h), request("DELETE", "/wms1", "")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, body) = send(app(&h), request("DELETE", "/wms1", "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
}

#[tokio::test]
async fn refresh_validates_its_argument() {
    let h = harness();
    for arg in ["0", "-3", "soon"] {
        let (status, body) = send(app(&h), request("POST", &format!("/refresh/{arg}"), "")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "argument {arg}");
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({ "error": INVALID_REFRESH_ARGUMENT }));
    }
}

#[tokio::test]
async fn refresh_accepts_a_huge_day_count() {
    let h = harness();
    h.http.ogc_service(WMS);
    send(app(&h), request("PUT", "/wms1", wms_request())).await;

    let (status, body) = send(app(&h), request("POST", "/refresh/100000000", "")).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({ "updated": [], "errors": {} }));
}

#[tokio::test]
async fn refresh_returns_a_summary() {
    let h = harness();
    h.http.ogc_service(WMS);
    send(app(&h), request("PUT", "/wms1", wms_request())).await;

    let (status, body) = send(app(&h), request("POST", "/refresh/all", "")).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["updated"], json!(["wms1"]));
    assert_eq!(body["errors"], json!({}));
}

fn signed_harness() -> Harness {
    let clients = HashMap::from([("viewer".to_string(), "s3cret".to_string())]);
    harness_with_auth(Arc::new(SharedSecretAuthenticator::new(clients, 300)))
}

fn signed(method: &str, uri: &str, body: String, secret: &str, timestamp: &str) -> Request<Body> {
    let signature = sign(secret, method, uri, timestamp, body.as_bytes()).unwrap();
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CLIENT_HEADER, "viewer")
        .header(TIMESTAMP_HEADER, timestamp)
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn signed_requests_are_accepted() {
    let h = signed_harness();
    h.http.ogc_service(WMS);
    let now = Utc::now().to_rfc3339();

    let (status, _) = send(app(&h), signed("PUT", "/wms1", wms_request(), "s3cret", &now)).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn bad_signatures_are_rejected_before_any_work() {
    let h = signed_harness();
    h.http.ogc_service(WMS);

    let unsigned = request("PUT", "/wms1", wms_request());
    let (status, body) = send(app(&h), unsigned).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({ "errors": ["Invalid request signature"] }));

    let now = Utc::now().to_rfc3339();
    let wrong_secret = signed("PUT", "/wms1", wms_request(), "guess", &now);
    assert_eq!(send(app(&h), wrong_secret).await.0, StatusCode::UNAUTHORIZED);

    let stale = (Utc::now() - Duration::hours(1)).to_rfc3339();
    let replayed = signed("PUT", "/wms1", wms_request(), "s3cret", &stale);
    assert_eq!(send(app(&h), replayed).await.0, StatusCode::UNAUTHORIZED);

    // signature covers the body
    let mut tampered = signed("PUT", "/wms1", wms_request(), "s3cret", &now);
    *tampered.body_mut() = Body::from(json!({ "en": {}, "fr": {} }).to_string());
    assert_eq!(send(app(&h), tampered).await.0, StatusCode::UNAUTHORIZED);

    assert!(h.http.calls().is_empty());
    assert!(h.store.get("wms1").await.unwrap().is_none());
}

#[tokio::test]
async fn health_does_not_require_a_signature() {
    let h = signed_harness();
    let (status, _) = send(app(&h), request("GET", "/health", "")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn oversized_bodies_are_refused_before_the_signature_check() {
    let oversized = format!(
        r#"{{"en":{{"service_url":"{WMS}"}},"fr":{{"service_url":"{WMS}"}},"pad":"{}"}}"#,
        "x".repeat(MAX_REQUEST_BODY_BYTES)
    );
    for h in [signed_harness(), harness()] {
        h.http.ogc_service(WMS);
        let (status, body) = send(app(&h), request("PUT", "/wms1", oversized.clone())).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({ "errors": ["Request body too large"] }));
        assert!(h.http.calls().is_empty());
        assert!(h.store.get("wms1").await.unwrap().is_none());
    }
}

#[tokio::test]
async fn bodies_within_the_limit_are_accepted() {
    let h = harness();
    h.http.ogc_service(WMS);
    let padded = json!({
        "en": { "service_url": WMS, "notes": "x".repeat(MAX_REQUEST_BODY_BYTES / 2) },
        "fr": { "service_url": WMS }
    })
    .to_string();
    let (status, _) = send(app(&h), request("PUT", "/wms1", padded)).await;
    assert_eq!(status, StatusCode::CREATED);
}
