//! Admin routing, validation and the API token guard.

use axum::http::{Method, StatusCode, header};
use serde_json::json;

use stern_integration_tests::{TestRequest, admin_app, lazy_pool};

const TOKEN: &str = "k3J9vQ2xR7mT4pW8zL1nB6cY5hF0dS";

#[tokio::test]
async fn test_health_is_not_guarded() {
    let app = admin_app(lazy_pool(), Some(TOKEN));
    let resp = TestRequest::get("/health").send(&app).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_api_requires_token() {
    let app = admin_app(lazy_pool(), Some(TOKEN));

    let missing = TestRequest::get("/api/stats").send(&app).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let wrong = TestRequest::get("/api/stats")
        .header(header::AUTHORIZATION, "Bearer nope")
        .send(&app)
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_reaches_handlers() {
    let app = admin_app(lazy_pool(), Some(TOKEN));

    // No mode: rejected by the handler, after the guard.
    let resp = TestRequest::new(Method::DELETE, "/api/products/1")
        .header(header::AUTHORIZATION, &format!("Bearer {TOKEN}"))
        .send(&app)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_requires_explicit_mode() {
    let app = admin_app(lazy_pool(), None);

    for uri in ["/api/products/1", "/api/customers/1", "/api/customers/1?mode=maybe"] {
        let resp = TestRequest::new(Method::DELETE, uri).send(&app).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let app = admin_app(lazy_pool(), None);

    let order = TestRequest::post("/api/orders")
        .json(json!({"customerId": "not-a-number", "items": []}))
        .send(&app)
        .await;
    assert_eq!(order.status, StatusCode::BAD_REQUEST);
    assert!(order.body["error"].is_string());

    let ret = TestRequest::post("/api/returns")
        .json(json!({"orderId": "1"}))
        .send(&app)
        .await;
    assert_eq!(ret.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_path_ids_get_json_errors() {
    let app = admin_app(lazy_pool(), Some(TOKEN));
    let bearer = format!("Bearer {TOKEN}");

    for (method, uri) in [
        (Method::GET, "/api/orders/abc"),
        (Method::GET, "/api/products/abc"),
        (Method::DELETE, "/api/products/abc?mode=soft"),
        (Method::DELETE, "/api/customers/abc?mode=soft"),
        (Method::DELETE, "/api/categories/abc"),
    ] {
        let resp = TestRequest::new(method, uri)
            .header(header::AUTHORIZATION, &bearer)
            .send(&app)
            .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(resp.body["error"].is_string(), "{uri}: {}", resp.body);
    }
}
