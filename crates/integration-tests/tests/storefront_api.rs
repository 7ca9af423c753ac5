//! Storefront routing, validation, sessions and rate limiting.
//!
//! Every request here is answered before any query runs, so the pool is
//! lazy and never connects.

use axum::http::{Method, StatusCode};
use serde_json::json;

use stern_integration_tests::{TestRequest, lazy_pool, storefront_app};

#[tokio::test]
async fn test_health() {
    let app = storefront_app(lazy_pool());
    let resp = TestRequest::get("/health").send(&app).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_empty_cart() {
    let app = storefront_app(lazy_pool());
    let resp = TestRequest::get("/api/cart").send(&app).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["items"], json!([]));
    assert_eq!(resp.body["itemCount"], 0);
}

#[tokio::test]
async fn test_cart_updates_on_missing_lines_are_noops() {
    let app = storefront_app(lazy_pool());

    let resp = TestRequest::new(Method::PATCH, "/api/cart/items/5")
        .json(json!({"quantity": 3}))
        .send(&app)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["items"], json!([]));

    let resp = TestRequest::new(Method::DELETE, "/api/cart/items/5")
        .cookie(resp.cookie.as_deref())
        .send(&app)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["itemCount"], 0);

    let resp = TestRequest::new(Method::DELETE, "/api/cart").send(&app).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_bad_path_ids_get_json_errors() {
    let app = storefront_app(lazy_pool());

    let requests = [
        TestRequest::get("/api/products/abc"),
        TestRequest::get("/api/products/abc/reviews"),
        TestRequest::new(Method::PATCH, "/api/cart/items/abc").json(json!({"quantity": 1})),
        TestRequest::new(Method::DELETE, "/api/cart/items/abc"),
        TestRequest::post("/api/checkout/orders/abc/paid").json(json!({"transactionId": "T-1"})),
    ];
    for request in requests {
        let resp = request.send(&app).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert!(resp.body["error"].is_string(), "{}", resp.body);
    }
}

#[tokio::test]
async fn test_short_search_returns_nothing() {
    let app = storefront_app(lazy_pool());
    let resp = TestRequest::get("/api/search/products?q=%20a%20")
        .send(&app)
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!([]));
}

#[tokio::test]
async fn test_logged_out_customer_is_unauthorized() {
    let app = storefront_app(lazy_pool());

    let me = TestRequest::get("/api/auth/me").send(&app).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert_eq!(me.body["error"], "Login required");

    let review = TestRequest::post("/api/products/1/reviews")
        .json(json!({"rating": 5}))
        .send(&app)
        .await;
    assert_eq!(review.status, StatusCode::UNAUTHORIZED);

    let profile = TestRequest::new(Method::PUT, "/api/account/profile")
        .json(json!({"name": "Ana"}))
        .send(&app)
        .await;
    assert_eq!(profile.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_login() {
    let app = storefront_app(lazy_pool());
    let resp = TestRequest::post("/api/auth/logout").send(&app).await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_checkout_validation() {
    let app = storefront_app(lazy_pool());

    let no_customer = TestRequest::post("/api/checkout/orders")
        .json(json!({"items": [{"productId": "1", "quantity": 1}]}))
        .send(&app)
        .await;
    assert_eq!(no_customer.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_customer.body["error"], "customer name and email are required");

    let empty_cart = TestRequest::post("/api/checkout/orders")
        .json(json!({
            "customer": {"name": "Ana López", "email": "ana@example.mx"},
            "items": []
        }))
        .send(&app)
        .await;
    assert_eq!(empty_cart.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty_cart.body["error"], "cart is empty");
}

#[tokio::test]
async fn test_mark_paid_requires_transaction_id() {
    let app = storefront_app(lazy_pool());
    let resp = TestRequest::post("/api/checkout/orders/1/paid")
        .json(json!({"transactionId": "   "}))
        .send(&app)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_credential_routes_are_rate_limited() {
    let app = storefront_app(lazy_pool());

    // Malformed bodies are rejected before the database is touched.
    for _ in 0..5 {
        let resp = TestRequest::post("/api/auth/login")
            .json(json!({"email": 42}))
            .send(&app)
            .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    }

    let resp = TestRequest::post("/api/account/register")
        .json(json!({"email": 42}))
        .send(&app)
        .await;
    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);
}
