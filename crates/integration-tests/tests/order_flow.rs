//! End-to-end workflows against `PostgreSQL`.
//!
//! These tests require `TEST_DATABASE_URL` and wipe that database. Run with:
//! `cargo test -p stern-integration-tests -- --ignored --test-threads=1`

use axum::Router;
use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use sqlx::PgPool;

use stern_integration_tests::{TestRequest, admin_app, fresh_database, storefront_app};

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

fn id(value: &Value) -> String {
    value.as_str().unwrap().to_owned()
}

async fn create_customer(admin: &Router, email: &str) -> String {
    let resp = TestRequest::post("/api/customers")
        .json(json!({"name": "Carla Méndez", "email": email, "city": "Monterrey"}))
        .send(admin)
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
    id(&resp.body["customerId"])
}

async fn create_product(admin: &Router, name: &str, category: &str, price: &str, stock: i32) -> String {
    let resp = TestRequest::post("/api/products")
        .json(json!({"name": name, "category": category, "price": price, "stock": stock}))
        .send(admin)
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
    id(&resp.body["productId"])
}

async fn stock_of(admin: &Router, product_id: &str) -> i64 {
    let resp = TestRequest::get(&format!("/api/products/{product_id}"))
        .send(admin)
        .await;
    resp.body["stock"].as_i64().unwrap()
}

async fn return_one(admin: &Router, order_id: &str, product_id: &str) -> (StatusCode, Value) {
    let resp = TestRequest::post("/api/returns")
        .json(json!({"orderId": order_id, "productId": product_id, "quantity": 1, "reason": "talla"}))
        .send(admin)
        .await;
    (resp.status, resp.body)
}

type FactRow = (
    i64,
    i64,
    i64,
    i64,
    i32,
    Decimal,
    Decimal,
    Decimal,
    Decimal,
    Decimal,
    String,
    String,
);

async fn staging_facts(pool: &PgPool) -> Vec<FactRow> {
    sqlx::query_as(
        r"
        SELECT sale_sk, customer_sk, product_sk, date_sk, quantity, unit_price,
               line_subtotal, discount, shipping, order_total, status, currency
        FROM staging.fact_sales
        ORDER BY sale_sk
        ",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_order_then_full_return() {
    let admin = admin_app(fresh_database().await, None);
    let customer = create_customer(&admin, "carla@example.mx").await;
    let product = create_product(&admin, "Tenis Runner", "Tenis", "100", 10).await;

    let created = TestRequest::post("/api/orders")
        .json(json!({"customerId": customer, "items": [{"productId": product, "quantity": 2}]}))
        .send(&admin)
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    let order = id(&created.body["orderId"]);

    let detail = TestRequest::get(&format!("/api/orders/{order}")).send(&admin).await;
    assert_eq!(decimal(&detail.body["total"]), dec!(200));
    assert_eq!(stock_of(&admin, &product).await, 8);

    let (status, first) = return_one(&admin, &order, &product).await;
    assert_eq!(status, StatusCode::OK, "{first:?}");
    assert_eq!(decimal(&first["refundAmount"]), dec!(100));
    assert_eq!(decimal(&first["newTotal"]), dec!(100));
    assert_eq!(first["newStatus"], "reembolsado_parcial");
    assert_eq!(stock_of(&admin, &product).await, 9);

    let (status, second) = return_one(&admin, &order, &product).await;
    assert_eq!(status, StatusCode::OK, "{second:?}");
    assert_eq!(decimal(&second["newTotal"]), Decimal::ZERO);
    assert_eq!(second["newStatus"], "reembolsado_total");
    assert_eq!(stock_of(&admin, &product).await, 10);

    let (status, _) = return_one(&admin, &order, &product).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(stock_of(&admin, &product).await, 10);

    let history = TestRequest::get(&format!("/api/returns?orderId={order}"))
        .send(&admin)
        .await;
    assert_eq!(history.body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_order_edit_and_delete_reconcile_stock() {
    let admin = admin_app(fresh_database().await, None);
    let customer = create_customer(&admin, "edit@example.mx").await;
    let product = create_product(&admin, "Gorra", "Accesorios", "150", 5).await;

    let created = TestRequest::post("/api/orders")
        .json(json!({"customerId": customer, "items": [{"productId": product, "quantity": 2}]}))
        .send(&admin)
        .await;
    let order = id(&created.body["orderId"]);
    assert_eq!(stock_of(&admin, &product).await, 3);

    let edited = TestRequest::new(Method::PATCH, "/api/orders")
        .json(json!({"orderId": order, "items": [{"productId": product, "quantity": 4}]}))
        .send(&admin)
        .await;
    assert_eq!(edited.status, StatusCode::OK, "{:?}", edited.body);
    assert_eq!(decimal(&edited.body["subtotal"]), dec!(600));
    assert_eq!(stock_of(&admin, &product).await, 1);

    let too_many = TestRequest::new(Method::PATCH, "/api/orders")
        .json(json!({"orderId": order, "items": [{"productId": product, "quantity": 6}]}))
        .send(&admin)
        .await;
    assert_eq!(too_many.status, StatusCode::CONFLICT);
    assert_eq!(stock_of(&admin, &product).await, 1);

    let deleted = TestRequest::new(Method::DELETE, "/api/orders")
        .json(json!({"orderId": order}))
        .send(&admin)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(stock_of(&admin, &product).await, 5);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_failed_order_create_leaves_no_trace() {
    let admin = admin_app(fresh_database().await, None);
    let customer = create_customer(&admin, "atomico@example.mx").await;
    let first = create_product(&admin, "Calcetas", "Ropa", "80", 10).await;
    let scarce = create_product(&admin, "Chamarra", "Ropa", "1200", 3).await;

    let short = TestRequest::post("/api/orders")
        .json(json!({
            "customerId": customer,
            "items": [
                {"productId": first, "quantity": 2},
                {"productId": scarce, "quantity": 4}
            ]
        }))
        .send(&admin)
        .await;
    assert_eq!(short.status, StatusCode::CONFLICT, "{:?}", short.body);
    assert_eq!(short.body["code"], "INSUFFICIENT_STOCK");

    let unknown = TestRequest::post("/api/orders")
        .json(json!({
            "customerId": customer,
            "items": [
                {"productId": first, "quantity": 2},
                {"productId": "987654321", "quantity": 1}
            ]
        }))
        .send(&admin)
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST, "{:?}", unknown.body);

    assert_eq!(stock_of(&admin, &first).await, 10);
    assert_eq!(stock_of(&admin, &scarce).await, 3);
    let orders = TestRequest::get("/api/orders").send(&admin).await;
    assert_eq!(orders.body.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_category_in_use_cannot_be_deleted() {
    let admin = admin_app(fresh_database().await, None);

    let tenis = TestRequest::post("/api/categories")
        .json(json!({"name": "Tenis"}))
        .send(&admin)
        .await;
    let unused = TestRequest::post("/api/categories")
        .json(json!({"name": "Temporada"}))
        .send(&admin)
        .await;
    create_product(&admin, "Tenis Runner", "Tenis", "100", 1).await;

    let blocked = TestRequest::new(
        Method::DELETE,
        &format!("/api/categories/{}", id(&tenis.body["categoryId"])),
    )
    .send(&admin)
    .await;
    assert_eq!(blocked.status, StatusCode::CONFLICT);
    assert_eq!(blocked.body["code"], "CATEGORY_IN_USE");

    let removed = TestRequest::new(
        Method::DELETE,
        &format!("/api/categories/{}", id(&unused.body["categoryId"])),
    )
    .send(&admin)
    .await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);

    let remaining = TestRequest::get("/api/categories").send(&admin).await;
    assert_eq!(remaining.body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_etl_reruns_insert_nothing_new() {
    let pool = fresh_database().await;
    let admin = admin_app(pool.clone(), None);
    let customer = create_customer(&admin, "etl@example.mx").await;
    let product = create_product(&admin, "Playera", "Ropa", "249", 20).await;
    TestRequest::post("/api/orders")
        .json(json!({"customerId": customer, "items": [{"productId": product, "quantity": 3}]}))
        .send(&admin)
        .await;

    let first = TestRequest::post("/api/etl/staging").send(&admin).await;
    assert_eq!(first.status, StatusCode::OK, "{:?}", first.body);
    assert_eq!(first.body["clientesInserted"], 1);
    assert_eq!(first.body["ventasInserted"], 1);
    let facts_before = staging_facts(&pool).await;

    let second = TestRequest::post("/api/etl/staging").send(&admin).await;
    assert_eq!(second.body["clientesInserted"], 0);
    assert_eq!(second.body["productosInserted"], 0);
    assert_eq!(second.body["fechasInserted"], 0);
    // Facts are truncated and reloaded.
    assert_eq!(second.body["ventasInserted"], 1);
    assert_eq!(staging_facts(&pool).await, facts_before);

    let first = TestRequest::post("/api/etl/warehouse").send(&admin).await;
    assert_eq!(first.status, StatusCode::OK, "{:?}", first.body);
    assert_eq!(first.body["ventasInserted"], 1);

    let second = TestRequest::post("/api/etl/warehouse").send(&admin).await;
    assert_eq!(
        second.body,
        json!({"clientesInserted": 0, "productosInserted": 0, "fechasInserted": 0, "ventasInserted": 0})
    );
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_storefront_checkout_and_payment() {
    let pool = fresh_database().await;
    let admin = admin_app(pool.clone(), None);
    let shop = storefront_app(pool);
    let product = create_product(&admin, "Sudadera", "Ropa", "500", 4).await;

    let added = TestRequest::post("/api/cart/items")
        .json(json!({"productId": product, "quantity": 10}))
        .send(&shop)
        .await;
    assert_eq!(added.status, StatusCode::OK, "{:?}", added.body);
    // Capped at stock.
    assert_eq!(added.body["itemCount"], 4);
    let cookie = added.cookie.clone();

    let cart = TestRequest::get("/api/cart")
        .cookie(cookie.as_deref())
        .send(&shop)
        .await;
    assert_eq!(cart.body["itemCount"], 4);

    let placed = TestRequest::post("/api/checkout/orders")
        .cookie(cookie.as_deref())
        .json(json!({
            "customer": {"name": "Luis Pérez", "email": "Luis@Example.mx"},
            "items": [{"productId": product, "quantity": 2}]
        }))
        .send(&shop)
        .await;
    assert_eq!(placed.status, StatusCode::CREATED, "{:?}", placed.body);
    assert_eq!(placed.body["currency"], "MXN");
    assert_eq!(decimal(&placed.body["total"]), dec!(1000));
    assert_eq!(stock_of(&admin, &product).await, 2);
    let order = id(&placed.body["orderId"]);

    let cart = TestRequest::get("/api/cart")
        .cookie(cookie.as_deref())
        .send(&shop)
        .await;
    assert_eq!(cart.body["items"], json!([]));

    let paid_uri = format!("/api/checkout/orders/{order}/paid");
    let paid = TestRequest::post(&paid_uri)
        .json(json!({"transactionId": "PAY-123", "raw": {"id": "PAY-123"}}))
        .send(&shop)
        .await;
    assert_eq!(paid.status, StatusCode::OK, "{:?}", paid.body);
    assert_eq!(paid.body["status"], "pagado");
    assert_eq!(paid.body["paymentStatus"], "COMPLETED");

    let repeat = TestRequest::post(&paid_uri)
        .json(json!({"transactionId": "PAY-123"}))
        .send(&shop)
        .await;
    assert_eq!(repeat.status, StatusCode::OK);

    let other = TestRequest::post(&paid_uri)
        .json(json!({"transactionId": "PAY-999"}))
        .send(&shop)
        .await;
    assert_eq!(other.status, StatusCode::CONFLICT);
    assert_eq!(other.body["code"], "ORDER_STATE");

    let short = TestRequest::post("/api/checkout/orders")
        .json(json!({
            "customer": {"name": "Luis Pérez", "email": "luis@example.mx"},
            "items": [{"productId": product, "quantity": 3}]
        }))
        .send(&shop)
        .await;
    assert_eq!(short.status, StatusCode::CONFLICT);
    assert_eq!(short.body["code"], "INSUFFICIENT_STOCK");
    assert_eq!(stock_of(&admin, &product).await, 2);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_accounts_and_reviews() {
    let pool = fresh_database().await;
    let admin = admin_app(pool.clone(), None);
    let shop = storefront_app(pool);
    let product = create_product(&admin, "Mochila", "Accesorios", "899", 3).await;

    let registered = TestRequest::post("/api/account/register")
        .json(json!({"name": "Sofía Ruiz", "email": "sofia@example.mx", "password": "secreto1"}))
        .send(&shop)
        .await;
    assert_eq!(registered.status, StatusCode::CREATED, "{:?}", registered.body);
    assert!(registered.body.get("passwordHash").is_none());

    let duplicate = TestRequest::post("/api/account/register")
        .json(json!({"name": "Otra", "email": "SOFIA@example.mx", "password": "secreto2"}))
        .send(&shop)
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.body["code"], "DUPLICATE");

    let wrong = TestRequest::post("/api/auth/login")
        .json(json!({"email": "sofia@example.mx", "password": "nope"}))
        .send(&shop)
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["error"], "Invalid credentials");

    let login = TestRequest::post("/api/auth/login")
        .json(json!({"email": "sofia@example.mx", "password": "secreto1"}))
        .send(&shop)
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let cookie = login.cookie.clone();
    assert!(cookie.is_some());

    let me = TestRequest::get("/api/auth/me")
        .cookie(cookie.as_deref())
        .send(&shop)
        .await;
    assert_eq!(me.body["email"], "sofia@example.mx");

    let profile = TestRequest::new(Method::PUT, "/api/account/profile")
        .cookie(cookie.as_deref())
        .json(json!({"name": "Sofía Ruiz Paz", "city": "Puebla", "password": ""}))
        .send(&shop)
        .await;
    assert_eq!(profile.status, StatusCode::OK, "{:?}", profile.body);
    assert_eq!(profile.body["city"], "Puebla");

    // Blank password kept the old one.
    let relogin = TestRequest::post("/api/auth/login")
        .json(json!({"email": "sofia@example.mx", "password": "secreto1"}))
        .send(&shop)
        .await;
    assert_eq!(relogin.status, StatusCode::OK);

    let reviews_uri = format!("/api/products/{product}/reviews");
    for rating in [5, 4] {
        let posted = TestRequest::post(&reviews_uri)
            .cookie(cookie.as_deref())
            .json(json!({"rating": rating, "comment": "  Muy buena  "}))
            .send(&shop)
            .await;
        assert_eq!(posted.status, StatusCode::CREATED, "{:?}", posted.body);
    }

    let out_of_range = TestRequest::post(&reviews_uri)
        .cookie(cookie.as_deref())
        .json(json!({"rating": 6}))
        .send(&shop)
        .await;
    assert_eq!(out_of_range.status, StatusCode::BAD_REQUEST);

    let summary = TestRequest::get(&reviews_uri).send(&shop).await;
    assert_eq!(summary.body["total"], 2);
    assert_eq!(decimal(&summary.body["average"]), dec!(4.5));
    assert_eq!(summary.body["reviews"][0]["comment"], "Muy buena");
    assert_eq!(summary.body["reviews"][0]["customerName"], "Sofía Ruiz Paz");

    let logout = TestRequest::post("/api/auth/logout")
        .cookie(cookie.as_deref())
        .send(&shop)
        .await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);

    let me = TestRequest::get("/api/auth/me")
        .cookie(cookie.as_deref())
        .send(&shop)
        .await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}
