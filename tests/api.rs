//! Runs against a live server and database:
//! `cargo test -- --ignored` with the server listening on `PORT`.
//! Checkout flows expect the demo payment gateway (no `STRIPE_SECRET_KEY`).

use pretty_assertions::assert_eq;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use serial_test::serial;
use sqlx::PgPool;
use url::Url;

use crate::setup::setup_test;

mod setup;

/// Fresh client address, so rate limits do not leak between tests or runs.
fn client_address() -> String {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    format!("10.{}.{}.{}", bytes[0], bytes[1], bytes[2])
}

async fn login(client: &Client, url: &Url, email: &str, password: &str) -> reqwest::Response {
    client
        .post(url.join("/api/auth/login").unwrap())
        .header("x-forwarded-for", client_address())
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap()
}

async fn register(client: &Client, url: &Url, email: &str, role: &str) -> reqwest::Response {
    client
        .post(url.join("/api/auth/register").unwrap())
        .header("x-forwarded-for", client_address())
        .json(&json!({
            "name": "Test Person",
            "email": email,
            "password": "password123",
            "role": role,
            "dietary_preferences": "vegan",
            "spice_level": "extreme",
            "preferred_cuisines": ["South Indian"],
        }))
        .send()
        .await
        .unwrap()
}

async fn access_token(client: &Client, url: &Url, email: &str) -> String {
    let res = register(client, url, email, "customer").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["access_token"].as_str().unwrap().to_string()
}

async fn send_json(
    client: &Client,
    method: Method,
    url: &Url,
    path: &str,
    token: &str,
    body: Value,
) -> reqwest::Response {
    client
        .request(method, url.join(path).unwrap())
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap()
}

/// Approved kitchen with one dish on the menu.
struct Kitchen {
    admin: String,
    producer: String,
    producer_id: i64,
    dish_id: i64,
}

/// Registered admins start inactive; the seeded admin was truncated away.
async fn admin_token(client: &Client, url: &Url, pool: &PgPool) -> String {
    let res = register(client, url, "admin@example.com", "admin").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();

    sqlx::query("UPDATE users SET is_active = TRUE WHERE email = $1")
        .bind("admin@example.com")
        .execute(pool)
        .await
        .unwrap();

    body["access_token"].as_str().unwrap().to_string()
}

async fn approve_kitchen(client: &Client, url: &Url, pool: &PgPool) -> (String, i64) {
    let admin = admin_token(client, url, pool).await;

    let res = register(client, url, "kitchen@example.com", "producer").await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(url.join("/api/admin/producers/pending").unwrap())
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let producer_id = body["producers"][0]["id"].as_i64().unwrap();

    let path = format!("/api/admin/producers/{producer_id}/approve");
    let res = send_json(client, Method::POST, url, &path, &admin, json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["producer"]["status"], "approved");

    (admin, producer_id)
}

async fn open_kitchen(client: &Client, url: &Url, pool: &PgPool) -> Kitchen {
    let (admin, producer_id) = approve_kitchen(client, url, pool).await;

    let res = login(client, url, "kitchen@example.com", "password123").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let producer = body["access_token"].as_str().unwrap().to_string();

    let dish = json!({ "name": "Masala Dosa", "price": 8.5, "max_orders_per_day": 10 });
    let res = send_json(client, Method::POST, url, "/api/dishes", &producer, dish).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    let dish_id = body["dish"]["id"].as_i64().unwrap();

    Kitchen {
        admin,
        producer,
        producer_id,
        dish_id,
    }
}

/// Customer token and the id of their confirmed order.
async fn place_order(client: &Client, url: &Url, kitchen: &Kitchen, email: &str) -> (String, i64) {
    let token = access_token(client, url, email).await;

    let line = json!({ "dish_id": kitchen.dish_id, "quantity": 2 });
    let res = send_json(client, Method::POST, url, "/api/cart", &token, line).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let address = json!({ "delivery_address": "1 High Street" });
    let path = "/api/checkout/create-payment-intent";
    let res = send_json(client, Method::POST, url, path, &token, address).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let intent = body["payment_intent_id"].as_str().unwrap().to_string();

    let confirm = json!({
        "payment_intent_id": intent,
        "delivery_address": "1 High Street",
        "delivery_instructions": "Ring twice",
    });
    let res = send_json(client, Method::POST, url, "/api/checkout/confirm-order", &token, confirm).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["order"]["status"], "new");
    assert_eq!(body["order"]["payment_status"], "paid");
    assert_eq!(body["order"]["producer_id"], kitchen.producer_id);

    (token, body["order"]["id"].as_i64().unwrap())
}

#[tokio::test]
#[serial]
#[ignore]
async fn health() {
    let (client, url, _pool) = setup_test().await;

    let res = client.get(url.join("/api/auth/health").unwrap()).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
#[serial]
#[ignore]
async fn register_login_and_me() {
    let (client, url, _pool) = setup_test().await;

    let res = register(&client, &url, "customer@example.com", "customer").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["role"], "customer");
    assert_eq!(body["user"]["is_active"], true);
    assert_eq!(body["user"]["dietary_preferences"], "vegan");
    assert_eq!(body["user"]["spice_level"], "medium");

    let res = login(&client, &url, "customer@example.com", "password123").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let token = body["access_token"].as_str().unwrap();

    let res = client
        .get(url.join("/api/auth/me").unwrap())
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["email"], "customer@example.com");

    let res = login(&client, &url, "customer@example.com", "wrong-password1").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
#[ignore]
async fn duplicate_email_conflicts() {
    let (client, url, _pool) = setup_test().await;

    let first = register(&client, &url, "twice@example.com", "customer").await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = register(&client, &url, "twice@example.com", "producer").await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[serial]
#[ignore]
async fn inactive_producer_cannot_login() {
    let (client, url, _pool) = setup_test().await;

    let res = register(&client, &url, "kitchen@example.com", "producer").await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = login(&client, &url, "kitchen@example.com", "password123").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[serial]
#[ignore]
async fn token_is_required() {
    let (client, url, _pool) = setup_test().await;

    let res = client.get(url.join("/api/cart").unwrap()).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(url.join("/api/cart").unwrap())
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
#[ignore]
async fn customer_is_not_admin() {
    let (client, url, _pool) = setup_test().await;
    let token = access_token(&client, &url, "nosy@example.com").await;

    let res = client
        .get(url.join("/api/admin/dashboard").unwrap())
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[serial]
#[ignore]
async fn empty_cart_checkout() {
    let (client, url, _pool) = setup_test().await;
    let token = access_token(&client, &url, "hungry@example.com").await;

    let res = client
        .get(url.join("/api/cart").unwrap())
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "items": [], "total": 0.0, "count": 0 }));

    let res = client
        .post(url.join("/api/checkout/create-payment-intent").unwrap())
        .bearer_auth(&token)
        .json(&json!({ "delivery_address": "1 High Street" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
#[ignore]
async fn empty_dish_listing() {
    let (client, url, _pool) = setup_test().await;

    let res = client
        .get(url.join("/api/dishes?page=2&per_page=5").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "dishes": [], "total": 0, "page": 2, "per_page": 5, "pages": 0 })
    );

    let res = client.get(url.join("/api/dishes/999").unwrap()).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
#[ignore]
async fn reset_password_is_rate_limited() {
    let (client, url, _pool) = setup_test().await;
    let address = client_address();

    for _ in 0..5 {
        let res = client
            .post(url.join("/api/auth/reset-password").unwrap())
            .header("x-forwarded-for", &address)
            .json(&json!({ "email": "ghost@example.com", "new_password": "password123" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    let res = client
        .post(url.join("/api/auth/reset-password").unwrap())
        .header("x-forwarded-for", &address)
        .json(&json!({ "email": "ghost@example.com", "new_password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
#[serial]
#[ignore]
async fn preflight_is_answered() {
    let (client, url, _pool) = setup_test().await;

    let res = client
        .request(Method::OPTIONS, url.join("/api/orders/1/status").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
#[serial]
#[ignore]
async fn approval_activates_kitchen_owner() {
    let (client, url, pool) = setup_test().await;
    let admin = admin_token(&client, &url, &pool).await;

    let res = register(&client, &url, "kitchen@example.com", "producer").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = login(&client, &url, "kitchen@example.com", "password123").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(url.join("/api/admin/producers/pending").unwrap())
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let producer_id = body["producers"][0]["id"].as_i64().unwrap();

    let path = format!("/api/admin/producers/{producer_id}/approve");
    let res = send_json(&client, Method::POST, &url, &path, &admin, json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = login(&client, &url, "kitchen@example.com", "password123").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["is_active"], true);

    let res = send_json(&client, Method::POST, &url, &path, &admin, json!({})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(url.join("/api/admin/producers/pending").unwrap())
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["producers"], json!([]));
}

#[tokio::test]
#[serial]
#[ignore]
async fn checkout_turns_cart_into_order() {
    let (client, url, pool) = setup_test().await;
    let kitchen = open_kitchen(&client, &url, &pool).await;

    let (token, order_id) = place_order(&client, &url, &kitchen, "hungry@example.com").await;

    let res = client
        .get(url.join("/api/cart").unwrap())
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["count"], 0);

    let res = client
        .get(url.join(&format!("/api/orders/{order_id}")).unwrap())
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["items"][0]["dish_id"], kitchen.dish_id);
    assert_eq!(body["items"][0]["quantity"], 2);
    assert_eq!(body["delivery_instructions"], "Ring twice");

    let res = client
        .get(url.join(&format!("/api/dishes/{}", kitchen.dish_id)).unwrap())
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["order_count"], 2);
    assert_eq!(body["current_day_orders"], 2);

    let path = "/api/checkout/confirm-order";
    let confirm = json!({ "payment_intent_id": "pi_demo_again", "delivery_address": "1 High Street" });
    let res = send_json(&client, Method::POST, &url, path, &token, confirm).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
#[ignore]
async fn kitchen_moves_order_through_statuses() {
    let (client, url, pool) = setup_test().await;
    let kitchen = open_kitchen(&client, &url, &pool).await;
    let (customer, order_id) = place_order(&client, &url, &kitchen, "hungry@example.com").await;

    let accept = format!("/api/orders/{order_id}/accept");
    let res = send_json(&client, Method::POST, &url, &accept, &kitchen.producer, json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["order"]["status"], "accepted");

    let res = send_json(&client, Method::POST, &url, &accept, &kitchen.producer, json!({})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let status = format!("/api/orders/{order_id}/status");
    let res = send_json(&client, Method::PUT, &url, &status, &customer, json!({ "status": "ready" })).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = send_json(&client, Method::PUT, &url, &status, &kitchen.producer, json!({ "status": "lost" })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = send_json(&client, Method::PUT, &url, &status, &kitchen.producer, json!({ "status": "preparing" })).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["order"]["status"], "preparing");
    assert!(body["order"]["prepared_at"].is_string());

    let res = send_json(&client, Method::PUT, &url, &status, &kitchen.producer, json!({ "status": "dispatched" })).await;
    let body: Value = res.json().await.unwrap();
    assert!(body["order"]["dispatched_at"].is_string());

    let res = send_json(&client, Method::PUT, &url, &status, &kitchen.admin, json!({ "status": "delivered" })).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["order"]["status"], "delivered");
    assert_eq!(body["order"]["payment_status"], "paid");
    assert!(body["order"]["delivered_at"].is_string());

    let reject = format!("/api/orders/{order_id}/reject");
    let res = send_json(&client, Method::POST, &url, &reject, &kitchen.producer, json!({})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
#[ignore]
async fn delivered_order_review_is_verified() {
    let (client, url, pool) = setup_test().await;
    let kitchen = open_kitchen(&client, &url, &pool).await;
    let (customer, order_id) = place_order(&client, &url, &kitchen, "hungry@example.com").await;

    let status = format!("/api/orders/{order_id}/status");
    let res = send_json(&client, Method::PUT, &url, &status, &kitchen.producer, json!({ "status": "delivered" })).await;
    assert_eq!(res.status(), StatusCode::OK);

    let review = json!({ "dish_id": kitchen.dish_id, "order_id": order_id, "rating": 5, "comment": "Crisp" });
    let res = send_json(&client, Method::POST, &url, "/api/reviews", &customer, review.clone()).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["review"]["is_verified"], true);
    assert_eq!(body["review"]["producer_id"], kitchen.producer_id);

    let res = send_json(&client, Method::POST, &url, "/api/reviews", &customer, review.clone()).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let stranger = access_token(&client, &url, "stranger@example.com").await;
    let res = send_json(&client, Method::POST, &url, "/api/reviews", &stranger, review).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["review"]["is_verified"], false);

    let too_high = json!({ "dish_id": kitchen.dish_id, "rating": 6 });
    let res = send_json(&client, Method::POST, &url, "/api/reviews", &stranger, too_high).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(url.join(&format!("/api/dishes/{}", kitchen.dish_id)).unwrap())
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["total_reviews"], 2);
}
