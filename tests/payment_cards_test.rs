mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::TestApp;
use storefront_api::models::OrderStatus;

fn card_body(number: &str) -> serde_json::Value {
    json!({
        "card_number": number,
        "expiration_month": 11,
        "expiration_year": 2030,
        "security_code": "123",
        "cardholder_name": "TEST USER",
    })
}

#[tokio::test]
async fn first_saved_card_becomes_default_and_token_stays_private() {
    let app = TestApp::spawn().await;
    let (_, token) = app.register_user("shopper@test.dev").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/cards",
            Some(&token),
            Some(card_body("4111111111111111")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["is_default"], true);
    assert_eq!(body["data"]["last_four"], "1111");
    assert_eq!(body["data"]["brand"], "visa");
    assert!(
        body["data"].get("card_token").is_none(),
        "provider token must not be exposed"
    );
}

#[tokio::test]
async fn default_card_moves_atomically() {
    let app = TestApp::spawn().await;
    let (_, token) = app.register_user("shopper@test.dev").await;

    let (_, first) = app
        .request(
            Method::POST,
            "/api/v1/cards",
            Some(&token),
            Some(card_body("4111111111111111")),
        )
        .await;
    let (_, second) = app
        .request(
            Method::POST,
            "/api/v1/cards",
            Some(&token),
            Some(card_body("5500005555555559")),
        )
        .await;
    assert_eq!(second["data"]["is_default"], false);

    let second_id = second["data"]["id"].as_str().unwrap().to_string();
    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/cards/{second_id}/default"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_default"], true);

    let (_, listing) = app
        .request(Method::GET, "/api/v1/cards", Some(&token), None)
        .await;
    let cards = listing["data"].as_array().unwrap();
    let defaults: Vec<_> = cards
        .iter()
        .filter(|card| card["is_default"] == true)
        .collect();
    assert_eq!(defaults.len(), 1, "exactly one default card");
    assert_eq!(defaults[0]["id"].as_str(), Some(second_id.as_str()));

    let first_id = first["data"]["id"].as_str().unwrap();
    let first_row = cards
        .iter()
        .find(|card| card["id"].as_str() == Some(first_id))
        .unwrap();
    assert_eq!(first_row["is_default"], false);
}

#[tokio::test]
async fn cards_are_scoped_to_their_owner() {
    let app = TestApp::spawn().await;
    let (_, alice) = app.register_user("alice@test.dev").await;
    let (_, bob) = app.register_user("bob@test.dev").await;

    let (_, created) = app
        .request(
            Method::POST,
            "/api/v1/cards",
            Some(&alice),
            Some(card_body("4111111111111111")),
        )
        .await;
    let card_id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/v1/cards/{card_id}"),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/v1/cards/{card_id}"),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn invalid_card_details_are_rejected_before_tokenization() {
    let app = TestApp::spawn().await;
    let (_, token) = app.register_user("shopper@test.dev").await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/cards",
            Some(&token),
            Some(card_body("41abc")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad_month = card_body("4111111111111111");
    bad_month["expiration_month"] = json!(13);
    let (status, _) = app
        .request(Method::POST, "/api/v1/cards", Some(&token), Some(bad_month))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn saved_card_can_pay_an_order() {
    let app = TestApp::spawn().await;
    let (_, token) = app.register_user("shopper@test.dev").await;
    let product_id = app.seed_product("Coffee", dec!(10.00), 5).await;
    let order_id = app.checkout(&token, product_id, 2).await;

    let (_, created) = app
        .request(
            Method::POST,
            "/api/v1/cards",
            Some(&token),
            Some(card_body("4111111111111111")),
        )
        .await;
    let card_id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/payments/card",
            Some(&token),
            Some(json!({ "order_id": order_id, "card_id": card_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["provider_status"], "approved");
    assert_eq!(body["data"]["order"]["status"], OrderStatus::Paid.to_string());

    // The order is settled, so paying again is rejected.
    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/payments/card",
            Some(&token),
            Some(json!({ "order_id": order_id, "card_id": card_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn card_payment_requires_exactly_one_source() {
    let app = TestApp::spawn().await;
    let (_, token) = app.register_user("shopper@test.dev").await;
    let product_id = app.seed_product("Coffee", dec!(10.00), 5).await;
    let order_id = app.checkout(&token, product_id, 1).await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/payments/card",
            Some(&token),
            Some(json!({ "order_id": order_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejected_card_payment_fails_the_order() {
    let app = TestApp::spawn().await;
    let (_, token) = app.register_user("shopper@test.dev").await;
    let product_id = app.seed_product("Coffee", dec!(10.00), 5).await;
    let order_id = app.checkout(&token, product_id, 1).await;

    app.gateway.set_next_status("rejected");
    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/payments/card",
            Some(&token),
            Some(json!({ "order_id": order_id, "card_token": "tok-one-shot" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["provider_status"], "rejected");
    assert_eq!(body["data"]["order"]["status"], OrderStatus::Failed.to_string());
}
