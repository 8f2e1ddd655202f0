mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn admin_listings_are_forbidden_for_customers() {
    let app = TestApp::spawn().await;
    let (_, customer) = app.register_user("shopper@test.dev").await;

    for uri in [
        "/api/v1/admin/users",
        "/api/v1/admin/orders",
        "/api/v1/admin/payments",
    ] {
        let (status, _) = app.request(Method::GET, uri, Some(&customer), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");

        let (status, _) = app.request(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn admin_sees_orders_across_all_users() {
    let app = TestApp::spawn().await;
    let (_, alice) = app.register_user("alice@test.dev").await;
    let (_, bob) = app.register_user("bob@test.dev").await;
    let (_, admin) = app.create_admin().await;
    let product_id = app.seed_product("Coffee", dec!(10.00), 10).await;

    app.checkout(&alice, product_id, 1).await;
    app.checkout(&bob, product_id, 2).await;

    let (status, body) = app
        .request(Method::GET, "/api/v1/admin/orders", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"].as_u64(), Some(2));

    let (status, body) = app
        .request(Method::GET, "/api/v1/admin/users", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    // Two customers and the admin itself.
    assert_eq!(body["data"]["total"].as_u64(), Some(3));
}

#[tokio::test]
async fn product_management_is_admin_only() {
    let app = TestApp::spawn().await;
    let (_, customer) = app.register_user("shopper@test.dev").await;
    let (_, admin) = app.create_admin().await;

    let input = json!({
        "name": "Espresso",
        "price": "12.00",
        "stock": 8,
        "is_available": true,
    });

    let (status, _) = app
        .request(Method::POST, "/api/v1/products", Some(&customer), Some(input.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(Method::POST, "/api/v1/products", Some(&admin), Some(input))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let product_id = body["data"]["id"].as_str().unwrap().to_string();

    // Customers can see it in the catalog once available.
    let (status, body) = app
        .request(Method::GET, "/api/v1/products", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"].as_u64(), Some(1));

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/v1/products/{product_id}"),
            Some(&admin),
            Some(json!({ "is_available": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_available"], false);

    // Hidden products drop out of the storefront listing.
    let (_, body) = app
        .request(Method::GET, "/api/v1/products", None, None)
        .await;
    assert_eq!(body["data"]["total"].as_u64(), Some(0));

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/v1/products/{product_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn registration_rejects_duplicate_email_and_bad_credentials() {
    let app = TestApp::spawn().await;
    app.register_user("shopper@test.dev").await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "name": "Impostor",
                "email": "shopper@test.dev",
                "password": "password456",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "shopper@test.dev", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "shopper@test.dev", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].as_str().is_some());
    assert!(
        body["data"]["user"].get("password_hash").is_none(),
        "password hash must not be serialized"
    );
}
