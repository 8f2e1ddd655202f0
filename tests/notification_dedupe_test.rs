mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;

use common::TestApp;
use storefront_api::entities::notification;
use storefront_api::models::NotificationType;
use storefront_api::services::NotificationService;

#[tokio::test]
async fn identical_notifications_are_suppressed_within_the_window() {
    let app = TestApp::spawn().await;
    let (user_id, _) = app.register_user("shopper@test.dev").await;
    let service = NotificationService::new(app.db.clone());

    let first = service
        .notify(user_id, NotificationType::Payment, "Payment approved", "ok", None)
        .await
        .unwrap();
    assert!(first.is_some());

    let second = service
        .notify(user_id, NotificationType::Payment, "Payment approved", "ok", None)
        .await
        .unwrap();
    assert!(second.is_none(), "duplicate within window must be suppressed");

    // A different title is a different notification.
    let other = service
        .notify(user_id, NotificationType::Payment, "Payment rejected", "no", None)
        .await
        .unwrap();
    assert!(other.is_some());
}

#[tokio::test]
async fn same_title_with_different_message_is_delivered() {
    let app = TestApp::spawn().await;
    let (user_id, _) = app.register_user("shopper@test.dev").await;
    let service = NotificationService::new(app.db.clone());

    let first = service
        .notify(user_id, NotificationType::System, "Maintenance", "tonight at 22:00", None)
        .await
        .unwrap();
    assert!(first.is_some());

    // The message is part of the dedupe key.
    let reworded = service
        .notify(user_id, NotificationType::System, "Maintenance", "moved to 23:00", None)
        .await
        .unwrap();
    assert!(reworded.is_some(), "a different message is not a duplicate");

    let repeat = service
        .notify(user_id, NotificationType::System, "Maintenance", "moved to 23:00", None)
        .await
        .unwrap();
    assert!(repeat.is_none(), "the exact same notification is suppressed");
}

#[tokio::test]
async fn suppression_expires_after_the_window() {
    let app = TestApp::spawn().await;
    let (user_id, _) = app.register_user("shopper@test.dev").await;
    let service = NotificationService::new(app.db.clone());

    let first = service
        .notify(user_id, NotificationType::OrderStatus, "Order shipped", "on its way", None)
        .await
        .unwrap()
        .expect("first notification");

    // Backdate the first row past the dedupe window.
    let mut active: notification::ActiveModel = first.into();
    active.created_at = Set(Utc::now() - Duration::minutes(10));
    active.update(&app.db).await.unwrap();

    let again = service
        .notify(user_id, NotificationType::OrderStatus, "Order shipped", "on its way", None)
        .await
        .unwrap();
    assert!(again.is_some(), "window has passed, notification must go through");
}

#[tokio::test]
async fn dedupe_is_scoped_per_user() {
    let app = TestApp::spawn().await;
    let (alice, _) = app.register_user("alice@test.dev").await;
    let (bob, _) = app.register_user("bob@test.dev").await;
    let service = NotificationService::new(app.db.clone());

    let first = service
        .notify(alice, NotificationType::System, "Maintenance", "tonight", None)
        .await
        .unwrap();
    let second = service
        .notify(bob, NotificationType::System, "Maintenance", "tonight", None)
        .await
        .unwrap();

    assert!(first.is_some());
    assert!(second.is_some(), "other users are not affected by the window");
}

#[tokio::test]
async fn notifications_api_lists_and_marks_read() {
    let app = TestApp::spawn().await;
    let (user_id, token) = app.register_user("shopper@test.dev").await;
    let (_, other_token) = app.register_user("other@test.dev").await;
    let service = NotificationService::new(app.db.clone());

    let created = service
        .notify(
            user_id,
            NotificationType::Payment,
            "Payment approved",
            "your order is confirmed",
            Some(json!({ "order_id": "abc" })),
        )
        .await
        .unwrap()
        .expect("notification");

    let (status, body) = app
        .request(Method::GET, "/api/v1/notifications", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"].as_u64(), Some(1));
    assert_eq!(body["data"]["items"][0]["is_read"], false);

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/notifications/{}/read", created.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_read"], true);

    // Another user cannot touch it.
    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/v1/notifications/{}/read", created.id),
            Some(&other_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
