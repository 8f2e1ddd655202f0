pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, routing::post, Json, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::gateway::PaymentGateway;
use crate::services::{
    CardService, NotificationService, OrderService, PaymentService, ProductService, UserService,
};

/// Service container built once at startup.
pub struct AppServices {
    pub users: UserService,
    pub products: ProductService,
    pub orders: OrderService,
    pub payments: PaymentService,
    pub cards: CardService,
    pub notifications: NotificationService,
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub services: Arc<AppServices>,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        config: AppConfig,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let notifications = NotificationService::new(db.clone());
        let services = AppServices {
            users: UserService::new(db.clone()),
            products: ProductService::new(db.clone()),
            orders: OrderService::new(db.clone()),
            payments: PaymentService::new(db.clone(), gateway.clone(), notifications.clone()),
            cards: CardService::new(db.clone(), gateway),
            notifications,
        };

        Self {
            db,
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Assembles the full application router.
pub fn app_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/products", get(handlers::products::list_products))
        .route("/api/v1/products/:id", get(handlers::products::get_product))
        .route("/api/v1/payments/webhook", post(handlers::payments::webhook));

    let protected = Router::new()
        .route("/api/v1/checkout", post(handlers::orders::checkout))
        .route("/api/v1/orders", get(handlers::orders::list_orders))
        .route("/api/v1/orders/:id", get(handlers::orders::get_order))
        .route(
            "/api/v1/orders/:id/cancel",
            post(handlers::orders::cancel_order),
        )
        .route(
            "/api/v1/payments/preference",
            post(handlers::payments::create_preference),
        )
        .route(
            "/api/v1/payments/card",
            post(handlers::payments::pay_with_card),
        )
        .route(
            "/api/v1/payments/order/:id",
            get(handlers::payments::list_order_payments),
        )
        .route(
            "/api/v1/cards",
            get(handlers::cards::list_cards).post(handlers::cards::add_card),
        )
        .route(
            "/api/v1/cards/:id",
            axum::routing::delete(handlers::cards::delete_card),
        )
        .route(
            "/api/v1/cards/:id/default",
            post(handlers::cards::set_default_card),
        )
        .route(
            "/api/v1/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route(
            "/api/v1/notifications/:id/read",
            post(handlers::notifications::mark_read),
        )
        .route("/api/v1/products", post(handlers::products::create_product))
        .route(
            "/api/v1/products/:id",
            axum::routing::put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route("/api/v1/admin/users", get(handlers::admin::list_users))
        .route("/api/v1/admin/orders", get(handlers::admin::list_orders))
        .route("/api/v1/admin/payments", get(handlers::admin::list_payments))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}
