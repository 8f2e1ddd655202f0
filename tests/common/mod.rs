#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use storefront_api::auth::{generate_token, hash_password};
use storefront_api::config::{AppConfig, GatewayConfig};
use storefront_api::db::{establish_connection, run_migrations};
use storefront_api::entities::{product, user};
use storefront_api::errors::ServiceError;
use storefront_api::gateway::{
    CardToken, CardTokenRequest, GatewayPayment, PaymentGateway, PaymentRequest, PreferenceRequest,
    PreferenceResponse,
};
use storefront_api::{app_router, AppState};

pub const JWT_SECRET: &str = "test-secret-test-secret-test-secret!";

/// In-memory stand-in for the payment provider.
pub struct MockGateway {
    payments: Mutex<HashMap<String, GatewayPayment>>,
    next_status: Mutex<String>,
    counter: Mutex<u64>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            payments: Mutex::new(HashMap::new()),
            next_status: Mutex::new("approved".to_string()),
            counter: Mutex::new(0),
        }
    }

    /// Status the next create_payment call will come back with.
    pub fn set_next_status(&self, status: &str) {
        *self.next_status.lock().unwrap() = status.to_string();
    }

    /// Seeds a provider-side payment, as if it was created through
    /// hosted checkout, so a webhook can reference it.
    pub fn seed_payment(&self, id: &str, status: &str, external_reference: Uuid, amount: Decimal) {
        self.payments.lock().unwrap().insert(
            id.to_string(),
            GatewayPayment {
                id: id.to_string(),
                status: status.to_string(),
                external_reference: Some(external_reference.to_string()),
                transaction_amount: Some(amount),
            },
        );
    }

    pub fn set_status(&self, id: &str, status: &str) {
        if let Some(p) = self.payments.lock().unwrap().get_mut(id) {
            p.status = status.to_string();
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_card_token(&self, req: &CardTokenRequest) -> Result<CardToken, ServiceError> {
        Ok(CardToken {
            id: format!("tok-{}", Uuid::new_v4()),
            last_four_digits: req.card_number[req.card_number.len() - 4..].to_string(),
            payment_method_id: Some("visa".to_string()),
        })
    }

    async fn create_payment(&self, req: &PaymentRequest) -> Result<GatewayPayment, ServiceError> {
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        let payment = GatewayPayment {
            id: format!("mp-{}", *counter),
            status: self.next_status.lock().unwrap().clone(),
            external_reference: Some(req.external_reference.clone()),
            transaction_amount: Some(req.transaction_amount),
        };
        self.payments
            .lock()
            .unwrap()
            .insert(payment.id.clone(), payment.clone());
        Ok(payment)
    }

    async fn create_preference(
        &self,
        _req: &PreferenceRequest,
    ) -> Result<PreferenceResponse, ServiceError> {
        Ok(PreferenceResponse {
            id: format!("pref-{}", Uuid::new_v4()),
            init_point: "https://checkout.test/start".to_string(),
            sandbox_init_point: None,
        })
    }

    async fn get_payment(&self, payment_id: &str) -> Result<GatewayPayment, ServiceError> {
        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound("payment not found".to_string()))
    }
}

pub struct TestApp {
    pub app: Router,
    pub db: DatabaseConnection,
    pub gateway: Arc<MockGateway>,
    _tmp: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_webhook_secret(None).await
    }

    pub async fn spawn_with_webhook_secret(webhook_secret: Option<String>) -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let db_path = tmp.path().join("test.db");
        let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let db = establish_connection(&database_url).await.expect("connect");
        run_migrations(&db).await.expect("migrate");

        let config = AppConfig {
            database_url,
            jwt_secret: JWT_SECRET.to_string(),
            jwt_expiration: 3600,
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            log_level: "warn".to_string(),
            auto_migrate: false,
            gateway: GatewayConfig {
                base_url: "https://gateway.test".to_string(),
                access_token: "test-token".to_string(),
                webhook_secret,
                timeout_seconds: 5,
            },
        };

        let gateway = Arc::new(MockGateway::new());
        let state = AppState::new(db.clone(), config, gateway.clone());

        Self {
            app: app_router(state),
            db,
            gateway,
            _tmp: tmp,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Registers a customer and returns (user_id, bearer token).
    pub async fn register_user(&self, email: &str) -> (Uuid, String) {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "name": "Test User",
                    "email": email,
                    "password": "password123",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

        let user_id = body["data"]["user"]["id"]
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .expect("user id");
        let token = body["data"]["token"].as_str().expect("token").to_string();
        (user_id, token)
    }

    /// Inserts an admin user directly and mints a token for it.
    pub async fn create_admin(&self) -> (Uuid, String) {
        let now = Utc::now();
        let admin = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Admin".to_string()),
            email: Set(format!("admin-{}@test.dev", Uuid::new_v4())),
            password_hash: Set(hash_password("admin-password").expect("hash")),
            role: Set("admin".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .expect("insert admin");

        let token = generate_token(admin.id, &admin.email, "admin", JWT_SECRET, 3600)
            .expect("admin token");
        (admin.id, token)
    }

    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> Uuid {
        let now = Utc::now();
        let prod = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(None),
            price: Set(price),
            stock: Set(stock),
            is_available: Set(true),
            image_url: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .expect("insert product");
        prod.id
    }

    /// Places an order for a single product and returns the order id.
    pub async fn checkout(&self, token: &str, product_id: Uuid, quantity: i32) -> Uuid {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/checkout",
                Some(token),
                Some(json!({
                    "items": [{ "product_id": product_id, "quantity": quantity }],
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "checkout failed: {body}");

        body["data"]["id"]
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .expect("order id")
    }
}
