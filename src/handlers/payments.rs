use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::payment;
use crate::errors::ServiceError;
use crate::gateway::{verify_webhook_signature, PreferenceResponse};
use crate::handlers::common::ApiResponse;
use crate::services::payments::{CardPaymentInput, CardPaymentResult, WebhookPayload};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePreferenceInput {
    pub order_id: Uuid,
}

/// Create a hosted-checkout preference for a pending order.
#[utoipa::path(
    post,
    path = "/api/v1/payments/preference",
    request_body = CreatePreferenceInput,
    responses(
        (status = 200, description = "Checkout preference", body = PreferenceResponse),
        (status = 400, description = "Order is not awaiting payment"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn create_preference(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreatePreferenceInput>,
) -> Result<Json<ApiResponse<PreferenceResponse>>, ServiceError> {
    let preference = state
        .services
        .payments
        .create_preference(user.id, &user.email, input.order_id)
        .await?;
    Ok(Json(ApiResponse::ok(preference)))
}

/// Charge an order with a card token or a saved card.
#[utoipa::path(
    post,
    path = "/api/v1/payments/card",
    request_body = CardPaymentInput,
    responses(
        (status = 200, description = "Payment processed", body = CardPaymentResult),
        (status = 400, description = "Order is not awaiting payment"),
        (status = 502, description = "Payment provider unavailable"),
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn pay_with_card(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CardPaymentInput>,
) -> Result<Json<ApiResponse<CardPaymentResult>>, ServiceError> {
    let result = state
        .services
        .payments
        .pay_with_card(user.id, &user.email, input)
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// Payment history for one of the caller's orders.
#[utoipa::path(
    get,
    path = "/api/v1/payments/order/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Payments recorded for the order"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn list_order_payments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<payment::Model>>>, ServiceError> {
    let payments = state.services.payments.list_for_order(user.id, id).await?;
    Ok(Json(ApiResponse::ok(payments)))
}

/// Provider webhook receiver.
///
/// The body is taken raw so the signature covers exactly the bytes the
/// provider signed. Semantic problems (unknown notification type,
/// unparseable payload, payment for an unknown order) are acknowledged
/// with 200 so the provider stops retrying; only a bad signature or an
/// infrastructure failure is reported as an error.
#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    request_body(content = String, description = "Raw provider notification body"),
    responses(
        (status = 200, description = "Notification acknowledged"),
        (status = 401, description = "Invalid signature"),
    ),
    tag = "payments"
)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ServiceError> {
    if let Some(secret) = &state.config.gateway.webhook_secret {
        let signature = headers
            .get("x-signature")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("missing webhook signature".to_string()))?;

        if !verify_webhook_signature(secret, &body, signature) {
            return Err(ServiceError::Unauthorized(
                "invalid webhook signature".to_string(),
            ));
        }
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "unparseable webhook payload acknowledged");
            return Ok(Json(json!({ "received": true })));
        }
    };

    state.services.payments.process_webhook(payload).await?;
    Ok(Json(json!({ "received": true })))
}
