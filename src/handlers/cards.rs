use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::payment_card;
use crate::errors::ServiceError;
use crate::gateway::CardTokenRequest;
use crate::handlers::common::ApiResponse;
use crate::AppState;

/// Tokenize and save a card.
#[utoipa::path(
    post,
    path = "/api/v1/cards",
    request_body = CardTokenRequest,
    responses(
        (status = 201, description = "Card saved", body = payment_card::Model),
        (status = 400, description = "Invalid card details"),
        (status = 502, description = "Payment provider unavailable"),
    ),
    security(("bearer_auth" = [])),
    tag = "cards"
)]
pub async fn add_card(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CardTokenRequest>,
) -> Result<(StatusCode, Json<ApiResponse<payment_card::Model>>), ServiceError> {
    let card = state.services.cards.add_card(user.id, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(card))))
}

/// The caller's saved cards.
#[utoipa::path(
    get,
    path = "/api/v1/cards",
    responses((status = 200, description = "Saved cards")),
    security(("bearer_auth" = [])),
    tag = "cards"
)]
pub async fn list_cards(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<payment_card::Model>>>, ServiceError> {
    let cards = state.services.cards.list(user.id).await?;
    Ok(Json(ApiResponse::ok(cards)))
}

/// Make a card the default payment method.
#[utoipa::path(
    post,
    path = "/api/v1/cards/{id}/default",
    params(("id" = Uuid, Path, description = "Card id")),
    responses(
        (status = 200, description = "Default card updated", body = payment_card::Model),
        (status = 404, description = "Card not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "cards"
)]
pub async fn set_default_card(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<payment_card::Model>>, ServiceError> {
    let card = state.services.cards.set_default(user.id, id).await?;
    Ok(Json(ApiResponse::ok(card)))
}

/// Remove a saved card.
#[utoipa::path(
    delete,
    path = "/api/v1/cards/{id}",
    params(("id" = Uuid, Path, description = "Card id")),
    responses(
        (status = 204, description = "Card removed"),
        (status = 404, description = "Card not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "cards"
)]
pub async fn delete_card(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.cards.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
