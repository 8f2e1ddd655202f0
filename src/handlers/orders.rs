use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::order;
use crate::errors::ServiceError;
use crate::handlers::common::{ApiResponse, PaginatedResponse, PaginationParams};
use crate::services::orders::{CheckoutInput, OrderWithItems};
use crate::AppState;

/// Place an order from the cart contents.
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = CheckoutInput,
    responses(
        (status = 201, description = "Order created awaiting payment", body = OrderWithItems),
        (status = 400, description = "Empty cart, unavailable product or insufficient stock"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CheckoutInput>,
) -> Result<(StatusCode, Json<ApiResponse<OrderWithItems>>), ServiceError> {
    let order = state.services.orders.checkout(user.id, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(order))))
}

/// The caller's order history.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(PaginationParams),
    responses((status = 200, description = "Orders for the authenticated user")),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<order::Model>>>, ServiceError> {
    let (items, total) = state
        .services
        .orders
        .list_for_user(user.id, params.page(), params.per_page())
        .await?;

    Ok(Json(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page: params.page(),
        per_page: params.per_page(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items", body = OrderWithItems),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderWithItems>>, ServiceError> {
    let order = state.services.orders.get_for_user(user.id, id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// Cancel a pending order.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled", body = order::Model),
        (status = 400, description = "Order is not pending"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<order::Model>>, ServiceError> {
    let order = state.services.orders.cancel(user.id, id).await?;
    Ok(Json(ApiResponse::ok(order)))
}
