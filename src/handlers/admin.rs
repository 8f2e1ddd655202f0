use axum::{
    extract::{Query, State},
    Json,
};

use crate::auth::AuthUser;
use crate::entities::{order, payment, user};
use crate::errors::ServiceError;
use crate::handlers::common::{ApiResponse, PaginatedResponse, PaginationParams};
use crate::AppState;

/// Back-office user listing.
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    params(PaginationParams),
    responses(
        (status = 200, description = "Registered users"),
        (status = 403, description = "Admin access required"),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<user::Model>>>, ServiceError> {
    caller.require_admin()?;
    let (items, total) = state
        .services
        .users
        .list(params.page(), params.per_page())
        .await?;

    Ok(Json(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page: params.page(),
        per_page: params.per_page(),
    })))
}

/// Back-office order listing across all users.
#[utoipa::path(
    get,
    path = "/api/v1/admin/orders",
    params(PaginationParams),
    responses(
        (status = 200, description = "All orders"),
        (status = 403, description = "Admin access required"),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<order::Model>>>, ServiceError> {
    caller.require_admin()?;
    let (items, total) = state
        .services
        .orders
        .list_all(params.page(), params.per_page())
        .await?;

    Ok(Json(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page: params.page(),
        per_page: params.per_page(),
    })))
}

/// Back-office payment listing across all orders.
#[utoipa::path(
    get,
    path = "/api/v1/admin/payments",
    params(PaginationParams),
    responses(
        (status = 200, description = "All payments"),
        (status = 403, description = "Admin access required"),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_payments(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<payment::Model>>>, ServiceError> {
    caller.require_admin()?;
    let (items, total) = state
        .services
        .payments
        .list_all(params.page(), params.per_page())
        .await?;

    Ok(Json(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page: params.page(),
        per_page: params.per_page(),
    })))
}
