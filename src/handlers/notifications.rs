use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::notification;
use crate::errors::ServiceError;
use crate::handlers::common::{ApiResponse, PaginatedResponse, PaginationParams};
use crate::AppState;

/// The caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(PaginationParams),
    responses((status = 200, description = "Notifications for the authenticated user")),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<notification::Model>>>, ServiceError> {
    let (items, total) = state
        .services
        .notifications
        .list_for_user(user.id, params.page(), params.per_page())
        .await?;

    Ok(Json(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page: params.page(),
        per_page: params.per_page(),
    })))
}

/// Mark a notification as read.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked read", body = notification::Model),
        (status = 404, description = "Notification not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<notification::Model>>, ServiceError> {
    let notification = state.services.notifications.mark_read(user.id, id).await?;
    Ok(Json(ApiResponse::ok(notification)))
}
