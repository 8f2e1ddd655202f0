use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::product;
use crate::errors::ServiceError;
use crate::handlers::common::{ApiResponse, PaginatedResponse, PaginationParams};
use crate::services::products::{CreateProductInput, UpdateProductInput};
use crate::AppState;

/// Browse available products.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(PaginationParams),
    responses((status = 200, description = "Available products")),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<product::Model>>>, ServiceError> {
    let (items, total) = state
        .services
        .products
        .list_available(params.page(), params.per_page())
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
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product detail", body = product::Model),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<product::Model>>, ServiceError> {
    let product = state.services.products.get(id).await?;
    Ok(Json(ApiResponse::ok(product)))
}

/// Create a product (back office).
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Product created", body = product::Model),
        (status = 403, description = "Admin access required"),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateProductInput>,
) -> Result<(StatusCode, Json<ApiResponse<product::Model>>), ServiceError> {
    user.require_admin()?;
    let product = state.services.products.create(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(product))))
}

/// Update a product (back office).
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductInput,
    responses(
        (status = 200, description = "Product updated", body = product::Model),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> Result<Json<ApiResponse<product::Model>>, ServiceError> {
    user.require_admin()?;
    let product = state.services.products.update(id, input).await?;
    Ok(Json(ApiResponse::ok(product)))
}

/// Delete a product (back office).
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    user.require_admin()?;
    state.services.products.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
