use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::generate_token;
use crate::entities::user;
use crate::errors::ServiceError;
use crate::handlers::common::ApiResponse;
use crate::services::users::{LoginInput, RegisterInput};
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: user::Model,
}

/// Register a new customer account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterInput,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 409, description = "Email already registered"),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ServiceError> {
    let user = state.services.users.register(input).await?;
    let token = generate_token(
        user.id,
        &user.email,
        &user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(AuthResponse { token, user })),
    ))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginInput,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<ApiResponse<AuthResponse>>, ServiceError> {
    let user = state.services.users.authenticate(input).await?;
    let token = generate_token(
        user.id,
        &user.email,
        &user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok(Json(ApiResponse::ok(AuthResponse { token, user })))
}
