use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::auth::{
        ConfirmResetRequest, LoginRequest, LoginResponse, PasswordResetRequest, RegisterRequest,
        ResetTokenStatus, VerifyResetTokenRequest,
    },
    error::AppResult,
    models::User,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/password-reset", post(request_password_reset))
        .route("/password-reset/verify", post(verify_reset_token))
        .route("/password-reset/confirm", post(confirm_reset))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User created", body = ApiResponse<User>),
        (status = 400, description = "Email already taken"),
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::register_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid credentials"),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset token issued"),
        (status = 400, description = "User not found"),
    ),
    tag = "Auth"
)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::request_password_reset(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/password-reset/verify",
    request_body = VerifyResetTokenRequest,
    responses(
        (status = 200, description = "Token status", body = ApiResponse<ResetTokenStatus>),
    ),
    tag = "Auth"
)]
pub async fn verify_reset_token(
    State(state): State<AppState>,
    Json(payload): Json<VerifyResetTokenRequest>,
) -> AppResult<Json<ApiResponse<ResetTokenStatus>>> {
    let resp = auth_service::verify_reset_token(&state, &payload.token).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/password-reset/confirm",
    request_body = ConfirmResetRequest,
    responses(
        (status = 200, description = "Password updated"),
        (status = 400, description = "Invalid or expired token"),
    ),
    tag = "Auth"
)]
pub async fn confirm_reset(
    State(state): State<AppState>,
    Json(payload): Json<ConfirmResetRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::confirm_reset(&state, payload).await?;
    Ok(Json(resp))
}
