use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyResetTokenRequest {
    pub token: String,
}

/// Outcome of a token check; each verify call is a fresh check and an
/// invalid token is terminal for that link.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResetTokenStatus {
    pub valid: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmResetRequest {
    pub token: String,
    pub new_password: String,
}
