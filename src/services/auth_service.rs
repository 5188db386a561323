use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{action, log_audit},
    dto::auth::{
        Claims, ConfirmResetRequest, LoginRequest, LoginResponse, PasswordResetRequest,
        RegisterRequest, ResetTokenStatus,
    },
    entity::{
        password_reset_tokens::{
            self, ActiveModel as TokenActive, Column as TokenCol, Entity as ResetTokens,
        },
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    models::User,
    response::ApiResponse,
    state::AppState,
};

const RESET_TOKEN_TTL_HOURS: i64 = 1;

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        email,
        password,
        name,
    } = payload;

    let exists = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::BadRequest("Email is already taken".into()));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(hash_password(&password)?),
        name: Set(name),
        role: Set("user".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        action::USER_REGISTER,
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("User created", User::from(user)))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid email or password".into()))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        action::USER_LOGIN,
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Login success",
        LoginResponse {
            token: format!("Bearer {}", token),
        },
    ))
}

pub async fn request_password_reset(
    state: &AppState,
    payload: PasswordResetRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user = Users::find()
        .filter(UserCol::Email.eq(payload.email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("User not found".into()))?;

    // Drop this user's dead tokens on the way through.
    ResetTokens::delete_many()
        .filter(
            Condition::all().add(TokenCol::UserId.eq(user.id)).add(
                Condition::any()
                    .add(TokenCol::ExpiresAt.lt(Utc::now()))
                    .add(TokenCol::UsedAt.is_not_null()),
            ),
        )
        .exec(&state.orm)
        .await?;

    let token = Uuid::new_v4().to_string();
    TokenActive {
        token: Set(token.clone()),
        user_id: Set(user.id),
        expires_at: Set((Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS)).into()),
        used_at: Set(None),
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = state.notifier.send_reset(&user.email, &token).await {
        tracing::warn!(error = %err, "reset notification failed");
    }

    Ok(ApiResponse::success(
        "Password reset requested",
        serde_json::Value::Null,
    ))
}

pub async fn verify_reset_token(
    state: &AppState,
    token: &str,
) -> AppResult<ApiResponse<ResetTokenStatus>> {
    let row = ResetTokens::find_by_id(token.to_owned())
        .one(&state.orm)
        .await?;
    let valid = row.is_some_and(|row| token_is_live(&row, Utc::now()));

    Ok(ApiResponse::success("Token checked", ResetTokenStatus { valid }))
}

pub async fn confirm_reset(
    state: &AppState,
    payload: ConfirmResetRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;

    let row = ResetTokens::find_by_id(payload.token.clone())
        .one(&txn)
        .await?
        .filter(|row| token_is_live(row, Utc::now()))
        .ok_or_else(|| AppError::BadRequest("Invalid or expired token".into()))?;

    let user = Users::find_by_id(row.user_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let user_id = user.id;

    let mut active: UserActive = user.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.update(&txn).await?;

    let mut token_active: TokenActive = row.into();
    token_active.used_at = Set(Some(Utc::now().into()));
    token_active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user_id),
        action::PASSWORD_RESET,
        Some("users"),
        Some(serde_json::json!({ "user_id": user_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Password updated",
        serde_json::Value::Null,
    ))
}

/// A token is usable only before its expiry and before its first use.
fn token_is_live(row: &password_reset_tokens::Model, now: DateTime<Utc>) -> bool {
    row.used_at.is_none() && row.expires_at > now
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_row(
        expires_at: DateTime<Utc>,
        used_at: Option<DateTime<Utc>>,
    ) -> password_reset_tokens::Model {
        password_reset_tokens::Model {
            token: "t".into(),
            user_id: Uuid::new_v4(),
            expires_at: expires_at.into(),
            used_at: used_at.map(Into::into),
        }
    }

    #[test]
    fn fresh_token_is_live() {
        let now = Utc::now();
        assert!(token_is_live(&token_row(now + Duration::hours(1), None), now));
    }

    #[test]
    fn expired_token_is_dead() {
        let now = Utc::now();
        assert!(!token_is_live(
            &token_row(now - Duration::minutes(1), None),
            now
        ));
    }

    #[test]
    fn used_token_is_dead() {
        let now = Utc::now();
        assert!(!token_is_live(
            &token_row(now + Duration::hours(1), Some(now - Duration::minutes(5))),
            now
        ));
    }
}
