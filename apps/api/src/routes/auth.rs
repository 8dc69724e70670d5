//! Signup, login and token refresh.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use medmart_core::validation::{validate_email, validate_full_name, validate_optional, validate_password};
use medmart_core::{ActivityKind, User, UserRole, ValidationError};
use medmart_db::{password, NewUser};

use crate::auth::TokenPair;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub company_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: User,
}

/// `POST /api/auth/signup`
///
/// Buyers and suppliers may sign up; suppliers must name their company.
/// Admin accounts are only created by promotion.
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let email = validate_email(&req.email)?;
    validate_password(&req.password)?;
    let full_name = validate_full_name(&req.full_name)?;
    let company_name = validate_optional("company name", req.company_name.as_deref(), 120)?;

    let role = req.role.unwrap_or_default();
    match role {
        UserRole::Admin => return Err(ApiError::forbidden("Admin accounts cannot be created by signup")),
        UserRole::Supplier if company_name.is_none() => {
            return Err(ValidationError::required("company name").into());
        }
        _ => {}
    }

    let password_hash = password::hash_password(&req.password)?;
    let user = state
        .db
        .users()
        .create(&NewUser {
            email,
            password_hash,
            full_name,
            role,
            company_name,
        })
        .await?;

    let message = format!("{} joined as {}", user.full_name, user.role);
    state
        .db
        .activity()
        .record(Some(&user.id), ActivityKind::UserSignedUp, &message)
        .await?;

    if let Err(e) = state
        .db
        .notifications()
        .create(&user.id, "Welcome to MedMart", "Your account is ready.")
        .await
    {
        warn!(user_id = %user.id, error = %e, "Failed to send welcome notification");
    }

    info!(user_id = %user.id, role = %user.role, "Account created");

    let tokens = state.jwt.issue(&user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { tokens, user })))
}

/// `POST /api/auth/login`
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult<Json<AuthResponse>> {
    let email = req.email.trim().to_lowercase();

    // Same answer for unknown email and wrong password
    let invalid = || ApiError::new(ErrorCode::Unauthenticated, "Invalid email or password");

    let record = state.db.users().find_credentials(&email).await?.ok_or_else(invalid)?;
    if !password::verify_password(&req.password, &record.password_hash) {
        warn!(user_id = %record.user.id, "Login failed: wrong password");
        return Err(invalid());
    }

    info!(user_id = %record.user.id, "Logged in");

    let tokens = state.jwt.issue(&record.user)?;
    Ok(Json(AuthResponse {
        tokens,
        user: record.user,
    }))
}

/// `POST /api/auth/refresh`
///
/// Re-reads the account so a role change takes effect with the new pair.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let claims = state.jwt.validate_refresh_token(&req.refresh_token)?;

    let user = state
        .db
        .users()
        .get_by_id(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthenticated("Account no longer exists"))?;

    let tokens = state.jwt.issue(&user)?;
    Ok(Json(AuthResponse { tokens, user }))
}
