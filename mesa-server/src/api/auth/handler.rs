//! Auth API Handlers

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{Json, extract::State, http::StatusCode};
use shared::models::Role;
use shared::request::{LoginRequest, RegisterRequest};
use shared::response::{LoginResponse, ProfileResponse};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::db::repository::profile::{self, NewProfile};
use crate::utils::{AppError, AppResult};

const MIN_PASSWORD_LEN: usize = 8;

/// Unified login failure, so usernames cannot be enumerated
fn invalid_credentials() -> AppError {
    AppError::validation("Invalid username or password")
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {e}")))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let row = profile::find_row_by_username(&state.db, &payload.username)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&payload.password, &row.password_hash) {
        tracing::warn!(username = %payload.username, "Login failed");
        return Err(invalid_credentials());
    }

    let profile = row.into_model()?;
    let token = state
        .jwt_service()
        .generate_token(&profile.id, profile.full_name.as_deref(), profile.role)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Token generation failed: {e}")))?;

    Ok(Json(LoginResponse { token, profile }))
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ProfileResponse>)> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(AppError::validation("Username must not be empty"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let profile = profile::create(
        &state.db,
        NewProfile {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            full_name: payload.full_name,
            role: Role::Customer,
            password_hash: hash_password(&payload.password)?,
        },
    )
    .await?;

    tracing::info!(username = %profile.username, "Profile registered");
    Ok((StatusCode::CREATED, Json(ProfileResponse { profile })))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ProfileResponse>> {
    let profile = profile::find_by_id(&state.db, &user.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Profile {}", user.id)))?;
    Ok(Json(ProfileResponse { profile }))
}
