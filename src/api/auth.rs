use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use crate::api::server::AppState;
use crate::api::session::{start_session, CurrentUser};
use crate::api::MessageResponse;
use crate::crypto::{hash_password, verify_password, EmailCipher};
use crate::db::models::{Preferences, User, UserInfo};
use crate::db::repo::{next_id, Commit};
use crate::error::AppError;

#[derive(Deserialize)]
pub struct SignupPayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: UserInfo,
}

fn user_info(user: &User, emails: &EmailCipher) -> UserInfo {
    UserInfo {
        id: user.id,
        username: user.username.clone(),
        email: emails.decrypt_or_placeholder(&user.email),
    }
}

/// True when `user` already holds `username` or, once decrypted, `email`.
/// Stored emails that fail to decrypt never match.
fn is_taken(user: &User, username: &str, email: &str, emails: &EmailCipher) -> bool {
    if user.username == username {
        return true;
    }
    match emails.decrypt(&user.email) {
        Ok(existing) => existing == email,
        Err(e) => {
            tracing::warn!(user_id = user.id, error = %e, "skipping undecryptable email in duplicate check");
            false
        }
    }
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    session: Session,
    payload: Result<Json<SignupPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(payload) = payload?;
    if payload.username.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("All fields are required"));
    }

    let taken = AppError::validation("Username or email already exists");
    let users = state.store.users.read_all().await?;
    if users
        .iter()
        .any(|u| is_taken(u, &payload.username, &payload.email, &state.emails))
    {
        return Err(taken);
    }

    let password = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;
    let sealed_email = state.emails.encrypt(&payload.email)?;

    // Checked again under the file lock; another signup may have landed meanwhile.
    let user = state
        .store
        .users
        .update(|users| {
            if users
                .iter()
                .any(|u| is_taken(u, &payload.username, &payload.email, &state.emails))
            {
                return Err(taken);
            }
            let user = User {
                id: next_id(users),
                username: payload.username.clone(),
                email: sealed_email,
                password: password_hash,
                preferences: Preferences::default(),
            };
            users.push(user.clone());
            Ok(Commit::Write(user))
        })
        .await?;

    start_session(&session, user.id).await?;
    tracing::info!(user_id = user.id, username = %user.username, "user signed up");

    let user = UserInfo {
        id: user.id,
        username: user.username,
        email: payload.email,
    };
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully",
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload?;
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("Username and password are required"));
    }

    let invalid = || AppError::validation("Invalid credentials");
    let user = state
        .store
        .users
        .read_all()
        .await?
        .into_iter()
        .find(|u| u.username == payload.username)
        .ok_or_else(invalid)?;

    let password = payload.password;
    let hash = user.password.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await??;
    if !valid {
        tracing::info!(user_id = user.id, "rejected login with wrong password");
        return Err(invalid());
    }

    start_session(&session, user.id).await?;
    tracing::info!(user_id = user.id, "user logged in");

    Ok(Json(AuthResponse {
        message: "Login successful",
        user: user_info(&user, &state.emails),
    }))
}

pub async fn logout(session: Session) -> Result<Json<MessageResponse>, AppError> {
    session.flush().await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<UserInfo>, AppError> {
    let user = state
        .store
        .find_user(user.id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    Ok(Json(user_info(&user, &state.emails)))
}
