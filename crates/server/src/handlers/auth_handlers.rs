//! # Authentication Route Handlers
//!
//! Admin login and logout. A successful login rotates the session id and
//! CSRF token and sets the session cookie; logout destroys the session and
//! clears the cookie.

use crate::{
    auth::{
        middleware::{AdminSession, SESSION_COOKIE},
        password::verify_password,
    },
    errors::AppError,
    state::AppState,
};
use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub username: String,
    /// Must be echoed back in the `X-CSRF-Token` header on state-changing
    /// requests.
    pub csrf_token: String,
}

#[derive(Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Handles `POST /admin/login`.
///
/// Unknown usernames and wrong passwords produce the same response, so the
/// endpoint does not reveal which usernames exist.
pub async fn login_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let rejected = || AppError::Unauthorized("Invalid username or password.".to_string());

    let admin = app_state
        .sqlite_provider
        .get_admin_by_username(&payload.username)
        .await?
        .ok_or_else(|| {
            warn!(username = %payload.username, "Login attempt for unknown admin.");
            rejected()
        })?;

    if !verify_password(&payload.password, &admin.password_hash) {
        warn!(username = %admin.username, "Login attempt with wrong password.");
        return Err(rejected());
    }

    app_state
        .sqlite_provider
        .touch_admin_last_login(admin.id)
        .await?;

    let session = app_state.sessions.create(admin.id, &admin.username);
    info!(username = %admin.username, "Admin signed in.");

    let cookie = format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Strict",
        session.id
    );
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LoginResponse {
            message: "Login successful.".to_string(),
            username: admin.username,
            csrf_token: session.csrf_token,
        }),
    ))
}

/// Handles `POST /admin/logout`. Destroys the session and expires the cookie.
pub async fn logout_handler(
    State(app_state): State<AppState>,
    AdminSession(session): AdminSession,
) -> Result<impl IntoResponse, AppError> {
    app_state.sessions.destroy(&session.id);
    info!(username = %session.username, "Admin signed out.");

    let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LogoutResponse {
            message: "Logout successful.".to_string(),
        }),
    ))
}
