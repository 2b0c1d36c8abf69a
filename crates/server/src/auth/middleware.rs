//! # Session Authentication Middleware
//!
//! This module provides the Axum extractor for cookie-based admin sessions.
//! Handlers that take an `AdminSession` argument only run for requests that
//! carry a valid, unexpired session cookie.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{headers::Cookie, TypedHeader};
use serde_json::json;
use tracing::warn;

use crate::{session::Session, state::AppState};

/// The name of the cookie carrying the admin session id.
pub const SESSION_COOKIE: &str = "shopadmin_session";

/// An Axum extractor that provides the current admin session.
///
/// The extracted value is a snapshot taken at extraction time; handlers that
/// mutate session state go back through the `SessionStore` by id.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

/// A custom rejection type for authentication failures.
///
/// This allows the `FromRequestParts` implementation to return a specific
/// HTTP status code and error message, which Axum then turns into a response.
pub struct AuthError(StatusCode, String);

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie_header = Option::<TypedHeader<Cookie>>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                warn!("Unexpected error during cookie extraction: {}", e);
                AuthError(
                    StatusCode::BAD_REQUEST,
                    "Invalid Cookie header format.".to_string(),
                )
            })?;

        let session_id = cookie_header
            .as_ref()
            .and_then(|header| header.0.get(SESSION_COOKIE))
            .ok_or_else(|| {
                AuthError(
                    StatusCode::UNAUTHORIZED,
                    "Authentication required.".to_string(),
                )
            })?;

        match state.sessions.get(session_id) {
            Some(session) => Ok(AdminSession(session)),
            None => Err(AuthError(
                StatusCode::UNAUTHORIZED,
                "Invalid or expired session.".to_string(),
            )),
        }
    }
}
