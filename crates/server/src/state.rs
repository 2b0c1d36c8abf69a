//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The `AppState` holds all shared resources, such
//! as the configuration, the database provider, and the session store, making
//! them accessible to all request handlers.

use crate::auth::password::hash_password;
use crate::config::AppConfig;
use crate::session::SessionStore;
use shopadmin::providers::db::sqlite::SqliteProvider;
use std::sync::Arc;
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<AppConfig>,
    /// The database provider backing dashboards, credentials, and plugin
    /// schema application.
    pub sqlite_provider: Arc<SqliteProvider>,
    /// Active admin sessions, keyed by session id.
    pub sessions: Arc<SessionStore>,
}

/// Builds the shared application state from the configuration.
///
/// Initializes the SQLite schema and seeds the configured admin account if it
/// does not exist yet. An existing account keeps its stored password hash.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let sqlite_provider = SqliteProvider::new(&config.db_url).await?;
    info!(db_path = %config.db_url, "Initialized local storage provider (SQLite).");
    sqlite_provider.initialize_schema().await?;

    let password_hash = hash_password(&config.admin.password);
    sqlite_provider
        .upsert_admin_user(&config.admin.username, &password_hash)
        .await?;

    let sessions = SessionStore::new(config.session_lifetime_secs);

    Ok(AppState {
        config: Arc::new(config),
        sqlite_provider: Arc::new(sqlite_provider),
        sessions: Arc::new(sessions),
    })
}
