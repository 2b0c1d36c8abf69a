//! # Common Test Utilities
//!
//! The `TestApp` harness spawns a real server on a random port against an
//! isolated in-memory database and a temporary upload directory, and exposes
//! the `AppState` so tests can seed and inspect data directly.

#![allow(unused)]

use anyhow::Result;
use reqwest::Client;
use serde_json::Value;
use shopadmin_server::{
    config::{AdminConfig, AppConfig},
    router::create_router,
    state::{build_app_state, AppState},
};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// The seed admin credentials every `TestApp` is configured with.
pub const TEST_ADMIN_USERNAME: &str = "admin";
pub const TEST_ADMIN_PASSWORD: &str = "test-password";

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    /// A cookie-holding client; one login session per client.
    pub client: Client,
    pub app_state: AppState,
    _upload_dir: TempDir,
}

impl TestApp {
    /// Spawns the application server with the default session lifetime.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with_lifetime(3600).await
    }

    /// Spawns the application server with an explicit session lifetime.
    pub async fn spawn_with_lifetime(session_lifetime_secs: u64) -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let upload_dir = TempDir::new()?;
        let config = AppConfig {
            port: 0,
            db_url: ":memory:".to_string(),
            upload_dir: upload_dir.path().to_str().unwrap().to_string(),
            session_lifetime_secs,
            admin: AdminConfig {
                username: TEST_ADMIN_USERNAME.to_string(),
                password: TEST_ADMIN_PASSWORD.to_string(),
            },
        };

        let app_state = build_app_state(config).await?;
        let app = create_router(app_state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = format!("http://{}", listener.local_addr()?);
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server crashed");
        });

        Ok(Self {
            address,
            client: new_client()?,
            app_state,
            _upload_dir: upload_dir,
        })
    }

    /// Logs the harness client in and returns the CSRF token.
    pub async fn login(&self) -> Result<String> {
        login_with(&self.client, &self.address).await
    }
}

/// Builds a fresh client with its own cookie store, i.e. its own session.
pub fn new_client() -> Result<Client> {
    Ok(Client::builder().cookie_store(true).build()?)
}

/// Logs `client` in with the seed admin credentials and returns the CSRF token.
pub async fn login_with(client: &Client, address: &str) -> Result<String> {
    let response = client
        .post(format!("{address}/admin/login"))
        .json(&serde_json::json!({
            "username": TEST_ADMIN_USERNAME,
            "password": TEST_ADMIN_PASSWORD,
        }))
        .send()
        .await?;
    anyhow::ensure!(
        response.status().is_success(),
        "login failed: {}",
        response.status()
    );

    let body: Value = response.json().await?;
    let csrf_token = body["csrf_token"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("login response missing csrf_token"))?;
    Ok(csrf_token.to_string())
}
