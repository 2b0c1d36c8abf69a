//! # Plugin Route Handlers
//!
//! The plugin upload endpoint drives the whole import pipeline: save the
//! uploaded archive, extract and scrape it, apply its schema statements to
//! the local database, and record the result in the caller's session. A
//! companion endpoint lists what the session has imported so far.

use super::{wrap_response, ApiResponse, AppError, AppState, DebugParams};
use crate::auth::middleware::AdminSession;
use crate::session::{InstalledPlugin, Session};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use axum_extra::extract::Multipart;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shopadmin::importer::{import_plugin, MenuDeclaration, PluginDescriptor};
use std::collections::BTreeMap;
use std::path::Path;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

/// The request header carrying the CSRF token on state-changing endpoints.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// The multipart field name for the uploaded archive.
const UPLOAD_FIELD: &str = "plugin_zip";

#[derive(Serialize, Deserialize)]
pub struct PluginUploadResponse {
    pub message: String,
    pub slug: String,
    pub descriptor: PluginDescriptor,
    pub menus: Vec<MenuDeclaration>,
    pub schema_statements: Vec<String>,
    /// How many schema statements actually executed. Statements that fail
    /// are skipped, so this can be lower than `schema_statements.len()`.
    pub applied_statements: usize,
}

#[derive(Serialize, Deserialize)]
pub struct PluginListResponse {
    pub plugins: BTreeMap<String, InstalledPlugin>,
}

/// Rejects the request unless it carries the session's CSRF token.
fn verify_csrf(session: &Session, headers: &HeaderMap) -> Result<(), AppError> {
    let provided = headers
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Forbidden("Missing CSRF token.".to_string()))?;

    if !bool::from(
        provided
            .as_bytes()
            .ct_eq(session.csrf_token.as_bytes()),
    ) {
        return Err(AppError::Forbidden("Invalid CSRF token.".to_string()));
    }
    Ok(())
}

/// Handles `POST /admin/plugins/upload`.
pub async fn upload_plugin_handler(
    State(app_state): State<AppState>,
    AdminSession(session): AdminSession,
    debug_params: Query<DebugParams>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<PluginUploadResponse>>, AppError> {
    verify_csrf(&session, &headers)?;

    let mut archive_data: Option<Vec<u8>> = None;
    let mut archive_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart request: {e}")))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            archive_name = field.file_name().map(str::to_string);
            archive_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?
                    .to_vec(),
            );
        }
    }

    let archive_data = archive_data.ok_or_else(|| {
        AppError::BadRequest(format!("Missing '{UPLOAD_FIELD}' upload field."))
    })?;
    let archive_name =
        archive_name.ok_or_else(|| AppError::BadRequest("Upload has no file name.".to_string()))?;

    // Only the extension is checked here. Whether the bytes really are a zip
    // archive is decided by the extraction step.
    let base_name = Path::new(&archive_name)
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AppError::BadRequest("Upload has an invalid file name.".to_string()))?;
    if !base_name.to_lowercase().ends_with(".zip") {
        return Err(AppError::BadRequest(
            "Only .zip plugin archives are accepted.".to_string(),
        ));
    }

    let upload_dir = Path::new(&app_state.config.upload_dir);
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create upload directory: {e}"))?;

    let zip_path = upload_dir.join(format!("{}_{base_name}", Utc::now().timestamp()));
    tokio::fs::write(&zip_path, &archive_data)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to save uploaded archive: {e}"))?;
    info!(path = %zip_path.display(), bytes = archive_data.len(), "Saved uploaded plugin archive.");

    let extract_dir = upload_dir.join("extracted");
    let imported = {
        let zip_path = zip_path.clone();
        tokio::task::spawn_blocking(move || import_plugin(&zip_path, &extract_dir))
            .await
            .map_err(|e| anyhow::anyhow!("Import task failed: {e}"))??
    };

    let applied_statements = app_state
        .sqlite_provider
        .apply_schema_statements(&imported.schema_statements)
        .await?;

    app_state.sessions.register_plugin(
        &session.id,
        &imported.slug,
        InstalledPlugin {
            info: imported.descriptor.clone(),
            menus: imported.menus.clone(),
            schemas: imported.schema_statements.clone(),
            path: imported.path.clone(),
        },
    );

    // The archive has served its purpose; the extracted bundle stays.
    if let Err(e) = tokio::fs::remove_file(&zip_path).await {
        warn!(path = %zip_path.display(), error = %e, "Failed to remove uploaded archive.");
    }

    let debug_info = json!({
        "extracted_path": imported.path,
        "statement_count": imported.schema_statements.len(),
    });
    let response = PluginUploadResponse {
        message: format!("Plugin '{}' imported.", imported.slug),
        slug: imported.slug,
        descriptor: imported.descriptor,
        menus: imported.menus,
        schema_statements: imported.schema_statements,
        applied_statements,
    };
    Ok(wrap_response(response, debug_params, Some(debug_info)))
}

/// Handles `GET /admin/plugins`: the session's installed-plugin registry.
pub async fn list_plugins_handler(
    State(app_state): State<AppState>,
    AdminSession(session): AdminSession,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<PluginListResponse>>, AppError> {
    let plugins: BTreeMap<String, InstalledPlugin> = app_state
        .sessions
        .installed_plugins(&session.id)
        .into_iter()
        .collect();

    let debug_info = json!({ "count": plugins.len() });
    Ok(wrap_response(PluginListResponse { plugins }, debug_params, Some(debug_info)))
}
