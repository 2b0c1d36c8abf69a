use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shopadmin::{ImportError, StorageError};
use tracing::error;

/// A custom error type for the server application.
///
/// This enum encapsulates different kinds of errors that can occur within the
/// server, allowing them to be converted into appropriate HTTP responses.
pub enum AppError {
    /// Errors from the plugin import pipeline.
    Import(ImportError),
    /// Errors from the SQLite storage provider.
    Storage(StorageError),
    /// The caller is not signed in, or credentials were rejected.
    Unauthorized(String),
    /// The caller is signed in but failed a CSRF check.
    Forbidden(String),
    /// The request itself was malformed (missing upload, wrong file type).
    BadRequest(String),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        AppError::Import(err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::Import(err) => {
                error!("ImportError: {:?}", err);
                match err {
                    // Archive-level and main-file failures abort the import
                    // with a user-visible message.
                    ImportError::ArchiveOpen(_)
                    | ImportError::ArchiveWrite(_)
                    | ImportError::MainFileNotFound => {
                        (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
                    }
                    ImportError::Io(_) | ImportError::Regex(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal error occurred during import.".to_string(),
                    ),
                }
            }
            AppError::Storage(err) => {
                error!("StorageError: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A storage error occurred.".to_string(),
                )
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
