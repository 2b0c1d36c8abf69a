use thiserror::Error;

/// Errors produced by the plugin import pipeline.
///
/// Archive-level failures and a missing main file abort the whole import.
/// Per-statement execution failures during schema application are *not*
/// represented here; they are swallowed and logged by the storage provider.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to open plugin archive: {0}")]
    ArchiveOpen(String),
    #[error("Failed to extract plugin archive: {0}")]
    ArchiveWrite(String),
    #[error("Could not find main plugin file")]
    MainFileNotFound,
    #[error("I/O error during import: {0}")]
    Io(#[from] std::io::Error),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Errors produced by the SQLite storage provider.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage connection error: {0}")]
    Connection(String),
    #[error("Storage operation failed: {0}")]
    OperationFailed(String),
}
