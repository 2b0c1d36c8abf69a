//! # shopadmin
//!
//! Core library for the shopadmin e-commerce administration backend.
//!
//! The interesting part lives in [`importer`]: a best-effort pipeline that
//! unpacks an uploaded plugin archive, scrapes metadata and menu
//! registrations out of its source with text patterns, and extracts embedded
//! `CREATE TABLE` statements for execution against the application database.
//! [`providers::db::sqlite`] wraps the local SQLite store used by the server.

pub mod errors;
pub mod importer;
pub mod providers;

pub use errors::{ImportError, StorageError};
pub use importer::{
    import_plugin, ImportedPlugin, MenuDeclaration, MenuKind, PluginDescriptor,
};
