//! Shared helpers for shopadmin tests: plugin archive fixtures and seeded
//! in-memory databases.

use anyhow::Result;
use shopadmin::providers::db::sqlite::SqliteProvider;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

// --- Test Setup ---

/// A helper struct to manage database creation for each test.
pub struct TestSetup {
    pub provider: SqliteProvider,
}

impl TestSetup {
    /// Creates a new, isolated in-memory database and initializes the schema.
    pub async fn new() -> Result<Self> {
        let provider = SqliteProvider::new(":memory:").await?;
        provider.initialize_schema().await?;
        Ok(Self { provider })
    }
}

// --- Plugin Archive Fixtures ---

/// Builds a plugin zip archive in memory from `(entry_name, content)` pairs.
/// Entries whose name ends in `/` become directories.
pub fn build_plugin_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = SimpleFileOptions::default();

        for (name, content) in entries {
            if name.ends_with('/') {
                writer
                    .add_directory(name.to_string(), options)
                    .expect("failed to add directory entry");
            } else {
                writer
                    .start_file(name.to_string(), options)
                    .expect("failed to start file entry");
                writer
                    .write_all(content.as_bytes())
                    .expect("failed to write file entry");
            }
        }
        writer.finish().expect("failed to finish zip archive");
    }
    cursor.into_inner()
}

/// Writes a plugin zip archive to `dir` and returns its path.
pub fn write_plugin_zip(dir: &Path, file_name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, build_plugin_zip(entries)).expect("failed to write zip fixture");
    path
}

/// A minimal well-formed plugin: one main file with metadata and a menu
/// registration, plus an installer file carrying one schema statement.
pub fn sample_plugin_entries() -> Vec<(&'static str, &'static str)> {
    vec![
        ("shop-plugin/", ""),
        (
            "shop-plugin/main.php",
            r#"<?php
/*
Plugin Name: Shop Widget
Version: 1.0.0
Description: Adds a shop widget.
Author: Widget Co
*/
add_menu_page('Shop', 'Shop Menu', 'manage_options', 'shop');
"#,
        ),
        (
            "shop-plugin/install.php",
            r#"<?php
register_activation_hook(__FILE__, 'shop_widget_install');
function shop_widget_install() {
    $sql = "CREATE TABLE wp_shop_widgets (id INT);";
}
"#,
        ),
    ]
}
