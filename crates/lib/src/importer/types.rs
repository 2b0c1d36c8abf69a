use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata discovered in a plugin's main file.
///
/// Every field is optional: a label that never appears in the main file
/// simply leaves its field unset. `main_file` records which file won the
/// marker scan so menu parsing can run against the same file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub main_file: PathBuf,
}

/// Discriminates top-level menu entries from nested ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuKind {
    Main,
    Submenu,
}

/// A UI menu entry a plugin registers, recovered by text pattern matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuDeclaration {
    #[serde(rename = "type")]
    pub kind: MenuKind,
    /// The parent slug, present only for submenu entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub page_title: String,
    pub menu_title: String,
}

/// The result of unpacking an archive, before any parsing has happened.
#[derive(Debug, Clone)]
pub struct ExtractedPlugin {
    /// Root directory of the extracted bundle.
    pub path: PathBuf,
    /// Identifier derived from the archive's first entry name. Callers must
    /// tolerate this being unreliable: it is whatever the archive's internal
    /// ordering happens to put first, not necessarily the top-level directory.
    pub slug: String,
}

/// The structured output of a full plugin import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedPlugin {
    pub path: PathBuf,
    pub slug: String,
    pub descriptor: PluginDescriptor,
    pub menus: Vec<MenuDeclaration>,
    /// Raw `CREATE TABLE ... ;` statements, verbatim from plugin source.
    pub schema_statements: Vec<String>,
}
