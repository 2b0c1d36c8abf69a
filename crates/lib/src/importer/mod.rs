//! # Plugin Import Pipeline
//!
//! Transforms an uploaded plugin archive into descriptive metadata, menu
//! declarations, and raw schema statements. The pipeline is a single linear
//! sequence: extract the archive, locate the main file, scrape metadata and
//! menu registrations out of it, then walk the whole bundle for installer
//! files carrying `CREATE TABLE` statements.
//!
//! This is best-effort text scraping over plugin source, not a parser. The
//! patterns will miss registrations written in unusual ways and can misfire
//! on unrelated text that happens to match; both outcomes are accepted.

pub mod adapt;
pub mod types;

pub use adapt::{adapt_statement, LITERAL_PREFIX, TEMPLATED_PREFIX_TOKEN};
pub use types::{ExtractedPlugin, ImportedPlugin, MenuDeclaration, MenuKind, PluginDescriptor};

use crate::errors::ImportError;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

/// The file extension of recognized plugin source files.
const SOURCE_EXTENSION: &str = "php";

/// The marker line that identifies a plugin's main file.
const MAIN_FILE_MARKER: &str = r"(?i)Plugin Name:";

/// Runs the full import pipeline against an uploaded archive.
///
/// Fails fast on any archive-level error or when no main file can be found;
/// per-file parsing misses simply contribute nothing to the result.
pub fn import_plugin(zip_path: &Path, extract_dir: &Path) -> Result<ImportedPlugin, ImportError> {
    let extracted = extract_archive(zip_path, extract_dir)?;
    let descriptor = parse_descriptor(&extracted.path)?;
    let menus = parse_menu_declarations(&descriptor.main_file)?;
    let schema_statements = extract_schema_statements(&extracted.path)?;

    info!(
        slug = %extracted.slug,
        menus = menus.len(),
        statements = schema_statements.len(),
        "Plugin import pipeline completed."
    );

    Ok(ImportedPlugin {
        path: extracted.path,
        slug: extracted.slug,
        descriptor,
        menus,
        schema_statements,
    })
}

/// Unpacks the archive under `extract_dir` and derives the plugin slug.
///
/// The slug is the archive's *first* entry name with leading and trailing
/// path separators trimmed. Archive ordering decides what comes first, so
/// the slug is not guaranteed to equal the logical top-level directory;
/// that fragility is preserved deliberately.
pub fn extract_archive(
    zip_path: &Path,
    extract_dir: &Path,
) -> Result<ExtractedPlugin, ImportError> {
    let file =
        fs::File::open(zip_path).map_err(|e| ImportError::ArchiveOpen(e.to_string()))?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| ImportError::ArchiveOpen(e.to_string()))?;

    if archive.is_empty() {
        return Err(ImportError::ArchiveOpen(
            "archive contains no entries".to_string(),
        ));
    }

    let first_entry = archive
        .by_index(0)
        .map_err(|e| ImportError::ArchiveOpen(e.to_string()))?
        .name()
        .to_string();
    let slug = first_entry.trim_matches('/').to_string();

    fs::create_dir_all(extract_dir).map_err(|e| ImportError::ArchiveWrite(e.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| ImportError::ArchiveOpen(e.to_string()))?;
        let out_path = extract_dir.join(entry.name());

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .map_err(|e| ImportError::ArchiveWrite(e.to_string()))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ImportError::ArchiveWrite(e.to_string()))?;
        }
        let mut out_file =
            fs::File::create(&out_path).map_err(|e| ImportError::ArchiveWrite(e.to_string()))?;
        io::copy(&mut entry, &mut out_file)
            .map_err(|e| ImportError::ArchiveWrite(e.to_string()))?;
    }

    debug!(slug = %slug, "Archive extracted.");

    Ok(ExtractedPlugin {
        path: extract_dir.join(&slug),
        slug,
    })
}

/// Locates the main file and scrapes the labeled metadata out of it.
///
/// Scans top-level source files in name order; the first file containing the
/// `Plugin Name:` marker wins, even if a more canonical candidate exists
/// later. Each recognized label contributes at most one value.
pub fn parse_descriptor(extracted_root: &Path) -> Result<PluginDescriptor, ImportError> {
    let main_file = find_main_file(extracted_root)?.ok_or(ImportError::MainFileNotFound)?;
    let content = read_source(&main_file)?;

    let descriptor = PluginDescriptor {
        name: extract_labeled_value(&content, "Plugin Name")?,
        version: extract_labeled_value(&content, "Version")?,
        description: extract_labeled_value(&content, "Description")?,
        author: extract_labeled_value(&content, "Author")?,
        main_file,
    };

    Ok(descriptor)
}

/// Scans the main file for menu registration patterns.
///
/// Pure text matching over two call-like shapes: `add_menu_page('a', 'b', …)`
/// yields a top-level declaration from its first two quoted arguments, and
/// `add_submenu_page('p', 'a', 'b', …)` yields a nested declaration from its
/// first three. All top-level matches come first (in file order), then all
/// submenu matches (in file order).
pub fn parse_menu_declarations(main_file: &Path) -> Result<Vec<MenuDeclaration>, ImportError> {
    let content = read_source(main_file)?;
    let mut menus = Vec::new();

    let menu_re =
        Regex::new(r#"add_menu_page\s*\(\s*['"]([^'"]+)['"]\s*,\s*['"]([^'"]+)['"]"#)?;
    for caps in menu_re.captures_iter(&content) {
        menus.push(MenuDeclaration {
            kind: MenuKind::Main,
            parent: None,
            page_title: caps[1].to_string(),
            menu_title: caps[2].to_string(),
        });
    }

    let submenu_re = Regex::new(
        r#"add_submenu_page\s*\(\s*['"]([^'"]+)['"]\s*,\s*['"]([^'"]+)['"]\s*,\s*['"]([^'"]+)['"]"#,
    )?;
    for caps in submenu_re.captures_iter(&content) {
        menus.push(MenuDeclaration {
            kind: MenuKind::Submenu,
            parent: Some(caps[1].to_string()),
            page_title: caps[2].to_string(),
            menu_title: caps[3].to_string(),
        });
    }

    Ok(menus)
}

/// Walks the extracted bundle and pulls `CREATE TABLE ... ;` statements out
/// of installer files.
///
/// A file counts as an installer when its text matches a class-name fragment
/// suggesting installation logic or an activation-hook call, case-insensitive.
/// Statements are appended verbatim in file-then-match order, with no
/// deduplication and no validation against the target database dialect.
pub fn extract_schema_statements(extracted_root: &Path) -> Result<Vec<String>, ImportError> {
    let installer_class_re = Regex::new(r"(?i)class.*install")?;
    let activation_hook_re = Regex::new(r"(?i)register_activation_hook")?;
    let schema_re = Regex::new(r"(?is)CREATE TABLE[^;]+;")?;

    let mut source_files = Vec::new();
    collect_source_files(extracted_root, &mut source_files)?;
    source_files.sort();

    let mut installer_files = Vec::new();
    for path in &source_files {
        let content = read_source(path)?;
        if installer_class_re.is_match(&content) || activation_hook_re.is_match(&content) {
            installer_files.push(path.clone());
        }
    }

    let mut statements = Vec::new();
    for path in &installer_files {
        let content = read_source(path)?;
        for found in schema_re.find_iter(&content) {
            statements.push(found.as_str().to_string());
        }
    }

    debug!(
        installers = installer_files.len(),
        statements = statements.len(),
        "Schema statement extraction completed."
    );

    Ok(statements)
}

/// Scans top-level source files for the main-file marker, in name order.
fn find_main_file(extracted_root: &Path) -> Result<Option<PathBuf>, ImportError> {
    if !extracted_root.is_dir() {
        return Ok(None);
    }

    let marker_re = Regex::new(MAIN_FILE_MARKER)?;

    let mut candidates: Vec<PathBuf> = fs::read_dir(extracted_root)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_source_extension(path))
        .collect();
    candidates.sort();

    for path in candidates {
        let content = read_source(&path)?;
        if marker_re.is_match(&content) {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

/// Extracts at most one value for a `Label: value` line, case-insensitive on
/// the label, trimming surrounding whitespace from the value.
fn extract_labeled_value(content: &str, label: &str) -> Result<Option<String>, ImportError> {
    let re = Regex::new(&format!(r"(?i){label}:\s*(.+)"))?;
    Ok(re
        .captures(content)
        .map(|caps| caps[1].trim().to_string()))
}

fn collect_source_files(dir: &Path, acc: &mut Vec<PathBuf>) -> Result<(), ImportError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_source_files(&path, acc)?;
        } else if has_source_extension(&path) {
            acc.push(path);
        }
    }
    Ok(())
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

/// Reads a source file, substituting invalid UTF-8 rather than failing.
fn read_source(path: &Path) -> Result<String, ImportError> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
