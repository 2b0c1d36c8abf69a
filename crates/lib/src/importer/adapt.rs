//! # Statement Adaptation
//!
//! Plugin source targets a prefixed MySQL deployment; before execution each
//! extracted statement is rewritten for the local store by stripping the two
//! known table-prefix spellings. This is textual substitution, nothing more.

/// The templated prefix expression as it appears in plugin source.
pub const TEMPLATED_PREFIX_TOKEN: &str = "{$wpdb->prefix}";

/// The literal prefix string used by plugins that hardcode their table names.
pub const LITERAL_PREFIX: &str = "wp_";

/// Rewrites a raw schema statement for the local store.
///
/// Both prefix spellings are replaced with the empty string. The result is
/// guaranteed to contain neither substring, but is otherwise unvalidated.
pub fn adapt_statement(statement: &str) -> String {
    statement
        .replace(TEMPLATED_PREFIX_TOKEN, "")
        .replace(LITERAL_PREFIX, "")
}
