use crate::errors::StorageError;
use crate::importer::adapt_statement;
use serde_json::Value;
use std::fmt::{self, Debug};
use tracing::{debug, info, warn};
use turso::{params, Database, Value as TursoValue};

pub mod sql;

/// An admin account row from the `admin_users` table.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub last_login: Option<String>,
}

/// A provider for interacting with a local SQLite database using Turso.
///
/// The provider holds a `Database` instance, which manages a connection pool.
/// When cloned, it shares the same underlying database, allowing for
/// concurrent and shared access to the same database file or in-memory
/// instance.
#[derive(Clone)]
pub struct SqliteProvider {
    /// The Turso database instance. It's cloneable and thread-safe.
    pub db: Database,
}

impl SqliteProvider {
    /// Creates a new `SqliteProvider` from a file path or in-memory.
    ///
    /// Use ":memory:" for a unique, isolated in-memory database. To share an
    /// in-memory database across multiple callers (e.g., in tests), create
    /// one provider and then `.clone()` it.
    pub async fn new(db_path: &str) -> Result<Self, StorageError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        // WAL improves concurrency for file-backed databases and is a no-op
        // for in-memory ones.
        let conn = db
            .connect()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(Self { db })
    }

    /// Ensures that all application tables exist.
    /// Idempotent and safe to call on every startup.
    pub async fn initialize_schema(&self) -> Result<(), StorageError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for statement in sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ())
                .await
                .map_err(|e| StorageError::OperationFailed(e.to_string()))?;
        }
        Ok(())
    }

    /// A helper for tests to pre-populate data by executing multiple SQL statements.
    pub async fn initialize_with_data(&self, init_sql: &str) -> Result<(), StorageError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for statement in init_sql.split(';').filter(|s| !s.trim().is_empty()) {
            conn.execute(statement, ())
                .await
                .map_err(|e| StorageError::OperationFailed(e.to_string()))?;
        }
        Ok(())
    }

    /// Applies extracted plugin schema statements, best effort.
    ///
    /// Each statement is adapted for the local store (prefix tokens removed)
    /// and executed directly. A statement that fails is logged and skipped;
    /// it never aborts the remaining statements, so a partially-applied
    /// schema is an expected outcome. There is no rollback and no idempotence
    /// guarantee. Returns the number of statements that executed.
    pub async fn apply_schema_statements(
        &self,
        statements: &[String],
    ) -> Result<usize, StorageError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut applied = 0;
        for statement in statements {
            let adapted = adapt_statement(statement);
            debug!(statement = %adapted, "--> Applying plugin schema statement");
            match conn.execute(&adapted, ()).await {
                Ok(_) => applied += 1,
                Err(e) => {
                    warn!(error = %e, statement = %adapted, "Plugin schema statement failed; continuing.");
                }
            }
        }

        info!(
            applied,
            total = statements.len(),
            "Plugin schema application finished."
        );
        Ok(applied)
    }

    /// Counts the rows of a table. The table name is interpolated, so callers
    /// must pass only trusted, application-defined names.
    pub async fn count_rows(&self, table: &str) -> Result<i64, StorageError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut rows = conn
            .query(&format!("SELECT COUNT(*) FROM {table}"), ())
            .await
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?;

        match rows
            .next()
            .await
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?
        {
            Some(row) => match row
                .get_value(0)
                .map_err(|e| StorageError::OperationFailed(e.to_string()))?
            {
                TursoValue::Integer(count) => Ok(count),
                other => Err(StorageError::OperationFailed(format!(
                    "unexpected COUNT(*) value: {other:?}"
                ))),
            },
            None => Err(StorageError::OperationFailed(
                "COUNT(*) returned no rows".to_string(),
            )),
        }
    }

    /// Executes a query and returns each row as a column-name keyed JSON object.
    pub async fn fetch_all_json(&self, query: &str) -> Result<Vec<Value>, StorageError> {
        debug!(query = %query, "--> Executing SQLite query");

        let conn = self
            .db
            .connect()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut stmt = conn
            .prepare(query)
            .await
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?;

        let column_names: Vec<String> = stmt
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut rows = stmt
            .query(())
            .await
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?;

        let mut json_results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?
        {
            let mut row_map = serde_json::Map::new();
            for (i, name) in column_names.iter().enumerate() {
                let value = row
                    .get_value(i)
                    .map_err(|e| StorageError::OperationFailed(e.to_string()))?;
                row_map.insert(name.clone(), turso_value_to_json(value));
            }
            json_results.push(Value::Object(row_map));
        }

        Ok(json_results)
    }

    /// Looks up an admin account by username.
    pub async fn get_admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminUser>, StorageError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut rows = conn
            .query(
                "SELECT id, username, password, last_login FROM admin_users WHERE username = ?",
                params![username.to_string()],
            )
            .await
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?
        else {
            return Ok(None);
        };

        let id = match row
            .get_value(0)
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?
        {
            TursoValue::Integer(id) => id,
            other => {
                return Err(StorageError::OperationFailed(format!(
                    "unexpected admin id value: {other:?}"
                )))
            }
        };
        let username = text_column(&row, 1)?;
        let password_hash = text_column(&row, 2)?;
        let last_login = match row
            .get_value(3)
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?
        {
            TursoValue::Text(s) => Some(s),
            _ => None,
        };

        Ok(Some(AdminUser {
            id,
            username,
            password_hash,
            last_login,
        }))
    }

    /// Seeds an admin account if one with this username does not exist yet.
    /// An existing account keeps its stored hash.
    pub async fn upsert_admin_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), StorageError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        conn.execute(
            "INSERT OR IGNORE INTO admin_users (username, password) VALUES (?, ?)",
            params![username.to_string(), password_hash.to_string()],
        )
        .await
        .map_err(|e| StorageError::OperationFailed(e.to_string()))?;
        Ok(())
    }

    /// Records a successful login for an admin account.
    pub async fn touch_admin_last_login(&self, admin_id: i64) -> Result<(), StorageError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        conn.execute(
            "UPDATE admin_users SET last_login = ? WHERE id = ?",
            params![now, admin_id],
        )
        .await
        .map_err(|e| StorageError::OperationFailed(e.to_string()))?;
        Ok(())
    }
}

impl Debug for SqliteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteProvider").finish_non_exhaustive()
    }
}

impl AsRef<Database> for SqliteProvider {
    fn as_ref(&self) -> &Database {
        &self.db
    }
}

fn text_column(row: &turso::Row, index: usize) -> Result<String, StorageError> {
    match row
        .get_value(index)
        .map_err(|e| StorageError::OperationFailed(e.to_string()))?
    {
        TursoValue::Text(s) => Ok(s),
        other => Err(StorageError::OperationFailed(format!(
            "expected text column at index {index}, got {other:?}"
        ))),
    }
}

/// Converts a Turso value to a serde_json::Value.
fn turso_value_to_json(v: TursoValue) -> Value {
    match v {
        TursoValue::Null => Value::Null,
        TursoValue::Integer(i) => Value::Number(i.into()),
        TursoValue::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        TursoValue::Text(s) => Value::String(s),
        TursoValue::Blob(_) => Value::String("<blob>".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initialize_schema_is_idempotent() {
        let provider = SqliteProvider::new(":memory:").await.unwrap();
        provider.initialize_schema().await.unwrap();
        provider.initialize_schema().await.unwrap();

        assert_eq!(provider.count_rows("products").await.unwrap(), 0);
        assert_eq!(provider.count_rows("orders").await.unwrap(), 0);
        assert_eq!(provider.count_rows("customers").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn apply_schema_statements_adapts_and_executes() {
        let provider = SqliteProvider::new(":memory:").await.unwrap();

        let statements = vec![
            "CREATE TABLE {$wpdb->prefix}widgets (id INT);".to_string(),
            "CREATE TABLE wp_widget_meta (id INT);".to_string(),
        ];
        let applied = provider.apply_schema_statements(&statements).await.unwrap();
        assert_eq!(applied, 2);

        assert_eq!(provider.count_rows("widgets").await.unwrap(), 0);
        assert_eq!(provider.count_rows("widget_meta").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failing_statement_does_not_abort_the_batch() {
        let provider = SqliteProvider::new(":memory:").await.unwrap();

        let statements = vec![
            "CREATE TABLE first (id INT);".to_string(),
            "THIS IS NOT SQL;".to_string(),
            "CREATE TABLE second (id INT);".to_string(),
        ];
        let applied = provider.apply_schema_statements(&statements).await.unwrap();
        assert_eq!(applied, 2);

        assert_eq!(provider.count_rows("first").await.unwrap(), 0);
        assert_eq!(provider.count_rows("second").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn admin_user_roundtrip() {
        let provider = SqliteProvider::new(":memory:").await.unwrap();
        provider.initialize_schema().await.unwrap();

        assert!(provider
            .get_admin_by_username("admin")
            .await
            .unwrap()
            .is_none());

        provider.upsert_admin_user("admin", "hash-one").await.unwrap();
        let admin = provider
            .get_admin_by_username("admin")
            .await
            .unwrap()
            .expect("admin should exist");
        assert_eq!(admin.username, "admin");
        assert_eq!(admin.password_hash, "hash-one");
        assert!(admin.last_login.is_none());

        // Seeding again must not overwrite the stored hash.
        provider.upsert_admin_user("admin", "hash-two").await.unwrap();
        let admin = provider
            .get_admin_by_username("admin")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.password_hash, "hash-one");

        provider.touch_admin_last_login(admin.id).await.unwrap();
        let admin = provider
            .get_admin_by_username("admin")
            .await
            .unwrap()
            .unwrap();
        assert!(admin.last_login.is_some());
    }

    #[tokio::test]
    async fn fetch_all_json_returns_column_keyed_rows() {
        let provider = SqliteProvider::new(":memory:").await.unwrap();
        provider.initialize_schema().await.unwrap();
        provider
            .initialize_with_data(
                "INSERT INTO products (name, price, stock) VALUES ('Mug', 9.5, 3);",
            )
            .await
            .unwrap();

        let rows = provider
            .fetch_all_json("SELECT name, price, stock FROM products")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Mug");
        assert_eq!(rows[0]["stock"], 3);
    }
}
