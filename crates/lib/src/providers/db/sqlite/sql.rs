//! Centralized SQL constants for the application schema.
//!
//! Every statement is idempotent (`IF NOT EXISTS`) so the whole set can be
//! applied on each startup.

/// Stores admin accounts that may sign in to the dashboard.
pub const CREATE_ADMIN_USERS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS admin_users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    last_login TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);";

/// The product catalog shown on the dashboard.
pub const CREATE_PRODUCTS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    price REAL NOT NULL DEFAULT 0,
    stock INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);";

/// Customer orders.
pub const CREATE_ORDERS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER,
    total REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);";

/// Registered customers.
pub const CREATE_CUSTOMERS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS customers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT UNIQUE,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);";

/// All creation statements, applied in order by `initialize_schema`.
pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    CREATE_ADMIN_USERS_TABLE,
    CREATE_PRODUCTS_TABLE,
    CREATE_ORDERS_TABLE,
    CREATE_CUSTOMERS_TABLE,
];
