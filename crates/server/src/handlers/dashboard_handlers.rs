//! # Dashboard Route Handlers
//!
//! Read-only views over the store's catalog and sales data: summary counts
//! plus full listings of products, orders, and customers. All of them
//! require an authenticated admin session.

use super::{wrap_response, ApiResponse, AppError, AppState, DebugParams};
use crate::auth::middleware::AdminSession;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Serialize, Deserialize)]
pub struct DashboardResponse {
    pub username: String,
    pub products: i64,
    pub orders: i64,
    pub customers: i64,
}

/// Handles `GET /admin/dashboard`: row counts for the main entities.
pub async fn dashboard_handler(
    State(app_state): State<AppState>,
    AdminSession(session): AdminSession,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<DashboardResponse>>, AppError> {
    let products = app_state.sqlite_provider.count_rows("products").await?;
    let orders = app_state.sqlite_provider.count_rows("orders").await?;
    let customers = app_state.sqlite_provider.count_rows("customers").await?;

    let response = DashboardResponse {
        username: session.username,
        products,
        orders,
        customers,
    };
    let debug_info = json!({ "admin_id": session.admin_id });
    Ok(wrap_response(response, debug_params, Some(debug_info)))
}

async fn list_table(
    app_state: &AppState,
    debug_params: Query<DebugParams>,
    table: &str,
) -> Result<Json<ApiResponse<Vec<Value>>>, AppError> {
    let query = format!("SELECT * FROM {table} ORDER BY created_at DESC");
    let rows = app_state.sqlite_provider.fetch_all_json(&query).await?;
    let debug_info = json!({ "query": query, "rows": rows.len() });
    Ok(wrap_response(rows, debug_params, Some(debug_info)))
}

/// Handles `GET /admin/products`.
pub async fn list_products_handler(
    State(app_state): State<AppState>,
    AdminSession(_session): AdminSession,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<Value>>>, AppError> {
    list_table(&app_state, debug_params, "products").await
}

/// Handles `GET /admin/orders`.
pub async fn list_orders_handler(
    State(app_state): State<AppState>,
    AdminSession(_session): AdminSession,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<Value>>>, AppError> {
    list_table(&app_state, debug_params, "orders").await
}

/// Handles `GET /admin/customers`.
pub async fn list_customers_handler(
    State(app_state): State<AppState>,
    AdminSession(_session): AdminSession,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<Value>>>, AppError> {
    list_table(&app_state, debug_params, "customers").await
}
