use super::{handlers, state::AppState};
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/admin/login", post(handlers::login_handler))
        .route("/admin/logout", post(handlers::logout_handler))
        .route("/admin/dashboard", get(handlers::dashboard_handler))
        .route("/admin/products", get(handlers::list_products_handler))
        .route("/admin/orders", get(handlers::list_orders_handler))
        .route("/admin/customers", get(handlers::list_customers_handler))
        .route("/admin/plugins", get(handlers::list_plugins_handler))
        .route(
            "/admin/plugins/upload",
            post(handlers::upload_plugin_handler).layer(DefaultBodyLimit::max(10 * 1024 * 1024)),
        )
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
