//! # Authentication and Session Tests
//!
//! End-to-end tests for login, logout, session cookies, and the
//! authentication guard on the admin endpoints.

mod common;

use anyhow::Result;
use common::{new_client, TestApp, TEST_ADMIN_USERNAME};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn root_and_health_are_public() -> Result<()> {
    let app = TestApp::spawn().await?;

    let response = app.client.get(format!("{}/", app.address)).send().await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "shopadmin server is running.");

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");
    Ok(())
}

#[tokio::test]
async fn login_returns_csrf_token_and_sets_session_cookie() -> Result<()> {
    let app = TestApp::spawn().await?;

    let response = app
        .client
        .post(format!("{}/admin/login", app.address))
        .json(&json!({
            "username": TEST_ADMIN_USERNAME,
            "password": common::TEST_ADMIN_PASSWORD,
        }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .expect("login should set a cookie")
        .to_str()?
        .to_string();
    assert!(set_cookie.starts_with("shopadmin_session="));
    assert!(set_cookie.contains("HttpOnly"));

    let body: Value = response.json().await?;
    assert_eq!(body["username"], TEST_ADMIN_USERNAME);
    assert!(!body["csrf_token"].as_str().unwrap().is_empty());

    // The cookie-holding client can now reach a protected endpoint.
    let response = app
        .client
        .get(format!("{}/admin/dashboard", app.address))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_user_are_indistinguishable() -> Result<()> {
    let app = TestApp::spawn().await?;

    let wrong_password = app
        .client
        .post(format!("{}/admin/login", app.address))
        .json(&json!({ "username": TEST_ADMIN_USERNAME, "password": "nope" }))
        .send()
        .await?;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password_body: Value = wrong_password.json().await?;

    let unknown_user = app
        .client
        .post(format!("{}/admin/login", app.address))
        .json(&json!({ "username": "nobody", "password": "nope" }))
        .send()
        .await?;
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    let unknown_user_body: Value = unknown_user.json().await?;

    assert_eq!(wrong_password_body, unknown_user_body);
    Ok(())
}

#[tokio::test]
async fn protected_endpoints_require_a_session() -> Result<()> {
    let app = TestApp::spawn().await?;
    let anonymous = new_client()?;

    for path in [
        "/admin/dashboard",
        "/admin/products",
        "/admin/orders",
        "/admin/customers",
        "/admin/plugins",
    ] {
        let response = anonymous
            .get(format!("{}{path}", app.address))
            .send()
            .await?;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "expected 401 for {path}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn bogus_session_cookie_is_rejected() -> Result<()> {
    let app = TestApp::spawn().await?;

    let response = new_client()?
        .get(format!("{}/admin/dashboard", app.address))
        .header("Cookie", "shopadmin_session=not-a-real-session")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn logout_invalidates_the_session() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.login().await?;

    let response = app
        .client
        .get(format!("{}/admin/dashboard", app.address))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client
        .post(format!("{}/admin/logout", app.address))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client
        .get(format!("{}/admin/dashboard", app.address))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn expired_session_is_rejected() -> Result<()> {
    let app = TestApp::spawn_with_lifetime(0).await?;
    app.login().await?;

    let response = app
        .client
        .get(format!("{}/admin/dashboard", app.address))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_records_last_login() -> Result<()> {
    let app = TestApp::spawn().await?;

    let before = app
        .app_state
        .sqlite_provider
        .get_admin_by_username(TEST_ADMIN_USERNAME)
        .await?
        .expect("seed admin should exist");
    assert!(before.last_login.is_none());

    app.login().await?;

    let after = app
        .app_state
        .sqlite_provider
        .get_admin_by_username(TEST_ADMIN_USERNAME)
        .await?
        .expect("seed admin should exist");
    assert!(after.last_login.is_some());
    Ok(())
}

#[tokio::test]
async fn dashboard_reports_seeded_counts() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.login().await?;

    app.app_state
        .sqlite_provider
        .initialize_with_data(
            "INSERT INTO products (name, price, stock) VALUES ('Mug', 9.5, 20);
             INSERT INTO products (name, price, stock) VALUES ('Shirt', 25.0, 5);
             INSERT INTO customers (name, email) VALUES ('Ada', 'ada@example.com');
             INSERT INTO orders (customer_id, total, status) VALUES (1, 9.5, 'paid');",
        )
        .await?;

    let body: Value = app
        .client
        .get(format!("{}/admin/dashboard", app.address))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["result"]["username"], TEST_ADMIN_USERNAME);
    assert_eq!(body["result"]["products"], 2);
    assert_eq!(body["result"]["orders"], 1);
    assert_eq!(body["result"]["customers"], 1);
    Ok(())
}

#[tokio::test]
async fn product_listing_returns_rows_newest_first() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.login().await?;

    app.app_state
        .sqlite_provider
        .initialize_with_data(
            "INSERT INTO products (name, price, created_at) VALUES ('Old', 1.0, '2024-01-01 00:00:00');
             INSERT INTO products (name, price, created_at) VALUES ('New', 2.0, '2025-01-01 00:00:00');",
        )
        .await?;

    let body: Value = app
        .client
        .get(format!("{}/admin/products", app.address))
        .send()
        .await?
        .json()
        .await?;

    let rows = body["result"].as_array().expect("rows should be an array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "New");
    assert_eq!(rows[1]["name"], "Old");
    Ok(())
}
