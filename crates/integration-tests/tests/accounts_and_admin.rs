//! Sign-in, session expiry, and admin access.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use vitrina_integration_tests::{TestApp, admin, customer, product};
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_wrong_password_rerenders_login() {
    let mut app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Invalid credentials"
        })))
        .mount(&app.backend)
        .await;

    let response = app
        .post_form("/auth/login", &[("email", "ana@example.com"), ("password", "nope")])
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Invalid credentials"));
    assert!(response.body.contains("ana@example.com"));
}

#[tokio::test]
async fn test_login_shows_user_in_header() {
    let mut app = TestApp::spawn().await;
    app.mock_catalog(&[]).await;

    app.login_as(customer(), "tok-100").await;
    let home = app.get("/").await;

    assert!(home.body.contains("Ana"));
    assert!(home.body.contains("Log out"));
    assert!(!home.body.contains(r#"href="/admin""#));
}

#[tokio::test]
async fn test_carts_follow_the_signed_in_user() {
    let mut app = TestApp::spawn().await;
    app.mock_catalog(&[product("p-1", "Mate Cebador", 15_000)]).await;
    app.post_form("/cart/add", &[("product_id", "p-1")]).await;

    app.login_as(customer(), "tok-100").await;
    let signed_in = app.get("/cart").await;
    assert!(signed_in.body.contains("Your cart is empty."));

    app.post_form("/auth/logout", &[]).await;
    let guest = app.get("/cart").await;
    assert!(guest.body.contains("Mate Cebador"));
}

#[tokio::test]
async fn test_orders_require_login() {
    let mut app = TestApp::spawn().await;

    let response = app.get("/orders").await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/auth/login"));
}

#[tokio::test]
async fn test_expired_token_signs_user_out() {
    let mut app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "jwt expired"
        })))
        .mount(&app.backend)
        .await;

    app.login_as(customer(), "tok-100").await;
    let response = app.get("/orders").await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/auth/login"));

    let login = app.get("/auth/login").await;
    assert!(login.body.contains("Your session has expired. Please log in again."));

    let retry = app.get("/orders").await;
    assert_eq!(retry.location(), Some("/auth/login"));
}

#[tokio::test]
async fn test_non_admin_is_sent_home_from_admin() {
    let mut app = TestApp::spawn().await;
    app.login_as(customer(), "tok-100").await;

    let response = app.get("/admin/products").await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));
}

#[tokio::test]
async fn test_admin_sees_all_orders() {
    let mut app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/orders/admin/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "_id": "66f0a1b2c3d4e5f6a7b8c9d0",
                "user": { "nombre": "Ana", "email": "ana@example.com" },
                "productos": [{ "nombre": "Mate Cebador", "precio": 15000, "cantidad": 2 }],
                "total": 30000,
                "status": "completed",
                "createdAt": "2026-03-14T12:00:00.000Z"
            }]
        })))
        .mount(&app.backend)
        .await;

    app.login_as(admin(), "tok-1").await;
    let response = app.get("/admin/orders").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Mate Cebador"));
    assert!(response.body.contains("ana@example.com"));
    assert!(response.body.contains("Completed"));
}

#[tokio::test]
async fn test_admin_product_form_rejects_invalid_input() {
    let mut app = TestApp::spawn().await;
    app.login_as(admin(), "tok-1").await;

    let response = app
        .post_form(
            "/admin/products",
            &[
                ("name", ""),
                ("description", "Gourd"),
                ("price", "-3"),
                ("image", ""),
                ("stock", "4"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Name is required"));
    assert!(response.body.contains("Price cannot be negative"));
}

#[tokio::test]
async fn test_notice_queued_before_login_survives_the_login_redirect() {
    let mut app = TestApp::spawn().await;
    app.mock_catalog(&[product("p-1", "Mate Cebador", 15_000)]).await;
    app.post_form("/cart/add", &[("product_id", "p-1")]).await;
    app.post_form("/checkout", &[]).await;

    // Straight to the form post; the login page was never rendered.
    app.login_as(customer(), "tok-100").await;
    let home = app.get("/").await;

    assert!(home.body.contains("Please log in to continue with your purchase"));
    assert!(home.body.contains("Welcome back, Ana"));
}

#[tokio::test]
async fn test_register_sends_profile_and_asks_for_verification() {
    let mut app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_partial_json(json!({
            "nombre": "Bruno",
            "apellido": "Paz",
            "email": "bruno@example.com"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": "Usuario creado"
        })))
        .expect(1)
        .mount(&app.backend)
        .await;

    let response = app
        .post_form(
            "/auth/register",
            &[
                ("first_name", "Bruno"),
                ("last_name", "Paz"),
                ("email", "bruno@example.com"),
                ("password", "s3cret-pass"),
                ("confirm_password", "s3cret-pass"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/auth/login"));

    let login = app.get("/auth/login").await;
    assert!(login.body.contains("We sent a verification email to bruno@example.com"));
    assert!(!login.body.contains("Log out"));
}

#[tokio::test]
async fn test_register_with_mismatched_passwords_rerenders_form() {
    let mut app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/auth/register",
            &[
                ("first_name", "Bruno"),
                ("last_name", "Paz"),
                ("email", "bruno@example.com"),
                ("password", "one-pass"),
                ("confirm_password", "other-pass"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Passwords do not match"));
    assert!(response.body.contains("bruno@example.com"));
    assert!(app.backend.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_forgot_password_requests_recovery_email() {
    let mut app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/forgot-password"))
        .and(body_json(json!({ "email": "ana@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&app.backend)
        .await;

    let response = app
        .post_form("/auth/forgot-password", &[("email", "ana@example.com")])
        .await;

    assert_eq!(response.location(), Some("/auth/login"));
    let login = app.get("/auth/login").await;
    assert!(login.body.contains("Recovery email sent. Check your inbox."));
}

#[tokio::test]
async fn test_reset_password_posts_new_password_for_token() {
    let mut app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/reset-password/tok-reset-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&app.backend)
        .await;

    let page = app.get("/auth/reset-password/tok-reset-1").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("/auth/reset-password/tok-reset-1"));

    let response = app
        .post_form(
            "/auth/reset-password/tok-reset-1",
            &[("password", "n3w-pass"), ("confirm_password", "n3w-pass")],
        )
        .await;

    assert_eq!(response.location(), Some("/auth/login"));
    let login = app.get("/auth/login").await;
    assert!(login.body.contains("Your password has been updated."));
}

#[tokio::test]
async fn test_reset_password_rejected_token_rerenders_form() {
    let mut app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/reset-password/stale"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Token expired"
        })))
        .mount(&app.backend)
        .await;

    let response = app
        .post_form(
            "/auth/reset-password/stale",
            &[("password", "n3w-pass"), ("confirm_password", "n3w-pass")],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Token expired"));
}

#[tokio::test]
async fn test_admin_toggle_sends_inverted_role() {
    let mut app = TestApp::spawn().await;
    app.mock_catalog(&[]).await;
    Mock::given(method("PUT"))
        .and(path("/api/users/u-100"))
        .and(body_json(json!({ "isAdmin": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&app.backend)
        .await;

    app.login_as(admin(), "tok-1").await;
    let response = app
        .post_form("/admin/users/u-100/toggle-admin", &[("is_admin", "false")])
        .await;

    assert_eq!(response.location(), Some("/admin/users"));
    let home = app.get("/").await;
    assert!(home.body.contains("User role updated to Administrator"));
}

#[tokio::test]
async fn test_admin_cannot_change_own_role() {
    let mut app = TestApp::spawn().await;
    app.mock_catalog(&[]).await;
    Mock::given(method("PUT"))
        .and(path("/api/users/u-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.backend)
        .await;

    app.login_as(admin(), "tok-1").await;
    let response = app
        .post_form("/admin/users/u-1/toggle-admin", &[("is_admin", "true")])
        .await;

    assert_eq!(response.location(), Some("/admin/users"));
    let home = app.get("/").await;
    assert!(home.body.contains("You cannot change your own role"));
}

#[tokio::test]
async fn test_admin_product_created_notice_is_shown() {
    let mut app = TestApp::spawn().await;
    app.mock_catalog(&[]).await;
    Mock::given(method("POST"))
        .and(path("/api/products"))
        .and(body_partial_json(json!({ "nombre": "Yerba", "stock": 4 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&app.backend)
        .await;

    app.login_as(admin(), "tok-1").await;
    let response = app
        .post_form(
            "/admin/products",
            &[
                ("name", "Yerba"),
                ("description", "1kg"),
                ("price", "4500"),
                ("image", ""),
                ("stock", "4"),
            ],
        )
        .await;

    assert_eq!(response.location(), Some("/admin/products"));
    let home = app.get("/").await;
    assert!(home.body.contains("Welcome back, Root"));
    assert!(home.body.contains("created"));
}
