//! Checkout handoff and gateway returns.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use vitrina_integration_tests::{CHECKOUT_URL, TestApp, customer, product};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_anonymous_checkout_redirects_to_login() {
    let mut app = TestApp::spawn().await;
    app.mock_catalog(&[product("p-1", "Mate Cebador", 15_000)]).await;
    app.post_form("/cart/add", &[("product_id", "p-1")]).await;

    let response = app.post_form("/checkout", &[]).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/auth/login"));

    let login = app.get("/auth/login").await;
    assert!(login.body.contains("Please log in to continue with your purchase"));
}

#[tokio::test]
async fn test_checkout_redirects_to_gateway_with_preference() {
    let mut app = TestApp::spawn().await;
    app.mock_catalog(&[product("p-1", "Mate Cebador", 15_000)]).await;
    Mock::given(method("POST"))
        .and(path("/api/payment/create-preference"))
        .and(header("authorization", "Bearer tok-100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "id": "pref-42"
        })))
        .expect(1)
        .mount(&app.backend)
        .await;

    let login = app.login_as(customer(), "tok-100").await;
    assert_eq!(login.location(), Some("/"));
    app.post_form("/cart/add", &[("product_id", "p-1")]).await;

    let response = app.post_form("/checkout", &[]).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.location(),
        Some(format!("{CHECKOUT_URL}?pref_id=pref-42").as_str())
    );
}

#[tokio::test]
async fn test_checkout_with_empty_cart_stays_on_cart() {
    let mut app = TestApp::spawn().await;
    app.login_as(customer(), "tok-100").await;

    let response = app.post_form("/checkout", &[]).await;

    assert_eq!(response.location(), Some("/cart"));
}

#[tokio::test]
async fn test_gateway_rejection_keeps_cart() {
    let mut app = TestApp::spawn().await;
    app.mock_catalog(&[product("p-1", "Mate Cebador", 15_000)]).await;
    Mock::given(method("POST"))
        .and(path("/api/payment/create-preference"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Gateway unavailable"
        })))
        .mount(&app.backend)
        .await;

    app.login_as(customer(), "tok-100").await;
    app.post_form("/cart/add", &[("product_id", "p-1")]).await;

    let response = app.post_form("/checkout", &[]).await;
    assert_eq!(response.location(), Some("/cart"));

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Gateway unavailable"));
    assert!(cart.body.contains("Mate Cebador"));
}

#[tokio::test]
async fn test_approved_payment_records_order_and_clears_cart() {
    let mut app = TestApp::spawn().await;
    app.mock_catalog(&[product("p-1", "Mate Cebador", 15_000)]).await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(header("authorization", "Bearer tok-100"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&app.backend)
        .await;

    app.login_as(customer(), "tok-100").await;
    app.post_form("/cart/add", &[("product_id", "p-1")]).await;

    let result = app
        .get("/success?payment_id=991&collection_status=approved&merchant_order_id=55")
        .await;

    assert_eq!(result.status, StatusCode::OK);
    assert!(result.body.contains("Payment approved! Your order has been recorded."));
    assert!(result.body.contains("991"));

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_rejected_payment_keeps_cart() {
    let mut app = TestApp::spawn().await;
    app.mock_catalog(&[product("p-1", "Mate Cebador", 15_000)]).await;
    app.login_as(customer(), "tok-100").await;
    app.post_form("/cart/add", &[("product_id", "p-1")]).await;

    let result = app.get("/failure?payment_id=991&collection_status=rejected").await;

    assert_eq!(result.status, StatusCode::OK);
    assert!(result.body.contains("Your cart is still here."));

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Mate Cebador"));
}

#[tokio::test]
async fn test_approved_payment_without_login_keeps_cart_and_asks_to_log_in() {
    let mut app = TestApp::spawn().await;
    app.mock_catalog(&[product("p-1", "Mate Cebador", 15_000)]).await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.backend)
        .await;
    app.post_form("/cart/add", &[("product_id", "p-1")]).await;

    let result = app.get("/success?payment_id=991&collection_status=approved").await;

    assert_eq!(result.status, StatusCode::SEE_OTHER);
    assert_eq!(result.location(), Some("/auth/login"));

    let login = app.get("/auth/login").await;
    assert!(login.body.contains("Please log in again."));
    assert!(!login.body.contains("Payment approved!"));

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Mate Cebador"));
}

#[tokio::test]
async fn test_success_without_payment_id_shows_no_notice() {
    let mut app = TestApp::spawn().await;

    let result = app.get("/success").await;

    assert_eq!(result.status, StatusCode::OK);
    assert!(!result.body.contains("Payment approved!"));
}

#[tokio::test]
async fn test_reloaded_success_page_confirms_payment() {
    let mut app = TestApp::spawn().await;
    app.login_as(customer(), "tok-100").await;

    let result = app.get("/success?payment_id=991").await;

    assert_eq!(result.status, StatusCode::OK);
    assert!(result.body.contains("Payment approved!"));
}

#[tokio::test]
async fn test_unrecorded_order_is_reported_and_cart_kept() {
    let mut app = TestApp::spawn().await;
    app.mock_catalog(&[product("p-1", "Mate Cebador", 15_000)]).await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "Database unavailable"
        })))
        .expect(1)
        .mount(&app.backend)
        .await;

    app.login_as(customer(), "tok-100").await;
    app.post_form("/cart/add", &[("product_id", "p-1")]).await;

    let result = app.get("/success?payment_id=991").await;

    assert_eq!(result.status, StatusCode::OK);
    assert!(
        result
            .body
            .contains("Your payment went through but we could not record the order.")
    );

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Mate Cebador"));
}

#[tokio::test]
async fn test_pending_payment_clears_cart() {
    let mut app = TestApp::spawn().await;
    app.mock_catalog(&[product("p-1", "Mate Cebador", 15_000)]).await;
    app.login_as(customer(), "tok-100").await;
    app.post_form("/cart/add", &[("product_id", "p-1")]).await;

    let result = app.get("/pending?payment_id=991&collection_status=in_process").await;

    assert_eq!(result.status, StatusCode::OK);
    assert!(result.body.contains("Your payment is pending."));

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_preference_without_id_stays_on_cart() {
    let mut app = TestApp::spawn().await;
    app.mock_catalog(&[product("p-1", "Mate Cebador", 15_000)]).await;
    Mock::given(method("POST"))
        .and(path("/api/payment/create-preference"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&app.backend)
        .await;

    app.login_as(customer(), "tok-100").await;
    app.post_form("/cart/add", &[("product_id", "p-1")]).await;

    let response = app.post_form("/checkout", &[]).await;
    assert_eq!(response.location(), Some("/cart"));

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("No preference ID received"));
    assert!(cart.body.contains("Mate Cebador"));
}
