//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (hero + featured products)
//!
//! # Catalog
//! GET  /products               - Product listing (search, price range, sort)
//! GET  /products/{id}          - Product detail
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add one unit of a product
//! POST /cart/update            - Set a line's quantity
//! POST /cart/remove            - Remove a line
//! POST /cart/clear             - Empty the active cart
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! POST /checkout               - Create a payment preference, redirect to gateway
//! GET  /success                - Gateway return: approved
//! GET  /failure                - Gateway return: rejected
//! GET  /pending                - Gateway return: pending
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//! GET  /auth/forgot-password   - Password recovery form
//! POST /auth/forgot-password   - Send recovery email
//! GET  /auth/reset-password/{token}  - New password form
//! POST /auth/reset-password/{token}  - Set new password
//! GET  /verify-email           - Email verification result
//!
//! # Account (requires auth)
//! GET  /account                - Profile
//! GET  /orders                 - Order history
//!
//! # Preferences
//! POST /theme                  - Toggle light/dark theme
//!
//! # Admin (requires admin)
//! GET  /admin                  - Dashboard
//! GET  /admin/products         - Product table
//! ...                          - See `admin::routes`
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod home;
pub mod orders;
pub mod payment;
pub mod products;
pub mod theme;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::filters;
use crate::middleware::{PageContext, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
///
/// Form posts are rate limited per client IP when `rate_limit` is set.
pub fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let posts = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password/{token}", post(auth::reset_password));
    let posts = if rate_limit {
        posts.layer(auth_rate_limiter())
    } else {
        posts
    };

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", get(auth::forgot_password_page))
        .route("/reset-password/{token}", get(auth::reset_password_page))
        .merge(posts)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create all routes for the storefront.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(cart::checkout))
        .route("/success", get(payment::success))
        .route("/failure", get(payment::failure))
        .route("/pending", get(payment::pending))
        .route("/orders", get(orders::index))
        .route("/account", get(account::index))
        .route("/verify-email", get(auth::verify_email))
        .route("/theme", post(theme::toggle))
        .nest("/auth", auth_routes(rate_limit))
        .nest("/admin", admin::routes())
        .fallback(not_found)
}

/// 404 page template.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub ctx: PageContext,
}

/// Fallback for unknown paths.
pub async fn not_found(ctx: PageContext) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, NotFoundTemplate { ctx })
}

/// A local path that is safe to redirect back to.
///
/// Anything that is not an absolute path on this site (including
/// protocol-relative `//host` and backslash tricks) falls back to `/`.
#[must_use]
pub fn safe_return_path(candidate: Option<&str>) -> String {
    match candidate.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_return_path_accepts_local_paths() {
        assert_eq!(safe_return_path(Some("/products?sort=price-asc")), "/products?sort=price-asc");
        assert_eq!(safe_return_path(Some("/")), "/");
    }

    #[test]
    fn test_safe_return_path_rejects_offsite() {
        assert_eq!(safe_return_path(None), "/");
        assert_eq!(safe_return_path(Some("")), "/");
        assert_eq!(safe_return_path(Some("https://evil.example")), "/");
        assert_eq!(safe_return_path(Some("//evil.example")), "/");
        assert_eq!(safe_return_path(Some("/\\evil.example")), "/");
    }
}
