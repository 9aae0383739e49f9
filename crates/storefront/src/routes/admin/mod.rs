//! Back-office route handlers.
//!
//! Every handler takes [`RequireAdmin`], so non-admins are redirected to the
//! home page before any backend call is made.
//!
//! ```text
//! GET  /admin                          - Dashboard
//! GET  /admin/products                 - Product table
//! GET  /admin/products/new             - Create form
//! POST /admin/products                 - Create
//! GET  /admin/products/{id}/edit       - Edit form
//! POST /admin/products/{id}            - Update
//! POST /admin/products/{id}/delete     - Delete
//! GET  /admin/users                    - User table
//! POST /admin/users/{id}/toggle-admin  - Grant or revoke the admin role
//! POST /admin/users/{id}/delete        - Delete
//! GET  /admin/orders                   - All orders
//! POST /admin/orders/{id}/delete       - Delete
//! ```

pub mod orders;
pub mod products;
pub mod users;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use tower_sessions::Session;

use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin, push_flash};
use crate::models::Flash;
use crate::state::AppState;

/// A dashboard card linking to one section.
pub struct DashboardCard {
    pub title: &'static str,
    pub description: &'static str,
    pub href: &'static str,
}

static DASHBOARD_CARDS: [DashboardCard; 3] = [
    DashboardCard {
        title: "Products",
        description: "Create, edit and delete catalog products.",
        href: "/admin/products",
    },
    DashboardCard {
        title: "Users",
        description: "Review accounts and manage administrator access.",
        href: "/admin/users",
    },
    DashboardCard {
        title: "Orders",
        description: "See every order placed in the store.",
        href: "/admin/orders",
    },
];

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub cards: &'static [DashboardCard],
}

/// Display the dashboard.
pub async fn dashboard(RequireAdmin(_auth): RequireAdmin, ctx: PageContext) -> impl IntoResponse {
    DashboardTemplate {
        ctx,
        cards: &DASHBOARD_CARDS,
    }
}

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/products", get(products::index).post(products::create))
        .route("/products/new", get(products::new))
        .route("/products/{id}", post(products::update))
        .route("/products/{id}/edit", get(products::edit))
        .route("/products/{id}/delete", post(products::delete))
        .route("/users", get(users::index))
        .route("/users/{id}/toggle-admin", post(users::toggle_admin))
        .route("/users/{id}/delete", post(users::delete))
        .route("/orders", get(orders::index))
        .route("/orders/{id}/delete", post(orders::delete))
}

/// Rows for a back-office table.
///
/// A failed load shows an empty table with an error toast instead of an error
/// page; an expired token still ends the session.
fn rows_or_flash<T>(
    result: std::result::Result<Vec<T>, ApiError>,
    ctx: &mut PageContext,
    what: &str,
) -> Result<Vec<T>> {
    match result {
        Ok(rows) => Ok(rows),
        Err(ApiError::Unauthorized(_)) => Err(AppError::SessionExpired),
        Err(e) => {
            tracing::error!(error = %e, "failed to load {what}");
            ctx.flash(Flash::error(format!("Error loading {what}: {}", e.user_message())));
            Ok(Vec::new())
        }
    }
}

/// Report a mutation as a toast and go back to `list`.
async fn finish_mutation(
    session: &Session,
    outcome: std::result::Result<(), ApiError>,
    success: String,
    failure: &str,
    list: &str,
) -> Result<Redirect> {
    match outcome {
        Ok(()) => push_flash(session, Flash::success(success)).await?,
        Err(ApiError::Unauthorized(_)) => return Err(AppError::SessionExpired),
        Err(e) => {
            tracing::error!(error = %e, "{failure}");
            push_flash(session, Flash::error(format!("{failure}: {}", e.user_message())))
                .await?;
        }
    }
    Ok(Redirect::to(list))
}
