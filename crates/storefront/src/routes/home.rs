//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::api::Product;
use crate::filters;
use crate::middleware::PageContext;
use crate::state::AppState;

/// How many products the home page features.
const FEATURED_COUNT: usize = 4;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub featured: Vec<Product>,
    pub error: Option<String>,
}

/// Display the home page: hero plus the first products of the catalog.
///
/// A backend failure still renders the hero, with a notice in place of the
/// product grid.
#[instrument(skip(state, ctx))]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> impl IntoResponse {
    let (featured, error) = match state.backend().list_products().await {
        Ok(products) => (
            products.iter().take(FEATURED_COUNT).cloned().collect(),
            None,
        ),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load featured products");
            (Vec::new(), Some(e.user_message()))
        }
    };

    HomeTemplate {
        ctx,
        featured,
        error,
    }
}
