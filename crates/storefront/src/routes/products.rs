//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;
use vitrina_core::{ProductFilter, ProductId, ProductSort};

use crate::api::Product;
use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::state::AppState;

/// Catalog query parameters, kept as raw strings so blank form fields are
/// simply ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
}

impl CatalogQuery {
    fn filter(&self) -> ProductFilter {
        ProductFilter::from_raw(
            self.search.as_deref(),
            self.min_price.as_deref(),
            self.max_price.as_deref(),
            self.sort.as_deref(),
        )
    }
}

/// A sort option in the catalog toolbar.
pub struct SortOption {
    pub key: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub ctx: PageContext,
    pub products: Vec<Product>,
    pub total: usize,
    pub filtered: bool,
    pub search: String,
    pub min_price: String,
    pub max_price: String,
    pub sort_options: Vec<SortOption>,
    pub error: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub product: Product,
}

/// Display the product listing, filtered and sorted per the query string.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let filter = query.filter();

    let (products, total, error) = match state.backend().list_products().await {
        Ok(all) => {
            let total = all.len();
            (filter.apply(all.as_ref().clone()), total, None)
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load catalog");
            (Vec::new(), 0, Some(e.user_message()))
        }
    };

    let sort_options = ProductSort::ALL
        .iter()
        .map(|sort| SortOption {
            key: sort.as_str(),
            label: sort.label(),
            selected: *sort == filter.sort,
        })
        .collect();

    ProductsIndexTemplate {
        ctx,
        products,
        total,
        filtered: filter.is_active(),
        search: filter.search.clone().unwrap_or_default(),
        min_price: filter.min_price.map(|p| p.to_string()).unwrap_or_default(),
        max_price: filter.max_price.map(|p| p.to_string()).unwrap_or_default(),
        sort_options,
        error,
    }
}

/// Display the product detail page.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<String>,
) -> Result<ProductShowTemplate> {
    let product = state.backend().get_product(&ProductId::new(id)).await?;
    Ok(ProductShowTemplate { ctx, product })
}
