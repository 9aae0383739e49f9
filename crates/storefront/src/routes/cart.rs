//! Cart route handlers.
//!
//! The cart lives in the session (see [`crate::services::cart`]); nothing
//! here talks to the backend except to snapshot a product when it is added
//! and to create the payment preference at checkout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use vitrina_core::{CartBook, CartLine, Price, ProductId};

use crate::api::ApiError;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext, push_flash};
use crate::models::Flash;
use crate::services::{cart as cart_store, checkout as checkout_map};
use crate::state::AppState;

/// Cart line display data for templates.
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.to_string(),
            name: line.name.clone(),
            image: line.image.clone(),
            quantity: line.quantity,
            unit_price: Price::store(line.unit_price).display(),
            line_total: Price::store(line.line_total()).display(),
        }
    }
}

/// Cart display data for templates.
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl From<&CartBook> for CartView {
    fn from(book: &CartBook) -> Self {
        Self {
            lines: book.current_cart().iter().map(CartLineView::from).collect(),
            subtotal: Price::store(book.subtotal()).display(),
            item_count: book.item_count(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
}

/// Update quantity form data.
///
/// The quantity is read as text so an empty or negative value clamps to one
/// instead of failing the request.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Display the cart page.
#[instrument(skip(session, ctx))]
pub async fn show(session: Session, ctx: PageContext) -> impl IntoResponse {
    let book = cart_store::load(&session).await;
    CartShowTemplate {
        ctx,
        cart: CartView::from(&book),
    }
}

/// Add one unit of a product to the active cart.
///
/// The product is looked up so the line carries the current name, price and
/// image.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.product_id.trim());
    let product = match state.backend().get_product(&product_id).await {
        Ok(product) => product,
        Err(e) => {
            tracing::warn!(error = %e, %product_id, "could not add product to cart");
            let message = if e.is_not_found() {
                "That product is no longer available.".to_string()
            } else {
                e.user_message()
            };
            push_flash(&session, Flash::error(message)).await?;
            return Ok(Redirect::to("/products").into_response());
        }
    };

    let mut book = cart_store::load(&session).await;
    book.add_item(CartLine::new(
        product.id.clone(),
        product.name.clone(),
        product.price,
        product.image.clone(),
    ));
    cart_store::save(&session, &book).await?;

    add_breadcrumb(
        "cart",
        "Added product",
        Some(&[("product_id", product.id.as_str())]),
    );
    push_flash(
        &session,
        Flash::success(format!("{} added to cart", product.name)),
    )
    .await?;

    Ok(Redirect::to("/cart").into_response())
}

/// Set the quantity of a line (clamped to at least one).
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Redirect> {
    let quantity = parse_quantity(&form.quantity);
    let mut book = cart_store::load(&session).await;
    if book.update_quantity(&ProductId::new(form.product_id), quantity) {
        cart_store::save(&session, &book).await?;
    }
    Ok(Redirect::to("/cart"))
}

/// Remove a line from the active cart.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Result<Redirect> {
    let mut book = cart_store::load(&session).await;
    if book.remove_item(&ProductId::new(form.product_id)) {
        cart_store::save(&session, &book).await?;
        push_flash(&session, Flash::info("Product removed from cart")).await?;
    }
    Ok(Redirect::to("/cart"))
}

/// Empty the active cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Redirect> {
    let mut book = cart_store::load(&session).await;
    book.clear();
    cart_store::save(&session, &book).await?;
    push_flash(&session, Flash::info("Cart emptied")).await?;
    Ok(Redirect::to("/cart"))
}

/// Cart count badge fragment.
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    CartCountTemplate {
        count: cart_store::load(&session).await.item_count(),
    }
}

/// Hand the active cart over to the payment gateway.
///
/// Anonymous visitors are sent to log in first. On success the buyer is
/// redirected to the gateway with the new preference id.
#[instrument(skip(state, session, auth))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> Result<Response> {
    let Some(auth) = auth else {
        push_flash(
            &session,
            Flash::info("Please log in to continue with your purchase"),
        )
        .await?;
        return Ok(Redirect::to("/auth/login").into_response());
    };

    let book = cart_store::load(&session).await;
    if book.is_empty() {
        push_flash(&session, Flash::info("Your cart is empty")).await?;
        return Ok(Redirect::to("/cart").into_response());
    }

    add_breadcrumb("checkout", "Creating payment preference", None);
    let items = checkout_map::preference_items(book.current_cart());

    match state.backend().create_preference(&auth.token, items).await {
        Ok(preference) => {
            if let Some(id) = preference.preference_id() {
                tracing::info!(preference_id = %id, "redirecting to payment gateway");
                let url = checkout_map::gateway_url(&state.config().checkout_url, id);
                return Ok(Redirect::to(url.as_str()).into_response());
            }
            tracing::warn!("payment preference created without an id");
            push_flash(&session, Flash::error("No preference ID received")).await?;
        }
        Err(ApiError::Unauthorized(_)) => return Err(AppError::SessionExpired),
        Err(e) => {
            tracing::error!(error = %e, "failed to create payment preference");
            push_flash(&session, Flash::error(e.user_message())).await?;
        }
    }

    Ok(Redirect::to("/cart").into_response())
}

/// Quantity from a form field; anything unparsable counts as one.
fn parse_quantity(raw: &str) -> u32 {
    raw.trim()
        .parse::<i64>()
        .map_or(1, |q| u32::try_from(q.max(1)).unwrap_or(u32::MAX))
}
