//! Back-office order list.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::Redirect,
};
use tower_sessions::Session;
use tracing::instrument;
use vitrina_core::OrderId;

use super::{finish_mutation, rows_or_flash};
use crate::api::Order;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::state::AppState;

const LIST: &str = "/admin/orders";

/// All-orders template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct AdminOrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<Order>,
}

/// Display every order in the store.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    mut ctx: PageContext,
) -> Result<AdminOrdersTemplate> {
    let result = state.backend().all_orders(&auth.token).await;
    let orders = rows_or_flash(result, &mut ctx, "orders")?;
    Ok(AdminOrdersTemplate { ctx, orders })
}

/// Delete an order.
#[instrument(skip(state, session, auth))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let outcome = state
        .backend()
        .delete_order(&auth.token, &OrderId::new(id))
        .await;
    finish_mutation(
        &session,
        outcome,
        "Order deleted".to_string(),
        "Could not delete the order",
        LIST,
    )
    .await
}
