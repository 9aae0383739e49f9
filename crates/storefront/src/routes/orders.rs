//! Order history for the signed-in user.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::api::Order;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::state::AppState;

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<Order>,
}

/// Display the signed-in user's orders, newest first as the backend sends them.
#[instrument(skip(state, auth, ctx), fields(user_id = %auth.user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    ctx: PageContext,
) -> Result<OrdersTemplate> {
    let orders = state.backend().my_orders(&auth.token).await?;
    Ok(OrdersTemplate { ctx, orders })
}
