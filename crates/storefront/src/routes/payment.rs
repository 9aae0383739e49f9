//! Payment gateway return pages.
//!
//! The gateway sends the buyer back to `/success`, `/failure` or `/pending`
//! with `payment_id`, `collection_status` and `merchant_order_id` in the
//! query string. An approved payment records the order and empties the cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use vitrina_core::PaymentOutcome;

use crate::api::ApiError;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext};
use crate::models::Flash;
use crate::services::{cart as cart_store, checkout as checkout_map};
use crate::state::AppState;

/// Query parameters appended by the gateway.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentQuery {
    pub payment_id: Option<String>,
    pub collection_status: Option<String>,
    pub merchant_order_id: Option<String>,
}

impl PaymentQuery {
    fn payment_id(&self) -> Option<&str> {
        self.payment_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != "null")
    }
}

/// Payment result page template.
#[derive(Template, WebTemplate)]
#[template(path = "payment/result.html")]
pub struct PaymentResultTemplate {
    pub ctx: PageContext,
    pub outcome: PaymentOutcome,
    pub title: &'static str,
    pub payment_id: Option<String>,
    pub collection_status: Option<String>,
    pub merchant_order_id: Option<String>,
}

impl PaymentResultTemplate {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, PaymentOutcome::Success)
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.outcome, PaymentOutcome::Failure)
    }
}

/// Gateway return after an approved payment.
///
/// Without a signed-in buyer the paid cart cannot be turned into an order, so
/// the visitor is sent to log in and the cart is left untouched.
#[instrument(skip(state, session, auth, ctx))]
pub async fn success(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    mut ctx: PageContext,
    Query(query): Query<PaymentQuery>,
) -> Result<PaymentResultTemplate> {
    let mut book = cart_store::load(&session).await;

    match (auth, query.payment_id()) {
        (_, None) => {}
        (None, Some(payment_id)) if !book.is_empty() => {
            // The order can only be recorded with a token; keep the cart for after login.
            tracing::warn!(%payment_id, "approved payment returned without a signed-in buyer");
            ctx.requeue(&session).await?;
            return Err(AppError::SessionExpired);
        }
        (Some(auth), Some(payment_id)) if !book.is_empty() => {
            add_breadcrumb(
                "checkout",
                "Recording order",
                Some(&[("payment_id", payment_id)]),
            );
            let order = checkout_map::order_draft(&book);
            match state.backend().create_order(&auth.token, &order).await {
                Ok(()) => {
                    tracing::info!(%payment_id, lines = order.products.len(), "order recorded");
                    book.clear();
                    cart_store::save(&session, &book).await?;
                    ctx.cart_count = 0;
                    ctx.flash(Flash::success(
                        "Payment approved! Your order has been recorded.",
                    ));
                }
                Err(ApiError::Unauthorized(_)) => return Err(AppError::SessionExpired),
                Err(e) => {
                    tracing::error!(error = %e, %payment_id, "paid order could not be recorded");
                    ctx.flash(Flash::error(
                        "Your payment went through but we could not record the order. \
                         Please contact us with your payment number.",
                    ));
                }
            }
        }
        // Reload after the order was already recorded.
        (_, Some(_)) => ctx.flash(Flash::success("Payment approved!")),
    }

    Ok(result_page(ctx, PaymentOutcome::Success, query))
}

/// Gateway return after a rejected payment. The cart is kept.
#[instrument(skip(ctx))]
pub async fn failure(
    mut ctx: PageContext,
    Query(query): Query<PaymentQuery>,
) -> PaymentResultTemplate {
    ctx.flash(Flash::error(
        "The payment could not be completed. Your cart is still here.",
    ));
    result_page(ctx, PaymentOutcome::Failure, query)
}

/// Gateway return while the payment is still being processed.
#[instrument(skip(session, ctx))]
pub async fn pending(
    session: Session,
    mut ctx: PageContext,
    Query(query): Query<PaymentQuery>,
) -> Result<PaymentResultTemplate> {
    let mut book = cart_store::load(&session).await;
    if PaymentOutcome::Pending.clears_cart() && !book.is_empty() {
        book.clear();
        cart_store::save(&session, &book).await?;
        ctx.cart_count = 0;
    }
    ctx.flash(Flash::info(
        "Your payment is pending. We will let you know once it is confirmed.",
    ));
    Ok(result_page(ctx, PaymentOutcome::Pending, query))
}

fn result_page(
    ctx: PageContext,
    outcome: PaymentOutcome,
    query: PaymentQuery,
) -> PaymentResultTemplate {
    PaymentResultTemplate {
        ctx,
        outcome,
        title: outcome.title(),
        payment_id: query.payment_id().map(str::to_owned),
        collection_status: query.collection_status,
        merchant_order_id: query.merchant_order_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_id_ignores_blank_and_null() {
        let query = |id: &str| PaymentQuery {
            payment_id: Some(id.to_string()),
            ..PaymentQuery::default()
        };
        assert_eq!(query("123456").payment_id(), Some("123456"));
        assert_eq!(query("  ").payment_id(), None);
        assert_eq!(query("null").payment_id(), None);
        assert_eq!(PaymentQuery::default().payment_id(), None);
    }
}
