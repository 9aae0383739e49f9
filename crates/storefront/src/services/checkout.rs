//! Checkout mapping.
//!
//! Turns cart lines into the payment preference items sent to the gateway
//! and into the order recorded after a successful payment.

use url::Url;
use vitrina_core::{CartBook, CartLine};

use crate::api::{NewOrder, OrderProduct, PreferenceItem};

/// One preference item per cart line.
#[must_use]
pub fn preference_items(lines: &[CartLine]) -> Vec<PreferenceItem> {
    lines
        .iter()
        .map(|line| PreferenceItem {
            title: line.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
        })
        .collect()
}

/// The order to record for the active cart.
#[must_use]
pub fn order_draft(book: &CartBook) -> NewOrder {
    NewOrder {
        products: book
            .current_cart()
            .iter()
            .map(|line| OrderProduct {
                id: line.product_id.clone(),
                name: line.name.clone(),
                price: line.unit_price,
                quantity: line.quantity,
            })
            .collect(),
        total: book.subtotal(),
    }
}

/// Gateway URL the buyer is sent to for a preference.
#[must_use]
pub fn gateway_url(checkout_url: &Url, preference_id: &str) -> Url {
    let mut url = checkout_url.clone();
    url.query_pairs_mut().append_pair("pref_id", preference_id);
    url
}
