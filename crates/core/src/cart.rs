//! Per-owner shopping carts.
//!
//! A [`CartBook`] holds one cart per owner: every signed-in user gets a cart
//! keyed by their id and anonymous visitors share the [`GUEST_CART_KEY`] cart.
//! Switching owner never touches the other carts, so a guest cart is still
//! there after a user logs out and a user's cart comes back when they log in
//! again.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, UserId};

/// Key of the cart used when nobody is signed in.
pub const GUEST_CART_KEY: &str = "guest";

/// Who the active cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    Guest,
    User(UserId),
}

impl CartOwner {
    /// Key under which this owner's cart is stored.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Guest => GUEST_CART_KEY,
            Self::User(id) => id.as_str(),
        }
    }
}

impl From<Option<UserId>> for CartOwner {
    fn from(user: Option<UserId>) -> Self {
        user.map_or(Self::Guest, Self::User)
    }
}

/// A product in a cart together with its quantity.
///
/// Name, price and image are snapshotted when the product is added so the
/// cart renders without another catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub image: Option<String>,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// A line for one unit of a product.
    #[must_use]
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        unit_price: Decimal,
        image: Option<String>,
    ) -> Self {
        Self {
            product_id,
            name: name.into(),
            unit_price,
            image,
            quantity: 1,
        }
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// All carts known to one browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartBook {
    carts: BTreeMap<String, Vec<CartLine>>,
    current_user: Option<UserId>,
}

impl CartBook {
    /// Create an empty book owned by the guest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The owner of the active cart.
    #[must_use]
    pub fn owner(&self) -> CartOwner {
        CartOwner::from(self.current_user.clone())
    }

    /// Switch the active cart to `user` (or the guest cart for `None`).
    ///
    /// Returns `true` when the owner actually changed.
    pub fn set_owner(&mut self, user: Option<UserId>) -> bool {
        if self.current_user == user {
            return false;
        }
        self.current_user = user;
        true
    }

    /// Lines of the active cart, in insertion order.
    #[must_use]
    pub fn current_cart(&self) -> &[CartLine] {
        self.carts
            .get(self.owner().key())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn current_cart_mut(&mut self) -> &mut Vec<CartLine> {
        let key = self.owner().key().to_owned();
        self.carts.entry(key).or_default()
    }

    /// Add one unit of a product to the active cart.
    ///
    /// If the product is already in the cart its quantity goes up by one and
    /// the stored snapshot is kept; otherwise `line` is appended with a
    /// quantity of 1.
    pub fn add_item(&mut self, line: CartLine) {
        let cart = self.current_cart_mut();
        if let Some(existing) = cart.iter_mut().find(|l| l.product_id == line.product_id) {
            existing.quantity = existing.quantity.saturating_add(1);
        } else {
            cart.push(CartLine { quantity: 1, ..line });
        }
    }

    /// Remove a product from the active cart.
    ///
    /// Returns `true` if a line was removed.
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let cart = self.current_cart_mut();
        let before = cart.len();
        cart.retain(|l| &l.product_id != product_id);
        cart.len() != before
    }

    /// Set the quantity of a product in the active cart, clamped to at least 1.
    ///
    /// Unknown products are ignored. Returns `true` if a line was updated.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        let cart = self.current_cart_mut();
        match cart.iter_mut().find(|l| &l.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity.max(1);
                true
            }
            None => false,
        }
    }

    /// Empty the active cart. Other owners' carts are untouched.
    pub fn clear(&mut self) {
        let key = self.owner().key().to_owned();
        self.carts.remove(&key);
    }

    /// Sum of line totals in the active cart.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.current_cart().iter().map(CartLine::line_total).sum()
    }

    /// Total number of units in the active cart.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.current_cart()
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }

    /// Whether the active cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current_cart().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: &str, price: i64) -> CartLine {
        CartLine::new(ProductId::new(id), format!("Product {id}"), Decimal::new(price, 0), None)
    }

    #[test]
    fn test_add_item_appends_then_increments() {
        let mut book = CartBook::new();
        book.add_item(line("a", 10));
        book.add_item(line("b", 5));
        book.add_item(line("a", 10));

        let cart = book.current_cart();
        assert_eq!(cart.len(), 2);
        assert_eq!(cart[0].product_id, ProductId::new("a"));
        assert_eq!(cart[0].quantity, 2);
        assert_eq!(cart[1].quantity, 1);
    }

    #[test]
    fn test_add_item_ignores_incoming_quantity() {
        let mut book = CartBook::new();
        book.add_item(CartLine {
            quantity: 9,
            ..line("a", 10)
        });
        assert_eq!(book.item_count(), 1);
    }

    #[test]
    fn test_update_quantity_clamps_to_one() {
        let mut book = CartBook::new();
        book.add_item(line("a", 10));
        assert!(book.update_quantity(&ProductId::new("a"), 0));
        assert_eq!(book.current_cart()[0].quantity, 1);
        assert!(book.update_quantity(&ProductId::new("a"), 4));
        assert_eq!(book.current_cart()[0].quantity, 4);
    }

    #[test]
    fn test_update_quantity_unknown_is_noop() {
        let mut book = CartBook::new();
        book.add_item(line("a", 10));
        assert!(!book.update_quantity(&ProductId::new("zzz"), 3));
        assert_eq!(book.item_count(), 1);
    }

    #[test]
    fn test_remove_item() {
        let mut book = CartBook::new();
        book.add_item(line("a", 10));
        book.add_item(line("b", 10));
        assert!(book.remove_item(&ProductId::new("a")));
        assert!(!book.remove_item(&ProductId::new("a")));
        assert_eq!(book.current_cart().len(), 1);
    }

    #[test]
    fn test_subtotal_and_count() {
        let mut book = CartBook::new();
        book.add_item(line("a", 1500));
        book.add_item(line("a", 1500));
        book.add_item(CartLine::new(
            ProductId::new("b"),
            "B",
            Decimal::new(250, 2),
            None,
        ));
        assert_eq!(book.subtotal(), Decimal::new(300_250, 2));
        assert_eq!(book.item_count(), 3);
    }

    #[test]
    fn test_carts_are_kept_per_owner() {
        let mut book = CartBook::new();
        book.add_item(line("guest-item", 1));

        assert!(book.set_owner(Some(UserId::new("u1"))));
        assert!(book.is_empty());
        book.add_item(line("user-item", 2));

        book.set_owner(None);
        assert_eq!(book.current_cart()[0].product_id, ProductId::new("guest-item"));

        book.set_owner(Some(UserId::new("u1")));
        assert_eq!(book.current_cart()[0].product_id, ProductId::new("user-item"));
        assert!(!book.set_owner(Some(UserId::new("u1"))));
    }

    #[test]
    fn test_clear_only_touches_active_cart() {
        let mut book = CartBook::new();
        book.add_item(line("g", 1));
        book.set_owner(Some(UserId::new("u1")));
        book.add_item(line("u", 1));
        book.clear();
        assert!(book.is_empty());

        book.set_owner(None);
        assert_eq!(book.item_count(), 1);
    }

    #[test]
    fn test_owner_key() {
        assert_eq!(CartOwner::Guest.key(), GUEST_CART_KEY);
        assert_eq!(CartOwner::User(UserId::new("42")).key(), "42");
    }

    #[test]
    fn test_book_survives_serialization() {
        let mut book = CartBook::new();
        book.add_item(line("a", 7));
        book.set_owner(Some(UserId::new("u1")));

        let json = serde_json::to_string(&book).unwrap();
        let restored: CartBook = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, book);
        assert_eq!(restored.owner(), CartOwner::User(UserId::new("u1")));
    }
}
