//! Backend wire types.
//!
//! The backend speaks Spanish field names (`nombre`, `precio`, ...) and hands
//! out document ids as `_id`, sometimes alongside a virtual `id`. The types
//! here expose English field names and accept either id spelling.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vitrina_core::{Listing, OrderId, OrderStatus, Price, ProductId, UserId};

/// Both id spellings a record may carry. `id` wins when both are present.
#[derive(Debug, Deserialize)]
struct RecordIds<T> {
    #[serde(rename = "_id")]
    object_id: Option<T>,
    id: Option<T>,
}

impl<T> RecordIds<T> {
    fn resolve(self, record: &str) -> Result<T, String> {
        self.id
            .or(self.object_id)
            .ok_or_else(|| format!("{record} without an id"))
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Deserialize)]
struct ProductRecord {
    #[serde(flatten)]
    ids: RecordIds<ProductId>,
    #[serde(rename = "nombre", alias = "name")]
    name: String,
    #[serde(rename = "descripcion", alias = "description", default)]
    description: Option<String>,
    #[serde(rename = "precio", alias = "price")]
    price: Decimal,
    #[serde(rename = "imagen", alias = "image", default)]
    image: Option<String>,
    #[serde(default)]
    stock: Option<i64>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ProductRecord")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub stock: i64,
}

impl TryFrom<ProductRecord> for Product {
    type Error = String;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.ids.resolve("product")?,
            name: record.name,
            description: record.description.unwrap_or_default(),
            price: record.price,
            image: record.image.filter(|url| !url.trim().is_empty()),
            stock: record.stock.unwrap_or_default(),
        })
    }
}

impl Product {
    /// Formatted price, e.g. `$1,234.50`.
    #[must_use]
    pub fn price_display(&self) -> String {
        Price::store(self.price).display()
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

impl Listing for Product {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn price(&self) -> Decimal {
        self.price
    }
}

/// Body of `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductInput {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "precio", with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "imagen")]
    pub image: String,
    pub stock: u32,
}

// =============================================================================
// Users and auth
// =============================================================================

#[derive(Debug, Deserialize)]
struct UserRecord {
    #[serde(flatten)]
    ids: RecordIds<UserId>,
    #[serde(rename = "nombre", alias = "name", default)]
    first_name: Option<String>,
    #[serde(rename = "apellido", alias = "lastName", default)]
    last_name: Option<String>,
    email: String,
    #[serde(rename = "isAdmin", default)]
    is_admin: bool,
    #[serde(rename = "isVerified", alias = "verified", default)]
    is_verified: Option<bool>,
    #[serde(rename = "createdAt", default)]
    created_at: Option<String>,
}

/// A registered user as returned by `/auth/*` and `/users`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "UserRecord")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
    pub is_verified: Option<bool>,
    pub created_at: Option<String>,
}

impl TryFrom<UserRecord> for User {
    type Error = String;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.ids.resolve("user")?,
            first_name: record.first_name.unwrap_or_default(),
            last_name: record.last_name.unwrap_or_default(),
            email: record.email,
            is_admin: record.is_admin,
            is_verified: record.is_verified,
            created_at: record.created_at,
        })
    }
}

impl User {
    /// "First Last", falling back to the email when no name is on file.
    #[must_use]
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_owned()
        }
    }

    #[must_use]
    pub fn joined_display(&self) -> String {
        self.created_at
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_default()
    }
}

/// Payload of a successful `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayload {
    pub user: User,
    pub token: String,
}

/// Payload of a successful `POST /auth/register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterPayload {
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    #[serde(rename = "nombre")]
    pub first_name: &'a str,
    #[serde(rename = "apellido")]
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `PUT /users/{id}`.
#[derive(Debug, Default, Serialize)]
pub struct UserUpdate {
    #[serde(rename = "isAdmin", skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

// =============================================================================
// Orders
// =============================================================================

/// A line inside an order.
///
/// Orders created by this storefront carry `{id, nombre, precio, cantidad}`;
/// gateway-created orders use `{title, unit_price, quantity}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderLine {
    #[serde(alias = "nombre", alias = "name", default)]
    pub title: String,
    #[serde(alias = "cantidad", default = "one")]
    pub quantity: u32,
    #[serde(alias = "precio", alias = "price", default)]
    pub unit_price: Decimal,
}

const fn one() -> u32 {
    1
}

impl OrderLine {
    #[must_use]
    pub fn line_total_display(&self) -> String {
        Price::store(self.unit_price * Decimal::from(self.quantity)).display()
    }

    #[must_use]
    pub fn unit_price_display(&self) -> String {
        Price::store(self.unit_price).display()
    }
}

/// The `user` field of an order: either populated or just a reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OrderCustomer {
    Populated {
        #[serde(rename = "nombre", alias = "name", default)]
        name: Option<String>,
        #[serde(default)]
        email: Option<String>,
    },
    Reference(UserId),
}

impl OrderCustomer {
    /// Best available label for the customer.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Populated { name, email } => name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .or_else(|| email.clone())
                .unwrap_or_else(|| "Unknown customer".to_string()),
            Self::Reference(id) => format!("User {id}"),
        }
    }

    /// Secondary line (email) when the name is shown as the label.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Populated {
                name: Some(_),
                email,
            } => email.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OrderRecord {
    #[serde(flatten)]
    ids: RecordIds<OrderId>,
    #[serde(default)]
    user: Option<OrderCustomer>,
    #[serde(alias = "productos", default)]
    items: Vec<OrderLine>,
    #[serde(default)]
    total: Decimal,
    #[serde(rename = "status", alias = "estado", default)]
    status: OrderStatus,
    #[serde(rename = "createdAt", default)]
    created_at: Option<String>,
}

/// An order as returned by `/orders` and `/orders/admin/all`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "OrderRecord")]
pub struct Order {
    pub id: OrderId,
    pub customer: Option<OrderCustomer>,
    pub items: Vec<OrderLine>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: Option<String>,
}

impl TryFrom<OrderRecord> for Order {
    type Error = String;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.ids.resolve("order")?,
            customer: record.user,
            items: record.items,
            total: record.total,
            status: record.status,
            created_at: record.created_at,
        })
    }
}

impl Order {
    #[must_use]
    pub fn total_display(&self) -> String {
        Price::store(self.total).display()
    }

    /// Last 8 characters of the id, as shown in order tables.
    #[must_use]
    pub fn short_id(&self) -> &str {
        let id = self.id.as_str();
        let start = id
            .char_indices()
            .rev()
            .nth(7)
            .map_or(0, |(index, _)| index);
        id.get(start..).unwrap_or(id)
    }

    #[must_use]
    pub fn date_display(&self) -> String {
        self.created_at
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn customer_label(&self) -> String {
        self.customer
            .as_ref()
            .map_or_else(|| "Unknown customer".to_string(), OrderCustomer::label)
    }

    #[must_use]
    pub fn customer_email(&self) -> Option<&str> {
        self.customer.as_ref().and_then(OrderCustomer::email)
    }
}

/// One product in the body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderProduct {
    pub id: ProductId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "precio", with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    #[serde(rename = "productos")]
    pub products: Vec<OrderProduct>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

// =============================================================================
// Payments
// =============================================================================

/// One item of a payment preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferenceItem {
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Body of `POST /payment/create-preference`.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
}

/// Reply of `POST /payment/create-preference`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferenceResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub id: Option<String>,
}

impl PreferenceResponse {
    /// The preference id, if the gateway accepted the request.
    #[must_use]
    pub fn preference_id(&self) -> Option<&str> {
        if !self.success {
            return None;
        }
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Render an ISO-8601 timestamp as a calendar date; unparsable input is shown as is.
fn format_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map_or_else(|_| raw.to_owned(), |dt| dt.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_reads_spanish_fields() {
        let product: Product = serde_json::from_value(json!({
            "_id": "65f1",
            "nombre": "Mate",
            "descripcion": "Calabaza",
            "precio": 4500.5,
            "imagen": "https://img.example/mate.jpg",
            "stock": 3
        }))
        .unwrap();
        assert_eq!(product.id, ProductId::new("65f1"));
        assert_eq!(product.name, "Mate");
        assert_eq!(product.price, Decimal::new(45_005, 1));
        assert_eq!(product.price_display(), "$4,500.50");
        assert!(product.in_stock());
    }

    #[test]
    fn test_product_prefers_virtual_id_and_defaults() {
        let product: Product = serde_json::from_value(json!({
            "_id": "mongo",
            "id": 9,
            "nombre": "Yerba",
            "precio": "3000",
            "imagen": ""
        }))
        .unwrap();
        assert_eq!(product.id, ProductId::new("9"));
        assert_eq!(product.description, "");
        assert_eq!(product.image, None);
        assert!(!product.in_stock());
    }

    #[test]
    fn test_product_without_id_is_rejected() {
        let result: Result<Product, _> =
            serde_json::from_value(json!({"nombre": "X", "precio": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn test_user_full_name() {
        let user: User = serde_json::from_value(json!({
            "_id": "u1",
            "nombre": "Ana",
            "apellido": "García",
            "email": "ana@tienda.com",
            "isAdmin": true
        }))
        .unwrap();
        assert_eq!(user.full_name(), "Ana García");
        assert!(user.is_admin);

        let anonymous: User =
            serde_json::from_value(json!({"id": 2, "email": "x@y.z"})).unwrap();
        assert_eq!(anonymous.full_name(), "x@y.z");
        assert!(!anonymous.is_admin);
    }

    #[test]
    fn test_order_accepts_both_line_shapes() {
        let order: Order = serde_json::from_value(json!({
            "_id": "order-000123456",
            "user": {"nombre": "Ana", "email": "ana@tienda.com"},
            "productos": [{"id": "p1", "nombre": "Mate", "precio": 100, "cantidad": 2}],
            "total": 200,
            "status": "completed",
            "createdAt": "2026-03-01T12:30:00.000Z"
        }))
        .unwrap();
        assert_eq!(order.items[0].title, "Mate");
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[0].line_total_display(), "$200.00");
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.short_id(), "00123456");
        assert_eq!(order.date_display(), "2026-03-01");
        assert_eq!(order.customer_label(), "Ana");
        assert_eq!(order.customer_email(), Some("ana@tienda.com"));

        let gateway: Order = serde_json::from_value(json!({
            "_id": "o2",
            "user": "u1",
            "items": [{"title": "Termo", "unit_price": 12000, "quantity": 1}],
            "total": 12000,
            "status": "refunded"
        }))
        .unwrap();
        assert_eq!(gateway.items[0].title, "Termo");
        assert_eq!(gateway.status, OrderStatus::Cancelled);
        assert_eq!(gateway.short_id(), "o2");
        assert_eq!(gateway.customer_label(), "User u1");
    }

    #[test]
    fn test_new_order_serializes_numbers() {
        let order = NewOrder {
            products: vec![OrderProduct {
                id: ProductId::new("p1"),
                name: "Mate".into(),
                price: Decimal::new(1050, 1),
                quantity: 2,
            }],
            total: Decimal::new(2100, 1),
        };
        assert_eq!(
            serde_json::to_value(&order).unwrap(),
            json!({
                "productos": [{"id": "p1", "nombre": "Mate", "precio": 105.0, "cantidad": 2}],
                "total": 210.0
            })
        );
    }

    #[test]
    fn test_preference_id_requires_success() {
        let ok: PreferenceResponse =
            serde_json::from_value(json!({"success": true, "id": "pref-1"})).unwrap();
        assert_eq!(ok.preference_id(), Some("pref-1"));

        let missing: PreferenceResponse =
            serde_json::from_value(json!({"success": true})).unwrap();
        assert_eq!(missing.preference_id(), None);

        let failed: PreferenceResponse =
            serde_json::from_value(json!({"success": false, "id": "pref-2"})).unwrap();
        assert_eq!(failed.preference_id(), None);
    }

    #[test]
    fn test_format_timestamp_fallback() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
