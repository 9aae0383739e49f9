//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Loading and saving the per-owner cart book in the session
//! - `checkout` - Mapping cart lines to payment preferences and orders

pub mod cart;
pub mod checkout;
