//! Vitrina Core - Shared types library.
//!
//! This crate provides the domain types used by the storefront:
//! - typed record ids for products, users and orders
//! - email and price value types
//! - the per-owner cart book
//! - catalog filtering and sorting
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no session handling. The storefront binary owns all of that and
//! stores the serialisable values from here in its sessions.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, and statuses
//! - [`cart`] - Cart lines keyed by the signed-in identity (or the guest)
//! - [`catalog`] - Search, price range, and sort over product listings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod types;

pub use cart::{CartBook, CartLine, CartOwner, GUEST_CART_KEY};
pub use catalog::{Listing, ProductFilter, ProductSort};
pub use types::*;
