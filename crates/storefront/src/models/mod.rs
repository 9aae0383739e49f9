//! Domain models for storefront.
//!
//! Everything here is stored in the visitor's server-side session.

pub mod session;

pub use session::{CurrentUser, Flash, FlashKind, Theme, keys as session_keys};
