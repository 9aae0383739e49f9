//! Cart book persistence.
//!
//! The whole [`CartBook`] lives in the visitor's session under
//! [`session_keys::CART_BOOK`]. Its active owner always follows the signed-in
//! user, so a stale book is re-keyed on load.

use tower_sessions::Session;
use vitrina_core::{CartBook, UserId};

use crate::models::{CurrentUser, session_keys};

/// Load the cart book, switched to the cart of whoever is signed in.
///
/// Session read failures fall back to an empty book.
pub async fn load(session: &Session) -> CartBook {
    let mut book: CartBook = match session.get(session_keys::CART_BOOK).await {
        Ok(book) => book.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read cart from session");
            CartBook::default()
        }
    };

    let user_id = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
        .map(|user| user.id);
    book.set_owner(user_id);

    book
}

/// Persist the cart book.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save(session: &Session, book: &CartBook) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART_BOOK, book).await
}

/// Make `owner`'s cart the active one.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn switch_owner(
    session: &Session,
    owner: Option<UserId>,
) -> Result<(), tower_sessions::session::Error> {
    let mut book: CartBook = session
        .get(session_keys::CART_BOOK)
        .await?
        .unwrap_or_default();
    if book.set_owner(owner) {
        tracing::debug!(owner = ?book.owner(), "switched active cart");
    }
    save(session, &book).await
}
