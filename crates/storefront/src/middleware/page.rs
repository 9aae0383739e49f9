//! Per-request layout data shared by every rendered page.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::middleware::csp::CspNonce;
use crate::middleware::flash::take_flashes;
use crate::models::{CurrentUser, Flash, Theme, session_keys};
use crate::services::cart;

/// Layout data: header badge, theme class, toasts and the CSP nonce.
///
/// Extracting this consumes the queued notifications, so only handlers that
/// render a page should take it.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub cart_count: u32,
    pub theme: Theme,
    pub flashes: Vec<Flash>,
    pub nonce: String,
    pub path: String,
}

impl PageContext {
    /// Context for pages rendered outside a session (error pages).
    #[must_use]
    pub fn bare() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }

    #[must_use]
    pub const fn is_dark(&self) -> bool {
        self.theme.is_dark()
    }

    /// Show a notification on the page being rendered right now.
    pub fn flash(&mut self, flash: Flash) {
        self.flashes.push(flash);
    }

    /// Put the notifications this context took back in the queue, ahead of
    /// anything queued since. Call before redirecting instead of rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn requeue(self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        if self.flashes.is_empty() {
            return Ok(());
        }
        let mut queued = self.flashes;
        let newer: Vec<Flash> = session
            .get(session_keys::FLASH)
            .await?
            .unwrap_or_default();
        queued.extend(newer);
        session.insert(session_keys::FLASH, queued).await
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let nonce = parts
            .extensions
            .get::<CspNonce>()
            .map(|n| n.value().to_string())
            .unwrap_or_default();
        let path = parts.uri.path().to_string();

        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Ok(Self {
                nonce,
                path,
                ..Self::default()
            });
        };

        let user: Option<CurrentUser> = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let theme: Theme = session
            .get(session_keys::THEME)
            .await
            .ok()
            .flatten()
            .unwrap_or_default();
        let cart_count = cart::load(&session).await.item_count();
        let flashes = take_flashes(&session).await;

        Ok(Self {
            user,
            cart_count,
            theme,
            flashes,
            nonce,
            path,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;
    use crate::middleware::flash::push_flash;

    #[tokio::test]
    async fn test_requeue_puts_taken_flashes_first() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut ctx = PageContext::bare();
        ctx.flash(Flash::info("Please log in to continue"));
        push_flash(&session, Flash::success("Welcome back, Ana"))
            .await
            .unwrap();

        ctx.requeue(&session).await.unwrap();

        let messages: Vec<String> = take_flashes(&session)
            .await
            .into_iter()
            .map(|flash| flash.message)
            .collect();
        assert_eq!(messages, ["Please log in to continue", "Welcome back, Ana"]);
    }

    #[tokio::test]
    async fn test_requeue_without_flashes_leaves_queue_alone() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        PageContext::bare().requeue(&session).await.unwrap();
        assert!(take_flashes(&session).await.is_empty());
    }
}
