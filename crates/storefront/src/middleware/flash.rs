//! One-shot notifications and session expiry handling.

use axum::{extract::Request, middleware::Next, response::Response};
use tower_sessions::Session;

use crate::error::{SessionExpiredMarker, clear_sentry_user};
use crate::middleware::auth::clear_current_user;
use crate::models::{Flash, session_keys};

/// Queue a notification for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn push_flash(
    session: &Session,
    flash: Flash,
) -> Result<(), tower_sessions::session::Error> {
    let mut queued: Vec<Flash> = session
        .get(session_keys::FLASH)
        .await?
        .unwrap_or_default();
    queued.push(flash);
    session.insert(session_keys::FLASH, queued).await
}

/// Remove and return every queued notification.
pub async fn take_flashes(session: &Session) -> Vec<Flash> {
    match session.remove::<Vec<Flash>>(session_keys::FLASH).await {
        Ok(flashes) => flashes.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read flash messages");
            Vec::new()
        }
    }
}

/// Drop the auth record when a handler reports that the backend rejected
/// the stored token.
///
/// Must sit inside the session layer.
pub async fn session_expiry_middleware(session: Session, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if response.extensions().get::<SessionExpiredMarker>().is_some() {
        if let Err(e) = clear_current_user(&session).await {
            tracing::error!(error = %e, "failed to clear expired session");
        }
        clear_sentry_user();
        if let Err(e) = push_flash(
            &session,
            Flash::error("Your session has expired. Please log in again."),
        )
        .await
        {
            tracing::error!(error = %e, "failed to queue session expiry notice");
        }
    }

    response
}
