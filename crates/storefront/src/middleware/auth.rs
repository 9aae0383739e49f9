//! Authentication middleware and extractors.
//!
//! The auth record is two session entries: the [`CurrentUser`] profile and
//! the backend bearer token. Both are written together at login and removed
//! together at logout or when the backend rejects the token.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};
use crate::services::cart;

/// A signed-in user together with the token for backend calls.
pub struct AuthSession {
    pub user: CurrentUser,
    pub token: SecretString,
}

/// Extractor that requires a signed-in user.
///
/// Anonymous visitors are redirected to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireAuth(auth): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.display_name())
/// }
/// ```
pub struct RequireAuth(pub AuthSession);

/// Extractor that requires a signed-in administrator.
///
/// Anyone else, signed in or not, is sent back to the home page.
pub struct RequireAdmin(pub AuthSession);

/// Error returned when a guard rejects the request.
pub enum AuthRejection {
    /// Not signed in.
    RedirectToLogin,
    /// Signed in without the admin role, or not signed in on an admin page.
    RedirectHome,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::RedirectHome => Redirect::to("/").into_response(),
        }
    }
}

/// Read the auth record from the session, if both halves are present.
async fn load_auth(parts: &Parts) -> Option<AuthSession> {
    let session = parts.extensions.get::<Session>()?;

    let user: CurrentUser = session
        .get(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()?;
    let token: String = session
        .get(session_keys::AUTH_TOKEN)
        .await
        .ok()
        .flatten()?;

    Some(AuthSession {
        user,
        token: SecretString::from(token),
    })
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        load_auth(parts)
            .await
            .map(Self)
            .ok_or(AuthRejection::RedirectToLogin)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match load_auth(parts).await {
            Some(auth) if auth.user.is_admin => Ok(Self(auth)),
            Some(auth) => {
                tracing::warn!(user_id = %auth.user.id, path = %parts.uri.path(), "non-admin tried an admin page");
                Err(AuthRejection::RedirectHome)
            }
            None => Err(AuthRejection::RedirectHome),
        }
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed in.
pub struct OptionalAuth(pub Option<AuthSession>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(load_auth(parts).await))
    }
}

/// Store the auth record after a successful login.
///
/// Cycles the session id and switches the active cart to the user's.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
    token: &SecretString,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    session
        .insert(session_keys::AUTH_TOKEN, token.expose_secret())
        .await?;
    cart::switch_owner(session, Some(user.id.clone())).await?;
    Ok(())
}

/// Refresh the stored profile without touching the token.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn update_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the auth record (logout or expired token).
///
/// The active cart switches back to the guest cart; the user's cart is kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.remove::<String>(session_keys::AUTH_TOKEN).await?;
    cart::switch_owner(session, None).await?;
    Ok(())
}
