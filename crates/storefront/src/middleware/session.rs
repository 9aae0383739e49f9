//! Session middleware configuration.
//!
//! Sessions live in process memory; the cookie only carries the signed
//! session id.

use secrecy::ExposeSecret;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::{ConfigError, StorefrontConfig};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "vitrina_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with an in-memory store and a signed cookie.
///
/// # Errors
///
/// Returns `ConfigError::InsecureSecret` if the secret is too short to derive
/// a signing key from.
pub fn create_session_layer(
    config: &StorefrontConfig,
) -> Result<SessionManagerLayer<MemoryStore, SignedCookie>, ConfigError> {
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes()).map_err(|e| {
        ConfigError::InsecureSecret("VITRINA_SESSION_SECRET".to_string(), e.to_string())
    })?;

    Ok(SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
