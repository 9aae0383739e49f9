//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CSP nonce (generate per-request nonce for inline scripts)
//! 5. Security headers (CSP built from the nonce, frame/sniff/referrer policies)
//! 6. Session layer (tower-sessions, signed cookie, in-memory store)
//! 7. Session expiry (drop the auth record when the backend rejects its token)
//! 8. Rate limiting on auth form posts (governor)

pub mod auth;
pub mod csp;
pub mod flash;
pub mod page;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AuthSession, OptionalAuth, RequireAdmin, RequireAuth, clear_current_user, set_current_user,
};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use flash::{push_flash, session_expiry_middleware, take_flashes};
pub use page::PageContext;
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
