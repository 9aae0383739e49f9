//! CSP nonce middleware for inline script protection.
//!
//! Generates a unique, cryptographically random nonce per request. Templates
//! put it on `<script nonce="...">` and the security headers middleware puts
//! it in the `Content-Security-Policy` header.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// A CSP nonce value for inline scripts (128-bit, base64-encoded).
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    /// Generate a new random nonce.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Middleware that generates a CSP nonce and stores it in request extensions.
///
/// Must run before `security_headers_middleware` so the nonce is available
/// when the policy is built.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(CspNonce::generate());
    next.run(request).await
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!("CSP nonce missing from request extensions");
            Self(String::new())
        }))
    }
}

/// Build the policy for one response.
///
/// Product images are arbitrary backend URLs, so `img-src` allows any https
/// origin. Forms may only post back to us or to the payment gateway.
#[must_use]
pub fn content_security_policy(nonce: Option<&str>, checkout_origin: &str) -> String {
    let script_src = match nonce {
        Some(nonce) if !nonce.is_empty() => format!("'self' 'nonce-{nonce}'"),
        _ => "'self'".to_string(),
    };

    format!(
        "default-src 'none'; \
         script-src {script_src}; \
         style-src 'self'; \
         img-src 'self' https: data:; \
         font-src 'self'; \
         connect-src 'self'; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self' {checkout_origin}; \
         frame-ancestors 'none'"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonces_are_unique() {
        let a = CspNonce::generate();
        let b = CspNonce::generate();
        assert_ne!(a.value(), b.value());
        assert_eq!(a.value().len(), 24);
    }

    #[test]
    fn test_policy_includes_nonce_and_gateway() {
        let policy =
            content_security_policy(Some("abc123"), "https://www.mercadopago.com.ar");
        assert!(policy.contains("script-src 'self' 'nonce-abc123'"));
        assert!(policy.contains("form-action 'self' https://www.mercadopago.com.ar"));
    }

    #[test]
    fn test_policy_without_nonce() {
        let policy = content_security_policy(None, "https://pay.example");
        assert!(policy.contains("script-src 'self';"));
    }
}
