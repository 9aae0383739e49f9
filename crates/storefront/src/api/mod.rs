//! REST client for the Vitrina backend.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`; the backend is the source of truth
//! - Bearer tokens are passed per call, the client itself holds no user state
//! - In-memory caching via `moka` for the product catalog, invalidated by
//!   admin product mutations
//!
//! # Response handling
//!
//! Every body is parsed as JSON. Non-2xx replies become [`ApiError`] with the
//! most specific message the backend offered. Successful replies wrapped in a
//! `{"data": ...}` envelope are unwrapped before deserialization.
//!
//! # Example
//!
//! ```rust,ignore
//! let client = BackendClient::new(&config.api)?;
//! let products = client.list_products().await?;
//! let login = client.login("ana@tienda.com", "hunter22").await?;
//! let orders = client.my_orders(&SecretString::from(login.token)).await?;
//! ```

mod cache;
pub mod types;

use std::sync::Arc;
use std::time::Instant;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use vitrina_core::{OrderId, ProductId, UserId};

use crate::config::ApiConfig;

use cache::{CacheKey, CacheValue};
pub use types::*;

/// Message used when a reply body is not valid JSON.
pub const PARSE_ERROR_MESSAGE: &str = "Error processing the server response";

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, timeout or other transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The body was not valid JSON or did not have the expected shape.
    #[error("Error processing the server response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend rejected the bearer token (or the credentials).
    #[error("{0}")]
    Unauthorized(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-2xx reply.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// A 2xx reply carrying `"success": false`.
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    /// Text safe to show to the visitor.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(e) if e.is_timeout() => {
                "The server took too long to respond. Please try again.".to_string()
            }
            Self::Http(_) => "Could not reach the server. Please try again.".to_string(),
            Self::Parse(_) => PARSE_ERROR_MESSAGE.to_string(),
            Self::RateLimited(_) => "Too many requests. Please wait a moment.".to_string(),
            Self::Unauthorized(message) | Self::Rejected(message) => message.clone(),
            Self::Status { message, .. } => message.clone(),
        }
    }

    /// HTTP status reported by the backend, if it replied at all.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            Self::RateLimited(_) => Some(StatusCode::TOO_MANY_REQUESTS),
            Self::Status { status, .. } => Some(*status),
            Self::Http(_) | Self::Parse(_) | Self::Rejected(_) => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the backend REST API.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("vitrina-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    fn request(&self, method: Method, path: &str, token: Option<&SecretString>) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and deserialize the (envelope-unwrapped) body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let value = self.execute_raw(request).await?;
        Ok(serde_json::from_value(unwrap_envelope(value))?)
    }

    /// Send a request and return the raw JSON body after status checks.
    async fn execute_raw(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let request = request.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_owned();
        let started = Instant::now();

        let response = self.inner.client.execute(request).await?;
        let status = response.status();

        debug!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "backend call"
        );

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let text = response.text().await?;
        let parsed = serde_json::from_str::<Value>(&text);

        if !status.is_success() {
            let message = error_message(parsed.as_ref().ok(), status);
            if status == StatusCode::UNAUTHORIZED {
                return Err(ApiError::Unauthorized(message));
            }
            tracing::warn!(
                status = %status,
                path = %path,
                message = %message,
                "backend returned non-success status"
            );
            return Err(ApiError::Status { status, message });
        }

        // 204 and other empty replies to mutations carry no body.
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        let value = parsed.map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                body = %text.chars().take(500).collect::<String>(),
                "failed to parse backend response"
            );
            ApiError::Parse(e)
        })?;

        if value.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(ApiError::Rejected(error_message(Some(&value), status)));
        }

        Ok(value)
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a user profile and bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for wrong credentials, or any transport error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginPayload, ApiError> {
        let body = LoginRequest { email, password };
        self.execute(self.request(Method::POST, "/auth/login", None).json(&body))
            .await
    }

    /// Register a new account. The backend sends a verification email.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(
        &self,
        request: &RegisterRequest<'_>,
    ) -> Result<RegisterPayload, ApiError> {
        // Some backends reply with the created user, others with only a message.
        let value = self
            .execute_raw(self.request(Method::POST, "/auth/register", None).json(request))
            .await?;
        match serde_json::from_value(unwrap_envelope(value)) {
            Ok(payload) => Ok(payload),
            Err(e) => {
                debug!(error = %e, "register reply has no recognisable payload");
                Ok(RegisterPayload::default())
            }
        }
    }

    /// Fetch the profile behind a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is no longer valid.
    #[instrument(skip_all)]
    pub async fn me(&self, token: &SecretString) -> Result<User, ApiError> {
        let value = self
            .execute_raw(self.request(Method::GET, "/auth/me", Some(token)))
            .await?;
        let value = unwrap_envelope(value);
        // `{ user: {...} }` and a bare profile are both in use.
        let profile = match value {
            Value::Object(mut map) if map.contains_key("user") => {
                map.remove("user").unwrap_or(Value::Null)
            }
            other => other,
        };
        Ok(serde_json::from_value(profile)?)
    }

    /// Ask the backend to email a password reset link.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the request.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct Body<'a> {
            email: &'a str,
        }
        self.execute_raw(
            self.request(Method::POST, "/auth/forgot-password", None)
                .json(&Body { email }),
        )
        .await?;
        Ok(())
    }

    /// Set a new password using the token from the reset email.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or expired.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct Body<'a> {
            password: &'a str,
        }
        let path = format!("/auth/reset-password/{}", urlencoding::encode(token));
        self.execute_raw(self.request(Method::POST, &path, None).json(&Body { password }))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// All products, in backend order. Cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Arc<Vec<Product>> = Arc::new(
            self.execute(self.request(Method::GET, "/products", None))
                .await?,
        );

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// A single product. Cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let path = format!("/products/{}", urlencoding::encode(id.as_str()));
        let product: Product = self.execute(self.request(Method::GET, &path, None)).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the product or the token.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        token: &SecretString,
        input: &ProductInput,
    ) -> Result<(), ApiError> {
        self.execute_raw(self.request(Method::POST, "/products", Some(token)).json(input))
            .await?;
        self.invalidate_catalog();
        Ok(())
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update or the token.
    #[instrument(skip(self, token, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &SecretString,
        id: &ProductId,
        input: &ProductInput,
    ) -> Result<(), ApiError> {
        let path = format!("/products/{}", urlencoding::encode(id.as_str()));
        self.execute_raw(self.request(Method::PUT, &path, Some(token)).json(input))
            .await?;
        self.invalidate_catalog();
        Ok(())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion or the token.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, token: &SecretString, id: &ProductId) -> Result<(), ApiError> {
        let path = format!("/products/{}", urlencoding::encode(id.as_str()));
        self.execute_raw(self.request(Method::DELETE, &path, Some(token)))
            .await?;
        self.invalidate_catalog();
        Ok(())
    }

    fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Record an order for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order or the token.
    #[instrument(skip(self, token, order), fields(lines = order.products.len()))]
    pub async fn create_order(&self, token: &SecretString, order: &NewOrder) -> Result<(), ApiError> {
        self.execute_raw(self.request(Method::POST, "/orders", Some(token)).json(order))
            .await?;
        Ok(())
    }

    /// Orders of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip_all)]
    pub async fn my_orders(&self, token: &SecretString) -> Result<Vec<Order>, ApiError> {
        self.execute(self.request(Method::GET, "/orders", Some(token)))
            .await
    }

    /// Every order in the store (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip_all)]
    pub async fn all_orders(&self, token: &SecretString) -> Result<Vec<Order>, ApiError> {
        self.execute(self.request(Method::GET, "/orders/admin/all", Some(token)))
            .await
    }

    /// Delete an order (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion or the token.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn delete_order(&self, token: &SecretString, id: &OrderId) -> Result<(), ApiError> {
        let path = format!("/orders/{}", urlencoding::encode(id.as_str()));
        self.execute_raw(self.request(Method::DELETE, &path, Some(token)))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Every registered user (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip_all)]
    pub async fn list_users(&self, token: &SecretString) -> Result<Vec<User>, ApiError> {
        self.execute(self.request(Method::GET, "/users", Some(token)))
            .await
    }

    /// Update a user's fields (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update or the token.
    #[instrument(skip(self, token, update), fields(user_id = %id))]
    pub async fn update_user(
        &self,
        token: &SecretString,
        id: &UserId,
        update: &UserUpdate,
    ) -> Result<(), ApiError> {
        let path = format!("/users/{}", urlencoding::encode(id.as_str()));
        self.execute_raw(self.request(Method::PUT, &path, Some(token)).json(update))
            .await?;
        Ok(())
    }

    /// Delete a user (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion or the token.
    #[instrument(skip(self, token), fields(user_id = %id))]
    pub async fn delete_user(&self, token: &SecretString, id: &UserId) -> Result<(), ApiError> {
        let path = format!("/users/{}", urlencoding::encode(id.as_str()));
        self.execute_raw(self.request(Method::DELETE, &path, Some(token)))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Payments and health
    // =========================================================================

    /// Create a payment preference at the gateway via the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the preference or the token.
    #[instrument(skip(self, token, items), fields(items = items.len()))]
    pub async fn create_preference(
        &self,
        token: &SecretString,
        items: Vec<PreferenceItem>,
    ) -> Result<PreferenceResponse, ApiError> {
        let body = PreferenceRequest { items };
        let value = self
            .execute_raw(
                self.request(Method::POST, "/payment/create-preference", Some(token))
                    .json(&body),
            )
            .await?;
        // `success` and `id` sit at the top level; do not unwrap an envelope here.
        Ok(serde_json::from_value(value)?)
    }

    /// Whether the backend answers `GET /health` with a 2xx.
    #[instrument(skip(self))]
    pub async fn health(&self) -> bool {
        match self.request(Method::GET, "/health", None).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "backend health check failed");
                false
            }
        }
    }
}

/// `{"data": x}` becomes `x`; anything else is returned unchanged.
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) if !data.is_null() => data,
            Some(data) => {
                map.insert("data".to_string(), data);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Most specific error message in a reply body.
///
/// Order of preference: `message`, then the joined `errors[].msg` /
/// `errors[].message`, then a generic status line.
fn error_message(body: Option<&Value>, status: StatusCode) -> String {
    let from_message = body
        .and_then(|b| b.get("message"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_owned);

    let from_errors = || {
        let errors = body?.get("errors")?.as_array()?;
        let joined = errors
            .iter()
            .filter_map(|e| {
                e.get("msg")
                    .or_else(|| e.get("message"))
                    .and_then(Value::as_str)
                    .or_else(|| e.as_str())
            })
            .collect::<Vec<_>>()
            .join(", ");
        (!joined.is_empty()).then_some(joined)
    };

    from_message
        .or_else(from_errors)
        .unwrap_or_else(|| format!("HTTP error, status: {}", status.as_u16()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_error_message_prefers_message_field() {
        let body = json!({"message": "Email already registered", "errors": [{"msg": "x"}]});
        assert_eq!(
            error_message(Some(&body), StatusCode::BAD_REQUEST),
            "Email already registered"
        );
    }

    #[test]
    fn test_error_message_joins_validation_errors() {
        let body = json!({"errors": [{"msg": "Name is required"}, {"message": "Price must be positive"}]});
        assert_eq!(
            error_message(Some(&body), StatusCode::UNPROCESSABLE_ENTITY),
            "Name is required, Price must be positive"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        assert_eq!(
            error_message(Some(&json!({"errors": []})), StatusCode::INTERNAL_SERVER_ERROR),
            "HTTP error, status: 500"
        );
        assert_eq!(
            error_message(None, StatusCode::BAD_GATEWAY),
            "HTTP error, status: 502"
        );
    }

    #[test]
    fn test_unwrap_envelope() {
        assert_eq!(unwrap_envelope(json!({"data": [1, 2]})), json!([1, 2]));
        assert_eq!(unwrap_envelope(json!([1, 2])), json!([1, 2]));
        assert_eq!(
            unwrap_envelope(json!({"data": null, "x": 1})),
            json!({"data": null, "x": 1})
        );
        assert_eq!(
            unwrap_envelope(json!({"success": true, "id": "p"})),
            json!({"success": true, "id": "p"})
        );
    }

    #[test]
    fn test_api_error_user_message() {
        let err = ApiError::Status {
            status: StatusCode::NOT_FOUND,
            message: "Producto no encontrado".to_string(),
        };
        assert_eq!(err.user_message(), "Producto no encontrado");
        assert!(err.is_not_found());

        let err = ApiError::Parse(serde_json::from_str::<Value>("<html>").unwrap_err());
        assert_eq!(err.user_message(), PARSE_ERROR_MESSAGE);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ApiError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
        assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
    }
}
