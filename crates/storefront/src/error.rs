//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::api::ApiError;
use crate::filters;
use crate::middleware::PageContext;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed.
    #[error("Backend error: {0}")]
    Api(ApiError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but lacks the admin role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// The backend no longer accepts the stored bearer token.
    #[error("Session expired")]
    SessionExpired,

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized(_) => Self::SessionExpired,
            ApiError::RateLimited(_) => Self::RateLimited,
            err if err.is_not_found() => Self::NotFound(err.user_message()),
            err => Self::Api(err),
        }
    }
}

/// Response extension telling the session middleware that the stored auth
/// record must be discarded.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpiredMarker;

/// Error page template.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub ctx: PageContext,
    pub status: u16,
    pub title: &'static str,
    pub message: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Api(ApiError::Http(_) | ApiError::Parse(_)) => StatusCode::BAD_GATEWAY,
            Self::Api(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) | Self::SessionExpired => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Message safe to show to the visitor.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(_) => "The page you are looking for does not exist.".to_string(),
            Self::RateLimited => "Too many requests. Please wait a moment.".to_string(),
            Self::SessionExpired => "Your session has expired. Please log in again.".to_string(),
            Self::Unauthorized(msg) | Self::Forbidden(msg) | Self::BadRequest(msg) => msg.clone(),
        }
    }

    const fn title(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Page not found",
            Self::Unauthorized(_) | Self::SessionExpired => "Not signed in",
            Self::Forbidden(_) => "Access denied",
            Self::BadRequest(_) => "Invalid request",
            Self::RateLimited => "Slow down",
            Self::Api(_) | Self::Session(_) | Self::Internal(_) => "Something went wrong",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::SessionExpired) {
            tracing::info!("backend rejected the session token, redirecting to login");
            let mut response = Redirect::to("/auth/login").into_response();
            response.extensions_mut().insert(SessionExpiredMarker);
            return response;
        }

        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let page = ErrorTemplate {
            ctx: PageContext::bare(),
            status: status.as_u16(),
            title: self.title(),
            message: self.public_message(),
        };

        (status, page).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
