//! Authentication route handlers.
//!
//! Handles login, registration, logout, password recovery and the email
//! verification landing page. Credentials are checked by the backend; this
//! side only keeps the resulting auth record in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use vitrina_core::{Email, VerificationStatus};

use crate::api::RegisterRequest;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{PageContext, clear_current_user, push_flash, set_current_user};
use crate::models::{CurrentUser, Flash};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Deserialize)]
pub struct ResetPasswordForm {
    pub password: String,
    pub confirm_password: String,
}

/// Query parameters of the verification landing page.
#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub status: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub email: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub email: String,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub token: String,
}

/// Email verification result template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/verify_email.html")]
pub struct VerifyEmailTemplate {
    pub ctx: PageContext,
    pub verified: bool,
    pub heading: &'static str,
    pub message: &'static str,
    pub email: Option<String>,
}

// =============================================================================
// Login
// =============================================================================

/// Display the login page.
pub async fn login_page(ctx: PageContext) -> impl IntoResponse {
    LoginTemplate {
        ctx,
        error: None,
        email: String::new(),
    }
}

/// Handle login form submission.
///
/// On success the profile and token go into the session, the active cart
/// switches to the user's, and the visitor lands on the home page.
#[instrument(skip(state, session, ctx, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let retry = |ctx: PageContext, error: String, email: String| -> Result<Response> {
        Ok(LoginTemplate {
            ctx,
            error: Some(error),
            email,
        }
        .into_response())
    };

    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => return retry(ctx, e.to_string(), form.email),
    };
    if form.password.is_empty() {
        return retry(ctx, "Password is required".to_string(), email.into_inner());
    }

    match state.backend().login(email.as_str(), &form.password).await {
        Ok(payload) => {
            let user = CurrentUser::from(payload.user);
            set_current_user(&session, &user, &SecretString::from(payload.token)).await?;
            set_sentry_user(&user.id, Some(&user.email));
            tracing::info!(user_id = %user.id, admin = user.is_admin, "user logged in");

            ctx.requeue(&session).await?;
            push_flash(
                &session,
                Flash::success(format!("Welcome back, {}", user.display_name())),
            )
            .await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "login failed");
            retry(ctx, e.user_message(), email.into_inner())
        }
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
pub async fn register_page(ctx: PageContext) -> impl IntoResponse {
    RegisterTemplate {
        ctx,
        error: None,
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
    }
}

/// Handle registration form submission.
///
/// The new account must verify its email before logging in, so nobody is
/// signed in here.
#[instrument(skip(state, session, ctx, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let first_name = form.first_name.trim().to_string();
    let last_name = form.last_name.trim().to_string();

    let validation = if first_name.is_empty() {
        Err("First name is required".to_string())
    } else if form.password != form.confirm_password {
        Err("Passwords do not match".to_string())
    } else {
        Email::parse(&form.email).map_err(|e| e.to_string())
    };

    let email = match validation {
        Ok(email) => email,
        Err(error) => {
            return Ok(RegisterTemplate {
                ctx,
                error: Some(error),
                first_name,
                last_name,
                email: form.email,
            }
            .into_response());
        }
    };

    match state
        .backend()
        .register(&RegisterRequest {
            first_name: &first_name,
            last_name: &last_name,
            email: email.as_str(),
            password: &form.password,
        })
        .await
    {
        Ok(payload) => {
            let sent_to = payload.email.unwrap_or_else(|| email.as_str().to_string());
            tracing::info!("account registered, awaiting email verification");
            ctx.requeue(&session).await?;
            push_flash(
                &session,
                Flash::success(format!("We sent a verification email to {sent_to}")),
            )
            .await?;
            Ok(Redirect::to("/auth/login").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "registration failed");
            Ok(RegisterTemplate {
                ctx,
                error: Some(e.user_message()),
                first_name,
                last_name,
                email: email.into_inner(),
            }
            .into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// The user's cart stays in the session for their next login; the guest
/// cart becomes active again.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    push_flash(&session, Flash::info("You have been logged out")).await?;
    Ok(Redirect::to("/"))
}

// =============================================================================
// Password recovery
// =============================================================================

/// Display the forgot password page.
pub async fn forgot_password_page(ctx: PageContext) -> impl IntoResponse {
    ForgotPasswordTemplate {
        ctx,
        error: None,
        email: String::new(),
    }
}

/// Ask the backend to email a recovery link.
#[instrument(skip(state, session, ctx, form))]
pub async fn forgot_password(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response> {
    let outcome = match Email::parse(&form.email) {
        Ok(email) => state
            .backend()
            .forgot_password(email.as_str())
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "password recovery request failed");
                e.user_message()
            }),
        Err(e) => Err(e.to_string()),
    };

    match outcome {
        Ok(()) => {
            ctx.requeue(&session).await?;
            push_flash(
                &session,
                Flash::success("Recovery email sent. Check your inbox."),
            )
            .await?;
            Ok(Redirect::to("/auth/login").into_response())
        }
        Err(error) => Ok(ForgotPasswordTemplate {
            ctx,
            error: Some(error),
            email: form.email,
        }
        .into_response()),
    }
}

/// Display the new password form for a recovery token.
pub async fn reset_password_page(ctx: PageContext, Path(token): Path<String>) -> impl IntoResponse {
    ResetPasswordTemplate {
        ctx,
        error: None,
        token,
    }
}

/// Set a new password with a recovery token.
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response> {
    let outcome = if form.password.is_empty() {
        Err("Password is required".to_string())
    } else if form.password != form.confirm_password {
        Err("Passwords do not match".to_string())
    } else {
        state
            .backend()
            .reset_password(&token, &form.password)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "password reset failed");
                e.user_message()
            })
    };

    match outcome {
        Ok(()) => {
            ctx.requeue(&session).await?;
            push_flash(
                &session,
                Flash::success("Your password has been updated. You can now log in."),
            )
            .await?;
            Ok(Redirect::to("/auth/login").into_response())
        }
        Err(error) => Ok(ResetPasswordTemplate {
            ctx,
            error: Some(error),
            token,
        }
        .into_response()),
    }
}

// =============================================================================
// Email verification
// =============================================================================

/// Landing page the backend redirects to after following a verification link.
#[instrument(skip(ctx))]
pub async fn verify_email(
    ctx: PageContext,
    Query(query): Query<VerifyEmailQuery>,
) -> impl IntoResponse {
    let status = VerificationStatus::from_query(query.status.as_deref());
    let (heading, message) = verification_copy(status);

    VerifyEmailTemplate {
        ctx,
        verified: status == VerificationStatus::Success,
        heading,
        message,
        email: query.email.filter(|e| !e.trim().is_empty()),
    }
}

const fn verification_copy(status: VerificationStatus) -> (&'static str, &'static str) {
    match status {
        VerificationStatus::Success => (
            "Email verified",
            "Your account is active. You can now log in.",
        ),
        VerificationStatus::Invalid => (
            "Invalid link",
            "This verification link is not valid. Try registering again.",
        ),
        VerificationStatus::Expired => (
            "Link expired",
            "This verification link has expired. Register again to get a new one.",
        ),
        VerificationStatus::Error => (
            "Verification failed",
            "Something went wrong while verifying your email. Please try again later.",
        ),
        VerificationStatus::Unknown => (
            "Email verification",
            "Follow the link in your verification email to activate your account.",
        ),
    }
}
