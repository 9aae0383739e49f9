//! Theme preference.

use axum::{Form, response::Redirect};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::models::{Theme, session_keys};
use crate::routes::safe_return_path;

/// Theme toggle form data.
#[derive(Debug, Deserialize)]
pub struct ThemeForm {
    pub return_to: Option<String>,
}

/// Flip between light and dark, then go back to the page the toggle was on.
#[instrument(skip(session))]
pub async fn toggle(session: Session, Form(form): Form<ThemeForm>) -> Result<Redirect> {
    let current: Theme = session
        .get(session_keys::THEME)
        .await?
        .unwrap_or_default();
    session
        .insert(session_keys::THEME, current.toggled())
        .await?;

    Ok(Redirect::to(&safe_return_path(form.return_to.as_deref())))
}
