//! Account page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::User;
use crate::error::Result;
use crate::filters;
use crate::middleware::auth::update_current_user;
use crate::middleware::{PageContext, RequireAuth};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    pub ctx: PageContext,
    pub profile: User,
}

/// Display the profile, refreshed from the backend.
///
/// The session copy of the user is updated so the header and the admin
/// guard see role or name changes made elsewhere.
#[instrument(skip(state, session, auth, ctx), fields(user_id = %auth.user.id))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    mut ctx: PageContext,
) -> Result<AccountTemplate> {
    let profile = state.backend().me(&auth.token).await?;

    let refreshed = CurrentUser::from(profile.clone());
    if refreshed != auth.user {
        update_current_user(&session, &refreshed).await?;
        ctx.user = Some(refreshed);
    }

    Ok(AccountTemplate { ctx, profile })
}
