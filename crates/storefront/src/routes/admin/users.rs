//! Back-office user management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use vitrina_core::UserId;

use super::{finish_mutation, rows_or_flash};
use crate::api::{User, UserUpdate};
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin, push_flash};
use crate::models::Flash;
use crate::state::AppState;

const LIST: &str = "/admin/users";

/// Role toggle form: the role the user has now.
#[derive(Debug, Deserialize)]
pub struct ToggleAdminForm {
    #[serde(default)]
    pub is_admin: bool,
}

/// User table template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub ctx: PageContext,
    pub users: Vec<User>,
    pub current_user_id: UserId,
}

/// Display the user table.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    mut ctx: PageContext,
) -> Result<UsersTemplate> {
    let result = state.backend().list_users(&auth.token).await;
    let users = rows_or_flash(result, &mut ctx, "users")?;
    Ok(UsersTemplate {
        ctx,
        users,
        current_user_id: auth.user.id,
    })
}

/// Grant or revoke the admin role.
///
/// Admins cannot change their own role, so the back-office always keeps at
/// least the acting admin.
#[instrument(skip(state, session, auth))]
pub async fn toggle_admin(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<ToggleAdminForm>,
) -> Result<Redirect> {
    let id = UserId::new(id);
    if id == auth.user.id {
        push_flash(&session, Flash::error("You cannot change your own role")).await?;
        return Ok(Redirect::to(LIST));
    }

    let make_admin = !form.is_admin;
    let update = UserUpdate {
        is_admin: Some(make_admin),
    };
    let outcome = state
        .backend()
        .update_user(&auth.token, &id, &update)
        .await;
    let role = if make_admin { "Administrator" } else { "User" };

    finish_mutation(
        &session,
        outcome,
        format!("User role updated to {role}"),
        "Could not update the user role",
        LIST,
    )
    .await
}

/// Delete a user.
#[instrument(skip(state, session, auth))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let id = UserId::new(id);
    if id == auth.user.id {
        push_flash(&session, Flash::error("You cannot delete your own account")).await?;
        return Ok(Redirect::to(LIST));
    }

    let outcome = state.backend().delete_user(&auth.token, &id).await;
    finish_mutation(
        &session,
        outcome,
        "User deleted".to_string(),
        "Could not delete the user",
        LIST,
    )
    .await
}
