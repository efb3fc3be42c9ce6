//! Profile route handlers (require login).

use axum::{Json, extract::State};

use super::auth::AccountMessage;
use crate::error::Result;
use crate::middleware::{JsonBody, RequireAuth};
use crate::models::ProfileView;
use crate::services::SessionHolder;
use crate::services::auth::{ChangeEmailForm, ChangePasswordForm};
use crate::state::AppState;

/// The logged-in user's profile.
pub async fn profile(RequireAuth(user): RequireAuth) -> Json<ProfileView> {
    Json(ProfileView::from(&user))
}

/// Change the logged-in user's email.
pub async fn change_email(
    State(state): State<AppState>,
    session: SessionHolder,
    JsonBody(form): JsonBody<ChangeEmailForm>,
) -> Result<Json<AccountMessage>> {
    let user = state.auth().change_email(&session, &form).await?;

    Ok(Json(AccountMessage {
        message: "Email updated successfully",
        user: Some(ProfileView::from(&user)),
    }))
}

/// Change the logged-in user's password.
pub async fn change_password(
    State(state): State<AppState>,
    session: SessionHolder,
    JsonBody(form): JsonBody<ChangePasswordForm>,
) -> Result<Json<AccountMessage>> {
    let user = state.auth().change_password(&session, &form).await?;

    Ok(Json(AccountMessage {
        message: "Password updated successfully",
        user: Some(ProfileView::from(&user)),
    }))
}
