//! Authentication route handlers.
//!
//! Signup, login and logout. Each handler runs one flow against the request's
//! session and answers with the affected user.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::JsonBody;
use crate::models::ProfileView;
use crate::services::SessionHolder;
use crate::services::auth::{LoginForm, SignupForm};
use crate::state::AppState;

/// Outcome of an account action.
#[derive(Debug, Serialize)]
pub struct AccountMessage {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ProfileView>,
}

/// Create an account and log it in.
pub async fn signup(
    State(state): State<AppState>,
    session: SessionHolder,
    JsonBody(form): JsonBody<SignupForm>,
) -> Result<impl IntoResponse> {
    let user = state.auth().signup(&session, &form).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok((
        StatusCode::CREATED,
        Json(AccountMessage {
            message: "Account created successfully",
            user: Some(ProfileView::from(&user)),
        }),
    ))
}

/// Log in with email and password.
pub async fn login(
    State(state): State<AppState>,
    session: SessionHolder,
    JsonBody(form): JsonBody<LoginForm>,
) -> Result<Json<AccountMessage>> {
    let user = state.auth().login(&session, &form).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(Json(AccountMessage {
        message: "Logged in successfully",
        user: Some(ProfileView::from(&user)),
    }))
}

/// Log out. Succeeds when nobody is logged in.
pub async fn logout(
    State(state): State<AppState>,
    session: SessionHolder,
) -> Result<Json<AccountMessage>> {
    state.auth().logout(&session).await?;
    clear_sentry_user();

    Ok(Json(AccountMessage {
        message: "Logged out successfully",
        user: None,
    }))
}
