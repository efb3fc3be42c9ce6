//! Landing page route handler.

use axum::Json;
use serde::Serialize;

use crate::middleware::OptionalAuth;
use crate::models::ProfileView;

/// Landing page payload.
#[derive(Debug, Serialize)]
pub struct HomeView {
    pub greeting: String,
    pub user: Option<ProfileView>,
}

/// Greet the logged-in user by name.
pub async fn home(OptionalAuth(user): OptionalAuth) -> Json<HomeView> {
    let greeting = user.as_ref().map_or_else(
        || "Please log in to see your name".to_string(),
        |u| format!("Hello, {}", u.full_name()),
    );

    Json(HomeView {
        greeting,
        user: user.as_ref().map(ProfileView::from),
    })
}
