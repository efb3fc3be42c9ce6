//! Authentication extractors.
//!
//! Both read the logged-in user through [`SessionHolder`], so handlers never
//! touch the `current_user` session key themselves.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::Span;

use crate::error::AppError;
use crate::models::UserRecord;
use crate::services::SessionHolder;

/// Extractor that requires a logged-in user.
///
/// If nobody is logged in, the request is rejected with 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.full_name())
/// }
/// ```
pub struct RequireAuth(pub UserRecord);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state).await?;

        user.map(Self)
            .ok_or_else(|| AppError::Unauthorized("Please log in to continue".to_string()))
    }
}

/// Extractor that optionally gets the logged-in user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     OptionalAuth(user): OptionalAuth,
/// ) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Hello, {}!", u.full_name()),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalAuth(pub Option<UserRecord>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let holder = SessionHolder::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(msg.to_string()))?;

        let user = holder.current().await?;
        if let Some(user) = &user {
            Span::current().record("user_id", tracing::field::display(user.id));
        }

        Ok(Self(user))
    }
}
