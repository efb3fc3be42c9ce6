//! Session holder.
//!
//! Wraps the request's `tower_sessions::Session` and owns the
//! `current_user` key. Handlers never touch that key directly.

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use tower_sessions::Session;

use crate::models::session_keys;
use crate::models::{SessionState, UserPatch, UserRecord};

/// Errors from the session holder.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading or writing the session store failed.
    #[error("session store error: {0}")]
    Store(#[from] tower_sessions::session::Error),

    /// The operation needs an authenticated session.
    #[error("no user is logged in")]
    NotAuthenticated,
}

/// Authentication state of the current session.
#[derive(Debug, Clone)]
pub struct SessionHolder {
    session: Session,
}

impl SessionHolder {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session, for other session-scoped data.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// The logged-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` if the session cannot be read.
    pub async fn current(&self) -> Result<Option<UserRecord>, SessionError> {
        Ok(self
            .session
            .get::<UserRecord>(session_keys::CURRENT_USER)
            .await?)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Store` if the session cannot be read.
    pub async fn state(&self) -> Result<SessionState, SessionError> {
        self.current().await.map(SessionState::from)
    }

    /// Hold `user` as the logged-in user, replacing whoever was held.
    ///
    /// The session ID is cycled to prevent fixation.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` if the session cannot be written.
    pub async fn login(&self, user: &UserRecord) -> Result<(), SessionError> {
        self.session.cycle_id().await?;
        self.session
            .insert(session_keys::CURRENT_USER, user)
            .await?;
        Ok(())
    }

    /// Forget the logged-in user. A no-op when nobody is logged in.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` if the session cannot be written.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.session
            .remove_value(session_keys::CURRENT_USER)
            .await?;
        Ok(())
    }

    /// Replace the held user with a patched copy. The account store is not
    /// touched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAuthenticated` if nobody is logged in, or
    /// `SessionError::Store` on session failure.
    pub async fn update_current(&self, patch: &UserPatch) -> Result<UserRecord, SessionError> {
        let current = self
            .current()
            .await?
            .ok_or(SessionError::NotAuthenticated)?;

        let updated = current.patched(patch);
        self.session
            .insert(session_keys::CURRENT_USER, &updated)
            .await?;
        Ok(updated)
    }
}

impl<S> FromRequestParts<S> for SessionHolder
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(Self::new(session))
    }
}
