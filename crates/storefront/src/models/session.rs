//! Session-related types.
//!
//! Types stored in the session for authentication state.

use crate::models::user::UserRecord;

/// Authentication state of one browsing session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nobody is logged in.
    #[default]
    Anonymous,
    /// A user is logged in; the held copy mirrors the stored record.
    Authenticated(UserRecord),
}

impl SessionState {
    /// The held user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserRecord> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }

    /// Consume the state, yielding the held user.
    #[must_use]
    pub fn into_user(self) -> Option<UserRecord> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

impl From<Option<UserRecord>> for SessionState {
    fn from(user: Option<UserRecord>) -> Self {
        user.map_or(Self::Anonymous, Self::Authenticated)
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the product list cached for this session.
    pub const CACHED_PRODUCTS: &str = "cached_products";
}
