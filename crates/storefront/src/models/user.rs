//! User domain types.
//!
//! [`UserRecord`] is both the stored shape (camelCase JSON inside the `users`
//! document) and the value held in the session. Every field deserializes
//! through its validating constructor, so a record read back from storage has
//! passed the same checks as one created by signup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketstall_core::{Email, PersonName, PhoneNumber, UserId};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Unique user ID.
    pub id: UserId,
    /// Given name.
    pub first_name: PersonName,
    /// Family name.
    pub last_name: PersonName,
    /// Login key, unique ignoring case.
    pub email: Email,
    /// 10-digit mobile number.
    pub phone_number: PhoneNumber,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// "First Last", as shown on the landing page.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Return a copy with `patch` applied.
    #[must_use]
    pub fn patched(&self, patch: &UserPatch) -> Self {
        let mut user = self.clone();
        patch.apply(&mut user);
        user
    }
}

/// Validated signup fields, before an ID and password hash are assigned.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: Email,
    pub phone_number: PhoneNumber,
}

/// Partial update of the mutable fields of a [`UserRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub email: Option<Email>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    /// Patch that changes only the email.
    #[must_use]
    pub const fn email(email: Email) -> Self {
        Self {
            email: Some(email),
            password_hash: None,
        }
    }

    /// Patch that changes only the password hash.
    #[must_use]
    pub const fn password_hash(hash: String) -> Self {
        Self {
            email: None,
            password_hash: Some(hash),
        }
    }

    /// Overwrite the fields this patch carries.
    pub fn apply(&self, user: &mut UserRecord) {
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(hash) = &self.password_hash {
            user.password_hash = hash.clone();
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.password_hash.is_none()
    }
}

/// Public view of a user, without the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

impl From<&UserRecord> for ProfileView {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.to_string(),
            last_name: user.last_name.to_string(),
            email: user.email.to_string(),
            phone_number: user.phone_number.to_string(),
        }
    }
}
