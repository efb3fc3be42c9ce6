//! Authentication service.
//!
//! Signup, login, logout and the two profile edits. Each flow validates its
//! form, talks to the account store, and then brings the session in line.

mod error;
pub mod password;
pub mod validation;

pub use error::AuthError;
pub use password::{CredentialError, CredentialService};
pub use validation::{
    ChangeEmailForm, ChangePasswordForm, FieldError, FieldErrors, LoginForm, SignupForm,
};

use tracing::instrument;

use crate::db::{RepositoryError, UserRepository};
use crate::models::{UserPatch, UserRecord};
use crate::services::session::SessionHolder;

/// Authentication service.
///
/// Borrows the shared account store and credential service for one request.
pub struct AuthService<'a> {
    users: &'a UserRepository,
    credentials: &'a CredentialService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a UserRepository, credentials: &'a CredentialService) -> Self {
        Self { users, credentials }
    }

    // =========================================================================
    // Signup / Login / Logout
    // =========================================================================

    /// Register a new account and log it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if any field fails validation.
    /// Returns `AuthError::DuplicateEmail` if the email is already registered;
    /// no session is created in that case.
    #[instrument(skip_all, fields(email = %form.email.trim()))]
    pub async fn signup(
        &self,
        session: &SessionHolder,
        form: &SignupForm,
    ) -> Result<UserRecord, AuthError> {
        let new_user = form.validate()?;

        let user = self
            .users
            .create_user(new_user, &form.password)
            .map_err(|e| match e {
                RepositoryError::DuplicateEmail => AuthError::DuplicateEmail,
                other => AuthError::Repository(other),
            })?;

        session.login(&user).await?;

        tracing::info!(user_id = %user.id, "Signed up");
        Ok(user)
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the form is malformed.
    /// Returns `AuthError::EmailNotFound` if no account has the email.
    /// Returns `AuthError::WrongPassword` if the password does not match.
    #[instrument(skip_all, fields(email = %form.email.trim()))]
    pub async fn login(
        &self,
        session: &SessionHolder,
        form: &LoginForm,
    ) -> Result<UserRecord, AuthError> {
        let email = form.validate()?;

        let Some(user) = self.users.find_by_email(&email)? else {
            tracing::warn!("Login for unknown email");
            return Err(AuthError::EmailNotFound);
        };

        if !self.credentials.verify(&form.password, &user.password_hash) {
            tracing::warn!(user_id = %user.id, "Login with wrong password");
            return Err(AuthError::WrongPassword);
        }

        session.login(&user).await?;

        tracing::info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// Log out. Succeeds whether or not anyone was logged in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session cannot be written.
    pub async fn logout(&self, session: &SessionHolder) -> Result<(), AuthError> {
        if let Some(user) = session.current().await? {
            tracing::info!(user_id = %user.id, "Logged out");
        }
        session.logout().await?;
        Ok(())
    }

    // =========================================================================
    // Profile edits
    // =========================================================================

    /// Change the logged-in user's email.
    ///
    /// The account store is updated first; the session copy follows.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` if nobody is logged in.
    /// Returns `AuthError::Validation` if the new email is malformed.
    /// Returns `AuthError::EmailTaken` if another account uses the email.
    #[instrument(skip_all)]
    pub async fn change_email(
        &self,
        session: &SessionHolder,
        form: &ChangeEmailForm,
    ) -> Result<UserRecord, AuthError> {
        let current = session.current().await?.ok_or(AuthError::NotAuthenticated)?;
        let email = form.validate()?;

        if self.users.email_exists(&email, Some(current.id))? {
            tracing::warn!(user_id = %current.id, "Email change to an address in use");
            return Err(AuthError::EmailTaken);
        }

        let patch = UserPatch::email(email);
        self.users
            .update_user(current.id, &patch)
            .map_err(|e| match e {
                RepositoryError::DuplicateEmail => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        let updated = session.update_current(&patch).await?;

        tracing::info!(user_id = %updated.id, "Changed email");
        Ok(updated)
    }

    /// Change the logged-in user's password after checking the old one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` if nobody is logged in.
    /// Returns `AuthError::Validation` if the new password breaks the policy
    /// or the confirmation differs.
    /// Returns `AuthError::WrongPassword` if the old password does not match.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        session: &SessionHolder,
        form: &ChangePasswordForm,
    ) -> Result<UserRecord, AuthError> {
        let current = session.current().await?.ok_or(AuthError::NotAuthenticated)?;
        form.validate()?;

        let stored = self
            .users
            .get_by_id(current.id)?
            .ok_or(AuthError::Repository(RepositoryError::NotFound))?;

        if !self
            .credentials
            .verify(&form.old_password, &stored.password_hash)
        {
            tracing::warn!(user_id = %current.id, "Password change with wrong old password");
            return Err(AuthError::WrongPassword);
        }

        let patch = UserPatch::password_hash(self.credentials.hash(&form.new_password)?);
        self.users.update_user(current.id, &patch)?;

        let updated = session.update_current(&patch).await?;

        tracing::info!(user_id = %updated.id, "Changed password");
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;
    use tower_sessions::{MemoryStore, Session};

    use super::*;
    use crate::config::PasswordCost;
    use crate::db::MemoryStore as MemoryKeyValueStore;

    struct Fixture {
        users: UserRepository,
        credentials: CredentialService,
    }

    impl Fixture {
        fn new() -> Self {
            let credentials = CredentialService::new(PasswordCost::minimal()).unwrap();
            let users = UserRepository::new(
                Arc::new(MemoryKeyValueStore::new()),
                credentials.clone(),
            );
            Self { users, credentials }
        }

        fn service(&self) -> AuthService<'_> {
            AuthService::new(&self.users, &self.credentials)
        }
    }

    fn session() -> SessionHolder {
        SessionHolder::new(Session::new(None, Arc::new(MemoryStore::default()), None))
    }

    fn jon_snow() -> SignupForm {
        SignupForm {
            first_name: "Jon".to_string(),
            last_name: "Snow".to_string(),
            email: "jon@wall.com".to_string(),
            phone_number: "9998887771".to_string(),
            password: SecretString::from("Abcd123!"),
            confirm_password: SecretString::from("Abcd123!"),
        }
    }

    fn login_form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.to_string(),
            password: SecretString::from(password),
        }
    }

    fn change_password_form(old: &str, new: &str, confirm: &str) -> ChangePasswordForm {
        ChangePasswordForm {
            old_password: SecretString::from(old),
            new_password: SecretString::from(new),
            confirm_new_password: SecretString::from(confirm),
        }
    }

    #[tokio::test]
    async fn test_signup_logs_in() {
        let fixture = Fixture::new();
        let session = session();

        let user = fixture.service().signup(&session, &jon_snow()).await.unwrap();

        assert_eq!(user.full_name(), "Jon Snow");
        assert_eq!(session.current().await.unwrap(), Some(user.clone()));
        assert_eq!(fixture.users.list_users().unwrap(), vec![user]);
    }

    #[tokio::test]
    async fn test_duplicate_signup_creates_no_session() {
        let fixture = Fixture::new();
        fixture.service().signup(&session(), &jon_snow()).await.unwrap();

        let mut form = jon_snow();
        form.email = "JON@wall.com".to_string();
        let fresh = session();
        let result = fixture.service().signup(&fresh, &form).await;

        assert!(matches!(result, Err(AuthError::DuplicateEmail)));
        assert!(fresh.current().await.unwrap().is_none());
        assert_eq!(fixture.users.list_users().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_signup_stores_nothing() {
        let fixture = Fixture::new();
        let mut form = jon_snow();
        form.phone_number = "123".to_string();

        let result = fixture.service().signup(&session(), &form).await;

        assert!(matches!(result, Err(AuthError::Validation(_))));
        assert!(fixture.users.list_users().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_outcomes() {
        let fixture = Fixture::new();
        fixture.service().signup(&session(), &jon_snow()).await.unwrap();
        let service = fixture.service();

        let unknown = service
            .login(&session(), &login_form("arya@winterfell.com", "Abcd123!"))
            .await;
        assert!(matches!(unknown, Err(AuthError::EmailNotFound)));

        let wrong = session();
        let result = service
            .login(&wrong, &login_form("jon@wall.com", "Abcd123?"))
            .await;
        assert!(matches!(result, Err(AuthError::WrongPassword)));
        assert!(wrong.current().await.unwrap().is_none());

        let right = session();
        let user = service
            .login(&right, &login_form("Jon@Wall.com", "Abcd123!"))
            .await
            .unwrap();
        assert_eq!(user.email.as_str(), "jon@wall.com");
        assert!(right.state().await.unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn test_logout() {
        let fixture = Fixture::new();
        let session = session();
        fixture.service().signup(&session, &jon_snow()).await.unwrap();

        fixture.service().logout(&session).await.unwrap();
        assert!(session.current().await.unwrap().is_none());

        fixture.service().logout(&session).await.unwrap();
    }

    #[tokio::test]
    async fn test_change_email() {
        let fixture = Fixture::new();
        let session = session();
        let user = fixture.service().signup(&session, &jon_snow()).await.unwrap();

        let form = ChangeEmailForm {
            email: "King@North.com".to_string(),
        };
        let updated = fixture.service().change_email(&session, &form).await.unwrap();

        assert_eq!(updated.email.as_str(), "king@north.com");
        assert_eq!(updated.id, user.id);
        assert_eq!(session.current().await.unwrap(), Some(updated.clone()));
        assert_eq!(fixture.users.list_users().unwrap(), vec![updated]);

        let old_login = fixture
            .service()
            .login(&self::session(), &login_form("jon@wall.com", "Abcd123!"))
            .await;
        assert!(matches!(old_login, Err(AuthError::EmailNotFound)));
    }

    #[tokio::test]
    async fn test_change_email_to_own_address_is_allowed() {
        let fixture = Fixture::new();
        let session = session();
        fixture.service().signup(&session, &jon_snow()).await.unwrap();

        let form = ChangeEmailForm {
            email: "JON@WALL.COM".to_string(),
        };
        let updated = fixture.service().change_email(&session, &form).await.unwrap();
        assert_eq!(updated.email.as_str(), "jon@wall.com");
    }

    #[tokio::test]
    async fn test_change_email_taken() {
        let fixture = Fixture::new();
        let mut arya = jon_snow();
        arya.first_name = "Arya".to_string();
        arya.last_name = "Stark".to_string();
        arya.email = "arya@winterfell.com".to_string();
        fixture.service().signup(&session(), &arya).await.unwrap();

        let session = session();
        let jon = fixture.service().signup(&session, &jon_snow()).await.unwrap();

        let form = ChangeEmailForm {
            email: "Arya@Winterfell.com".to_string(),
        };
        let result = fixture.service().change_email(&session, &form).await;

        assert!(matches!(result, Err(AuthError::EmailTaken)));
        assert_eq!(session.current().await.unwrap(), Some(jon.clone()));
        assert_eq!(fixture.users.get_by_id(jon.id).unwrap(), Some(jon));
    }

    #[tokio::test]
    async fn test_profile_edits_require_login() {
        let fixture = Fixture::new();
        let form = ChangeEmailForm {
            email: "king@north.com".to_string(),
        };

        let result = fixture.service().change_email(&session(), &form).await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));

        let form = change_password_form("Abcd123!", "Wxyz789#", "Wxyz789#");
        let result = fixture.service().change_password(&session(), &form).await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_change_password() {
        let fixture = Fixture::new();
        let session = session();
        let user = fixture.service().signup(&session, &jon_snow()).await.unwrap();

        let form = change_password_form("Abcd123!", "Wxyz789#", "Wxyz789#");
        let updated = fixture
            .service()
            .change_password(&session, &form)
            .await
            .unwrap();

        assert_ne!(updated.password_hash, user.password_hash);
        assert_eq!(session.current().await.unwrap(), Some(updated));

        let service = fixture.service();
        let old = service
            .login(&self::session(), &login_form("jon@wall.com", "Abcd123!"))
            .await;
        assert!(matches!(old, Err(AuthError::WrongPassword)));
        service
            .login(&self::session(), &login_form("jon@wall.com", "Wxyz789#"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_change_password_rejections() {
        let fixture = Fixture::new();
        let session = session();
        let user = fixture.service().signup(&session, &jon_snow()).await.unwrap();
        let service = fixture.service();

        let mismatch = change_password_form("Abcd123!", "Wxyz789#", "Wxyz789!");
        let result = service.change_password(&session, &mismatch).await;
        assert!(matches!(result, Err(AuthError::Validation(_))));

        let wrong_old = change_password_form("Abcd123?", "Wxyz789#", "Wxyz789#");
        let result = service.change_password(&session, &wrong_old).await;
        assert!(matches!(result, Err(AuthError::WrongPassword)));

        assert_eq!(fixture.users.get_by_id(user.id).unwrap(), Some(user));
    }
}
