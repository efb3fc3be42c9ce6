//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! ms-cli users list
//! ms-cli --data-dir ./data users create -f Jon -l Snow -e jon@wall.com -p 9998887771 --password 'Abcd123!'
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATA_DIR` - Directory holding `users.json`
//! - `PASSWORD_HASH_*` - Argon2 cost, shared with the storefront

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use thiserror::Error;

use marketstall_storefront::config::{ConfigError, StorefrontConfig};
use marketstall_storefront::db::{FileStore, RepositoryError, UserRepository};
use marketstall_storefront::models::UserRecord;
use marketstall_storefront::services::auth::{
    CredentialError, CredentialService, FieldErrors, SignupForm,
};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UsersError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reading or writing the account store failed.
    #[error("Storage error: {0}")]
    Repository(#[from] RepositoryError),

    /// The password cost is invalid.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Input failed signup validation.
    #[error("Invalid input: {0}")]
    Invalid(FieldErrors),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),
}

/// Arguments of `users create`.
#[derive(Debug)]
pub struct NewUserArgs {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Open the account store named by the environment, or by `data_dir`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the directory cannot
/// be created.
pub fn open_repository(data_dir: Option<PathBuf>) -> Result<UserRepository, UsersError> {
    let config = StorefrontConfig::from_env()?;
    let data_dir = data_dir.unwrap_or(config.data_dir);

    tracing::debug!(dir = %data_dir.display(), "Opening account store");
    let store = FileStore::open(data_dir)?;
    let credentials = CredentialService::new(config.password_cost)?;

    Ok(UserRepository::new(Arc::new(store), credentials))
}

/// One line per user: id, full name, email.
///
/// # Errors
///
/// Returns an error if the store cannot be read or is corrupted.
pub fn list(repository: &UserRepository) -> Result<Vec<String>, UsersError> {
    let users = repository.list_users()?;
    tracing::info!(count = users.len(), "Listed users");

    Ok(users
        .iter()
        .map(|user| format!("{}\t{}\t{}", user.id, user.full_name(), user.email))
        .collect())
}

/// Create a user, validated exactly like signup.
///
/// # Errors
///
/// Returns `UsersError::Invalid` listing every failing field, or
/// `UsersError::UserExists` if the email is taken.
pub fn create(repository: &UserRepository, args: NewUserArgs) -> Result<UserRecord, UsersError> {
    let form = SignupForm {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        phone_number: args.phone,
        confirm_password: SecretString::from(args.password.clone()),
        password: SecretString::from(args.password),
    };

    let new_user = form.validate().map_err(UsersError::Invalid)?;
    let email = new_user.email.to_string();

    let user = repository
        .create_user(new_user, &form.password)
        .map_err(|e| match e {
            RepositoryError::DuplicateEmail => UsersError::UserExists(email),
            other => UsersError::Repository(other),
        })?;

    tracing::info!(user_id = %user.id, "Created user");
    Ok(user)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketstall_storefront::config::PasswordCost;

    use super::*;

    fn repository(dir: &std::path::Path) -> UserRepository {
        let credentials = CredentialService::new(PasswordCost::minimal()).unwrap();
        UserRepository::new(Arc::new(FileStore::open(dir).unwrap()), credentials)
    }

    fn jon() -> NewUserArgs {
        NewUserArgs {
            first_name: "Jon".to_string(),
            last_name: "Snow".to_string(),
            email: "Jon@Wall.com".to_string(),
            phone: "9998887771".to_string(),
            password: "Abcd123!".to_string(),
        }
    }

    #[test]
    fn test_create_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let repository = repository(dir.path());

        let user = create(&repository, jon()).unwrap();
        assert_eq!(user.email.as_str(), "jon@wall.com");

        let lines = list(&repository).unwrap();
        assert_eq!(lines, vec![format!("{}\tJon Snow\tjon@wall.com", user.id)]);
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let repository = repository(dir.path());

        let mut args = jon();
        args.phone = "123".to_string();
        args.password = "weak".to_string();

        let Err(UsersError::Invalid(errors)) = create(&repository, args) else {
            panic!("expected validation failure");
        };
        assert!(errors.get("phoneNumber").is_some());
        assert!(errors.get("password").is_some());
        assert!(list(&repository).unwrap().is_empty());
    }

    #[test]
    fn test_create_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let repository = repository(dir.path());
        create(&repository, jon()).unwrap();

        let result = create(&repository, jon());
        assert!(matches!(result, Err(UsersError::UserExists(email)) if email == "jon@wall.com"));
    }
}
