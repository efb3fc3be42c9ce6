//! User repository (the account store).
//!
//! All accounts live in one JSON array under the `users` key. Reads load the
//! whole array; every mutation loads it, changes it, and writes the whole
//! array back. Mutations are serialized through `write_lock` so concurrent
//! requests cannot lose each other's updates.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use secrecy::SecretString;

use marketstall_core::{Email, UserId};

use super::{KeyValueStore, RepositoryError};
use crate::models::user::{NewUser, UserPatch, UserRecord};
use crate::services::auth::CredentialService;

/// Storage key of the user list.
pub const USERS_KEY: &str = "users";

/// Repository for registered accounts.
pub struct UserRepository {
    store: Arc<dyn KeyValueStore>,
    credentials: CredentialService,
    write_lock: Mutex<()>,
}

impl UserRepository {
    /// Create a repository over `store`, hashing new passwords with `credentials`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, credentials: CredentialService) -> Self {
        Self {
            store,
            credentials,
            write_lock: Mutex::new(()),
        }
    }

    /// All registered users, in insertion order.
    ///
    /// A store that has never been written yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the store cannot be read.
    /// Returns `RepositoryError::DataCorruption` if the document is not a valid user list.
    pub fn list_users(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        let Some(document) = self.store.read(USERS_KEY)? else {
            return Ok(Vec::new());
        };

        if document.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&document)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid users document: {e}")))
    }

    /// Whether any user other than `excluding` has `email`, ignoring case.
    ///
    /// # Errors
    ///
    /// Same as [`list_users`](Self::list_users).
    pub fn email_exists(
        &self,
        email: &Email,
        excluding: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        let users = self.list_users()?;
        Ok(email_taken(&users, email, excluding))
    }

    /// Find a user by email, ignoring case.
    ///
    /// # Errors
    ///
    /// Same as [`list_users`](Self::list_users).
    pub fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, RepositoryError> {
        Ok(self
            .list_users()?
            .into_iter()
            .find(|user| user.email.matches(email)))
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Same as [`list_users`](Self::list_users).
    pub fn get_by_id(&self, id: UserId) -> Result<Option<UserRecord>, RepositoryError> {
        Ok(self.list_users()?.into_iter().find(|user| user.id == id))
    }

    /// Register a new user.
    ///
    /// Hashes `password`, assigns a fresh ID, appends the record and persists
    /// the whole list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DuplicateEmail` if the email is already registered.
    /// Returns `RepositoryError::Credential` if hashing fails.
    /// Returns `RepositoryError::Io` or `Serialization` if persisting fails.
    pub fn create_user(
        &self,
        new_user: NewUser,
        password: &SecretString,
    ) -> Result<UserRecord, RepositoryError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut users = self.list_users()?;
        if email_taken(&users, &new_user.email, None) {
            return Err(RepositoryError::DuplicateEmail);
        }

        let password_hash = self.credentials.hash(password)?;

        let user = UserRecord {
            id: UserId::generate(),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            phone_number: new_user.phone_number,
            password_hash,
            created_at: Utc::now(),
        };

        users.push(user.clone());
        self.persist(&users)?;

        tracing::info!(user_id = %user.id, total_users = users.len(), "Created user");
        Ok(user)
    }

    /// Apply `patch` to the user with `id` and persist the whole list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has that ID.
    /// Returns `RepositoryError::DuplicateEmail` if the patched email belongs to another user.
    /// Returns `RepositoryError::Io` or `Serialization` if persisting fails.
    pub fn update_user(&self, id: UserId, patch: &UserPatch) -> Result<UserRecord, RepositoryError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut users = self.list_users()?;

        if let Some(email) = &patch.email
            && email_taken(&users, email, Some(id))
        {
            return Err(RepositoryError::DuplicateEmail);
        }

        let user = users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if patch.is_empty() {
            return Ok(user.clone());
        }
        patch.apply(user);
        let updated = user.clone();

        self.persist(&users)?;

        tracing::info!(
            user_id = %id,
            email_changed = patch.email.is_some(),
            password_changed = patch.password_hash.is_some(),
            "Updated user"
        );
        Ok(updated)
    }

    fn persist(&self, users: &[UserRecord]) -> Result<(), RepositoryError> {
        let document = serde_json::to_string(users)?;
        self.store.write(USERS_KEY, &document)
    }
}

fn email_taken(users: &[UserRecord], email: &Email, excluding: Option<UserId>) -> bool {
    users
        .iter()
        .any(|user| Some(user.id) != excluding && user.email.matches(email))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketstall_core::{PersonName, PhoneNumber};

    use super::*;
    use crate::config::PasswordCost;
    use crate::db::{FileStore, MemoryStore};

    fn repository(store: Arc<dyn KeyValueStore>) -> UserRepository {
        let credentials = CredentialService::new(PasswordCost::minimal()).unwrap();
        UserRepository::new(store, credentials)
    }

    fn memory_repository() -> (Arc<MemoryStore>, UserRepository) {
        let store = Arc::new(MemoryStore::new());
        let repo = repository(store.clone());
        (store, repo)
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: PersonName::parse("Jon").unwrap(),
            last_name: PersonName::parse("Snow").unwrap(),
            email: Email::parse(email).unwrap(),
            phone_number: PhoneNumber::parse("9998887771").unwrap(),
        }
    }

    fn password() -> SecretString {
        SecretString::from("Abcd123!")
    }

    #[test]
    fn test_list_users_empty_without_document() {
        let (_, repo) = memory_repository();
        assert!(repo.list_users().unwrap().is_empty());
    }

    #[test]
    fn test_create_user_persists_hashed_record() {
        let (store, repo) = memory_repository();

        let user = repo.create_user(new_user("jon@wall.com"), &password()).unwrap();

        assert_ne!(user.password_hash, "Abcd123!");
        assert!(user.password_hash.starts_with("$argon2id$"));

        let document = store.read(USERS_KEY).unwrap().unwrap();
        assert!(!document.contains("Abcd123!"));

        let users = repo.list_users().unwrap();
        assert_eq!(users, vec![user]);
    }

    #[test]
    fn test_email_exists_ignores_case() {
        let (_, repo) = memory_repository();
        repo.create_user(new_user("jon@wall.com"), &password()).unwrap();

        let exact = Email::parse("jon@wall.com").unwrap();
        let shouted = Email::parse("JON@WALL.COM").unwrap();
        let other = Email::parse("arya@winterfell.com").unwrap();

        assert!(repo.email_exists(&exact, None).unwrap());
        assert!(repo.email_exists(&shouted, None).unwrap());
        assert!(!repo.email_exists(&other, None).unwrap());
    }

    #[test]
    fn test_email_exists_excluding_self() {
        let (_, repo) = memory_repository();
        let user = repo.create_user(new_user("jon@wall.com"), &password()).unwrap();

        let email = Email::parse("Jon@Wall.com").unwrap();
        assert!(!repo.email_exists(&email, Some(user.id)).unwrap());
        assert!(repo.email_exists(&email, Some(UserId::generate())).unwrap());
    }

    #[test]
    fn test_create_user_rejects_duplicate_email_any_case() {
        let (_, repo) = memory_repository();
        repo.create_user(new_user("jon@wall.com"), &password()).unwrap();

        let err = repo
            .create_user(new_user("JON@wall.com"), &password())
            .unwrap_err();

        assert!(matches!(err, RepositoryError::DuplicateEmail));
        assert_eq!(repo.list_users().unwrap().len(), 1);
    }

    #[test]
    fn test_created_ids_are_distinct() {
        let (_, repo) = memory_repository();
        let a = repo.create_user(new_user("a@wall.com"), &password()).unwrap();
        let b = repo.create_user(new_user("b@wall.com"), &password()).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(repo.list_users().unwrap().len(), 2);
    }

    #[test]
    fn test_find_by_email_and_id() {
        let (_, repo) = memory_repository();
        let user = repo.create_user(new_user("jon@wall.com"), &password()).unwrap();

        let found = repo
            .find_by_email(&Email::parse("JON@wall.com").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);

        assert_eq!(repo.get_by_id(user.id).unwrap(), Some(user));
        assert_eq!(repo.get_by_id(UserId::generate()).unwrap(), None);
    }

    #[test]
    fn test_update_user_email() {
        let (_, repo) = memory_repository();
        let user = repo.create_user(new_user("jon@wall.com"), &password()).unwrap();

        let new_email = Email::parse("king@north.com").unwrap();
        let updated = repo
            .update_user(user.id, &UserPatch::email(new_email.clone()))
            .unwrap();

        assert_eq!(updated.email, new_email);
        assert_eq!(updated.password_hash, user.password_hash);
        assert_eq!(repo.get_by_id(user.id).unwrap().unwrap().email, new_email);
    }

    #[test]
    fn test_update_user_to_own_email_in_other_case() {
        let (_, repo) = memory_repository();
        let user = repo.create_user(new_user("jon@wall.com"), &password()).unwrap();

        let updated = repo
            .update_user(user.id, &UserPatch::email(Email::parse("Jon@Wall.com").unwrap()))
            .unwrap();
        assert_eq!(updated.email.as_str(), "Jon@Wall.com");
    }

    #[test]
    fn test_update_user_empty_patch_leaves_store_untouched() {
        let (store, repo) = memory_repository();
        let user = repo.create_user(new_user("jon@wall.com"), &password()).unwrap();

        let pretty = serde_json::to_string_pretty(&repo.list_users().unwrap()).unwrap();
        store.write(USERS_KEY, &pretty).unwrap();

        let unchanged = repo.update_user(user.id, &UserPatch::default()).unwrap();
        assert_eq!(unchanged, user);
        assert_eq!(store.read(USERS_KEY).unwrap().unwrap(), pretty);
    }

    #[test]
    fn test_update_user_not_found() {
        let (_, repo) = memory_repository();
        repo.create_user(new_user("jon@wall.com"), &password()).unwrap();

        let err = repo
            .update_user(UserId::generate(), &UserPatch::password_hash("x".to_string()))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[test]
    fn test_update_user_rejects_email_of_other_user() {
        let (_, repo) = memory_repository();
        repo.create_user(new_user("jon@wall.com"), &password()).unwrap();
        let arya = repo.create_user(new_user("arya@wall.com"), &password()).unwrap();

        let err = repo
            .update_user(arya.id, &UserPatch::email(Email::parse("JON@wall.com").unwrap()))
            .unwrap_err();

        assert!(matches!(err, RepositoryError::DuplicateEmail));
        assert_eq!(repo.get_by_id(arya.id).unwrap().unwrap().email.as_str(), "arya@wall.com");
    }

    #[test]
    fn test_corrupted_document() {
        let (store, repo) = memory_repository();
        store.write(USERS_KEY, "{not json").unwrap();

        let err = repo.list_users().unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[test]
    fn test_invalid_record_is_corruption() {
        let (store, repo) = memory_repository();
        store
            .write(
                USERS_KEY,
                r#"[{"id":"6f1c1c51-8c3c-4bb4-9d55-7f3f0f1f9a10","firstName":"J","lastName":"Snow","email":"jon@wall.com","phoneNumber":"9998887771","passwordHash":"x","createdAt":"2024-01-01T00:00:00Z"}]"#,
            )
            .unwrap();

        assert!(matches!(
            repo.list_users().unwrap_err(),
            RepositoryError::DataCorruption(_)
        ));
    }

    #[test]
    fn test_file_backed_repository_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let user = {
            let repo = repository(Arc::new(FileStore::open(dir.path()).unwrap()));
            repo.create_user(new_user("jon@wall.com"), &password()).unwrap()
        };

        let reopened = repository(Arc::new(FileStore::open(dir.path()).unwrap()));
        assert_eq!(reopened.list_users().unwrap(), vec![user]);
    }
}
