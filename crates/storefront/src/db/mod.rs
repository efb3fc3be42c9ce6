//! Durable storage for the storefront.
//!
//! # Layout
//!
//! Storage is a flat key-value space of JSON documents. Each key holds one
//! whole document that is read and rewritten as a unit:
//!
//! - `users` - JSON array of every registered account
//!
//! [`kv::FileStore`] keeps one file per key under `STOREFRONT_DATA_DIR`;
//! [`kv::MemoryStore`] backs tests and ephemeral runs.

pub mod kv;
pub mod users;

pub use kv::{FileStore, MemoryStore};
pub use users::UserRepository;

use crate::services::auth::CredentialError;

/// Errors from the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Reading or writing the backing files failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data is malformed or fails validation.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Another account already uses the email (ignoring case).
    #[error("email already registered")]
    DuplicateEmail,

    /// Hashing a password for a new record failed.
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),
}

/// A key-value store of whole JSON documents.
///
/// Implementations must make [`write`](KeyValueStore::write) all-or-nothing:
/// a concurrent or later [`read`](KeyValueStore::read) sees either the old
/// document or the new one, never a mix.
pub trait KeyValueStore: Send + Sync {
    /// Read the document under `key`, or `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the backing storage cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, RepositoryError>;

    /// Replace the document under `key`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the backing storage cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), RepositoryError>;
}
