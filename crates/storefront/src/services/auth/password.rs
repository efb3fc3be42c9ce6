//! Password hashing and verification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::config::PasswordCost;

/// Errors from the credential service.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The configured cost parameters are outside what Argon2 accepts.
    #[error("invalid password hashing parameters: {0}")]
    Params(argon2::Error),

    /// Hashing itself failed.
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
}

/// One-way salted password hashing with Argon2id.
///
/// Hashes are PHC strings that carry their own salt and parameters, so a hash
/// produced under one [`PasswordCost`] still verifies after the cost changes.
#[derive(Clone)]
pub struct CredentialService {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("params", self.argon2.params())
            .finish()
    }
}

impl CredentialService {
    /// Create a service hashing with the given work factor.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Params` if Argon2 rejects the parameters
    /// (for example memory below 8 KiB per lane).
    pub fn new(cost: PasswordCost) -> Result<Self, CredentialError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(CredentialError::Params)?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Hash` if Argon2 fails.
    pub fn hash(&self, password: &SecretString) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(CredentialError::Hash)
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// A hash that does not parse never verifies.
    #[must_use]
    pub fn verify(&self, password: &SecretString, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        self.argon2
            .verify_password(password.expose_secret().as_bytes(), &parsed_hash)
            .is_ok()
    }
}
