//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::{CatalogClient, CatalogError};
use crate::config::StorefrontConfig;
use crate::db::{KeyValueStore, UserRepository};
use crate::services::auth::{AuthService, CredentialError, CredentialService};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("credential service: {0}")]
    Credentials(#[from] CredentialError),
    #[error("catalog client: {0}")]
    Catalog(#[from] CatalogError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the account store, the credential service, and the catalog client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    users: UserRepository,
    credentials: CredentialService,
    catalog: CatalogClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `store` - Durable storage backing the account store
    ///
    /// # Errors
    ///
    /// Returns an error if the password cost is rejected or the HTTP client
    /// cannot be built.
    pub fn new(config: StorefrontConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, StateError> {
        let credentials = CredentialService::new(config.password_cost)?;
        let users = UserRepository::new(store, credentials.clone());
        let catalog = CatalogClient::new(&config.catalog)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                users,
                credentials,
                catalog,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the account store.
    #[must_use]
    pub fn users(&self) -> &UserRepository {
        &self.inner.users
    }

    /// Get a reference to the remote catalog client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Authentication flows over the shared account store.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.inner.users, &self.inner.credentials)
    }
}
