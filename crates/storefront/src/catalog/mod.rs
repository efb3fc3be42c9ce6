//! Remote product catalog.
//!
//! # Architecture
//!
//! - [`CatalogClient`] talks to the catalog over HTTP (`reqwest`) and keeps
//!   product details in a short-lived `moka` cache shared by all sessions
//! - [`CatalogCache`] sits in front of the client for one session: the
//!   product list is fetched once and then served from the session
//!
//! # Example
//!
//! ```rust,ignore
//! let client = CatalogClient::new(&config.catalog)?;
//! let catalog = CatalogCache::new(&client, &session);
//!
//! let list = catalog.get_product_list(config.catalog.page()).await;
//! let product = catalog.get_product(ProductId::new(1)).await?;
//! ```

mod cache;
mod client;

pub use cache::{CatalogCache, ProductList};
pub use client::CatalogClient;

use thiserror::Error;

use marketstall_core::ProductId;

/// Errors that can occur when talking to the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog answered with a non-success status.
    #[error("catalog returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// No product has that ID.
    #[error("product {0} not found")]
    NotFound(ProductId),
}
