//! Session-scoped product list cache.

use tower_sessions::Session;
use tracing::{debug, instrument};

use marketstall_core::ProductId;

use super::{CatalogClient, CatalogError};
use crate::models::{PageParams, ProductDetail, ProductSummary, session_keys};

/// Outcome of a product list read.
///
/// A failed fetch still yields a list (empty) so the page can render, with
/// the error alongside for display.
#[derive(Debug)]
pub struct ProductList {
    pub products: Vec<ProductSummary>,
    pub error: Option<CatalogError>,
    /// Whether the list came from the session rather than the network.
    pub from_cache: bool,
}

/// Catalog access for one session.
///
/// The first successful list fetch is stored in the session under
/// `cached_products`; later reads in the same session never hit the network.
/// Failures are not stored, so the next read tries again.
pub struct CatalogCache<'a> {
    client: &'a CatalogClient,
    session: &'a Session,
}

impl<'a> CatalogCache<'a> {
    #[must_use]
    pub const fn new(client: &'a CatalogClient, session: &'a Session) -> Self {
        Self { client, session }
    }

    /// The product list, from the session when present.
    ///
    /// Session store failures degrade to a network fetch (on read) or to an
    /// uncached result (on write).
    #[instrument(skip(self))]
    pub async fn get_product_list(&self, page: PageParams) -> ProductList {
        match self
            .session
            .get::<Vec<ProductSummary>>(session_keys::CACHED_PRODUCTS)
            .await
        {
            Ok(Some(products)) => {
                debug!(count = products.len(), "Cache hit for product list");
                return ProductList {
                    products,
                    error: None,
                    from_cache: true,
                };
            }
            Ok(None) => debug!("Cache miss for product list"),
            Err(e) => tracing::warn!(error = %e, "Failed to read cached product list"),
        }

        match self.client.fetch_products(page).await {
            Ok(products) => {
                if let Err(e) = self
                    .session
                    .insert(session_keys::CACHED_PRODUCTS, &products)
                    .await
                {
                    tracing::warn!(error = %e, "Failed to cache product list in session");
                }
                ProductList {
                    products,
                    error: None,
                    from_cache: false,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Product list unavailable");
                ProductList {
                    products: Vec::new(),
                    error: Some(e),
                    from_cache: false,
                }
            }
        }
    }

    /// One product's detail. Not session-scoped.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown ID, or another
    /// `CatalogError` if the fetch fails.
    pub async fn get_product(&self, id: ProductId) -> Result<ProductDetail, CatalogError> {
        self.client.get_product(id).await
    }
}
