//! HTTP client for the remote catalog.

use std::sync::Arc;

use moka::future::Cache;
use serde::Deserialize;
use tracing::{debug, instrument};

use marketstall_core::ProductId;

use super::CatalogError;
use crate::config::CatalogConfig;
use crate::models::{PageParams, ProductDetail, ProductSummary};

/// Body of `GET /products`.
#[derive(Debug, Deserialize)]
struct ProductPage {
    products: Vec<ProductSummary>,
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the remote product catalog.
///
/// Product details are cached for `CATALOG_DETAIL_CACHE_SECS`; the product
/// list is never cached here (see [`super::CatalogCache`]).
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    root: String,
    details: Option<Cache<ProductId, ProductDetail>>,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("root", &self.inner.root)
            .field("detail_cache", &self.inner.details.is_some())
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Http` if the HTTP client cannot be built.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let details = (!config.detail_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(config.detail_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client: builder.build()?,
                root: config.root().to_string(),
                details,
            }),
        })
    }

    /// GET `url`, returning the status and body whatever the status.
    async fn get_text(&self, url: &str) -> Result<(reqwest::StatusCode, String), CatalogError> {
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok((status, body))
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Fetch one page of product summaries.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the catalog answers with a
    /// non-success status, or the body does not parse.
    #[instrument(skip(self), fields(skip = page.skip, limit = page.limit))]
    pub async fn fetch_products(
        &self,
        page: PageParams,
    ) -> Result<Vec<ProductSummary>, CatalogError> {
        let url = format!(
            "{}/products?skip={}&limit={}",
            self.inner.root, page.skip, page.limit
        );

        let (status, body) = self.get_text(&url).await?;
        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(200).collect::<String>(),
                "Catalog returned non-success status for product list"
            );
            return Err(CatalogError::Status(status));
        }

        let page: ProductPage = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse product list");
            CatalogError::Parse(e)
        })?;

        debug!(count = page.products.len(), "Fetched product list");
        Ok(page.products)
    }

    /// Fetch the full record of one product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the catalog answers 404, and
    /// another `CatalogError` for any other failure.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<ProductDetail, CatalogError> {
        if let Some(details) = &self.inner.details
            && let Some(product) = details.get(&id).await
        {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let url = format!("{}/products/{id}", self.inner.root);
        let (status, body) = self.get_text(&url).await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("Product not found");
            return Err(CatalogError::NotFound(id));
        }
        if !status.is_success() {
            tracing::error!(status = %status, "Catalog returned non-success status for product");
            return Err(CatalogError::Status(status));
        }

        let product: ProductDetail = serde_json::from_str(&body)?;

        if let Some(details) = &self.inner.details {
            details.insert(id, product.clone()).await;
        }

        Ok(product)
    }
}
