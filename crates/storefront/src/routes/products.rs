//! Product route handlers.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use marketstall_core::ProductId;

use crate::catalog::CatalogCache;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::ProductSummary;
use crate::services::SessionHolder;
use crate::state::AppState;

/// Product list payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListView {
    pub products: Vec<ProductSummary>,
    /// Why the list is empty, when the catalog could not be reached.
    pub error: Option<String>,
    pub from_cache: bool,
}

/// Query of the product detail page.
#[derive(Debug, Deserialize)]
pub struct ViewProductQuery {
    pub id: Option<String>,
}

/// The product list, cached for the session.
///
/// A catalog failure still answers 200 with an empty list and the error.
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>, session: SessionHolder) -> Json<ProductListView> {
    let catalog = CatalogCache::new(state.catalog(), session.session());
    let list = catalog
        .get_product_list(state.config().catalog.page())
        .await;

    Json(ProductListView {
        products: list.products,
        error: list.error.map(|_| "Failed to load products. Please try again later.".to_string()),
        from_cache: list.from_cache,
    })
}

/// One product's detail. Without an `id` the client is sent to the list.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: SessionHolder,
    Query(query): Query<ViewProductQuery>,
) -> Result<Response> {
    let Some(raw_id) = query.id.filter(|id| !id.trim().is_empty()) else {
        return Ok(Redirect::to("/products").into_response());
    };

    let id: ProductId = raw_id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid product id".to_string()))?;

    add_breadcrumb("navigation", "Viewed product page", Some(&[("product_id", raw_id.as_str())]));

    let product = CatalogCache::new(state.catalog(), session.session())
        .get_product(id)
        .await?;

    Ok(Json(product).into_response())
}
