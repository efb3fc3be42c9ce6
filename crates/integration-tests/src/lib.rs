//! Integration tests for Marketstall.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketstall-integration-tests
//! ```
//!
//! Every test starts its own storefront on an ephemeral port, backed by an
//! in-memory account store and an in-process fake of the remote catalog, so
//! tests need no network and no shared state.
//!
//! # Test Categories
//!
//! - `account_flows` - Signup, login, logout and profile edits over HTTP
//! - `catalog` - Product list caching and product detail

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::get;
use serde_json::{Value, json};

use marketstall_storefront::config::StorefrontConfig;
use marketstall_storefront::db::{KeyValueStore, MemoryStore};
use marketstall_storefront::routes;
use marketstall_storefront::state::AppState;

// =============================================================================
// Fake catalog
// =============================================================================

/// A running stand-in for the remote catalog.
pub struct FakeCatalog {
    pub root: String,
    list_hits: Arc<AtomicUsize>,
    detail_hits: Arc<AtomicUsize>,
}

impl FakeCatalog {
    /// Start a fake with products 1 to 100. With `failing_list` the list
    /// endpoint answers 503.
    pub async fn spawn(failing_list: bool) -> Self {
        let list_hits = Arc::new(AtomicUsize::new(0));
        let detail_hits = Arc::new(AtomicUsize::new(0));

        let list_counter = Arc::clone(&list_hits);
        let detail_counter = Arc::clone(&detail_hits);

        let app = Router::new()
            .route(
                "/products",
                get(move |Query(params): Query<HashMap<String, u32>>| {
                    let hits = Arc::clone(&list_counter);
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        if failing_list {
                            return Err(StatusCode::SERVICE_UNAVAILABLE);
                        }
                        let skip = params.get("skip").copied().unwrap_or(0);
                        let limit = params.get("limit").copied().unwrap_or(30);
                        let products: Vec<Value> = (skip + 1..=skip + limit)
                            .map(|id| {
                                json!({
                                    "id": id,
                                    "title": format!("Product {id}"),
                                    "price": 19.99,
                                    "rating": 4.1,
                                    "stock": 3,
                                    "category": "groceries",
                                    "thumbnail": format!("https://cdn.example.com/{id}.png"),
                                })
                            })
                            .collect();
                        Ok(Json(json!({
                            "products": products,
                            "total": 100,
                            "skip": skip,
                            "limit": limit,
                        })))
                    }
                }),
            )
            .route(
                "/products/{id}",
                get(move |Path(id): Path<u32>| {
                    let hits = Arc::clone(&detail_counter);
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        if !(1..=100).contains(&id) {
                            return Err(StatusCode::NOT_FOUND);
                        }
                        Ok(Json(json!({
                            "id": id,
                            "title": format!("Product {id}"),
                            "description": "Fresh from the market.",
                            "price": 19.99,
                            "discountPercentage": 5.0,
                            "rating": 4.1,
                            "stock": 3,
                            "tags": ["groceries"],
                            "images": [format!("https://cdn.example.com/{id}/1.png")],
                            "thumbnail": format!("https://cdn.example.com/{id}.png"),
                        })))
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            root: format!("http://{addr}"),
            list_hits,
            detail_hits,
        }
    }

    /// Number of product list requests served.
    pub fn list_hits(&self) -> usize {
        self.list_hits.load(Ordering::SeqCst)
    }

    /// Number of product detail requests served.
    pub fn detail_hits(&self) -> usize {
        self.detail_hits.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Test context
// =============================================================================

/// A running storefront plus the fake catalog it talks to.
pub struct TestContext {
    pub base_url: String,
    pub catalog: FakeCatalog,
    pub store: Arc<dyn KeyValueStore>,
}

impl TestContext {
    /// Storefront with a healthy catalog and an empty account store.
    pub async fn new() -> Self {
        let catalog = FakeCatalog::spawn(false).await;
        Self::start(catalog, Arc::new(MemoryStore::new())).await
    }

    /// Storefront whose catalog fails every list request.
    pub async fn with_failing_catalog() -> Self {
        let catalog = FakeCatalog::spawn(true).await;
        Self::start(catalog, Arc::new(MemoryStore::new())).await
    }

    /// A fresh storefront over the same account store and catalog, as after
    /// a restart: accounts survive, sessions do not.
    pub async fn restart(self) -> Self {
        Self::start(self.catalog, self.store).await
    }

    async fn start(catalog: FakeCatalog, store: Arc<dyn KeyValueStore>) -> Self {
        let vars = HashMap::from([
            ("CATALOG_BASE_URL", catalog.root.clone()),
            ("PASSWORD_HASH_MEMORY_KIB", "8".to_string()),
            ("PASSWORD_HASH_ITERATIONS", "1".to_string()),
            ("PASSWORD_HASH_PARALLELISM", "1".to_string()),
        ]);
        let config = StorefrontConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let state = AppState::new(config, Arc::clone(&store)).unwrap();
        let app = routes::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            catalog,
            store,
        }
    }

    /// A browser: its own cookie jar, redirects not followed.
    pub fn browser(&self) -> Browser {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Browser {
            client,
            base_url: self.base_url.clone(),
        }
    }
}

/// One client session against the storefront.
pub struct Browser {
    client: reqwest::Client,
    base_url: String,
}

impl Browser {
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .unwrap()
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .unwrap()
    }

    /// GET `path` and decode the JSON body along with the status.
    pub async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let response = self.get(path).await;
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        (status, response.json().await.unwrap())
    }

    /// POST `body` to `path` and decode the JSON reply along with the status.
    pub async fn post_json(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let response = self.post(path, body).await;
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        (status, response.json().await.unwrap())
    }

    /// The landing page greeting.
    pub async fn greeting(&self) -> String {
        let (_, body) = self.get_json("/").await;
        body["greeting"].as_str().unwrap().to_string()
    }
}

/// Signup payload for Jon Snow.
pub fn jon_snow() -> Value {
    json!({
        "firstName": "Jon",
        "lastName": "Snow",
        "email": "jon@wall.com",
        "phoneNumber": "9998887771",
        "password": "Abcd123!",
        "confirmPassword": "Abcd123!",
    })
}
