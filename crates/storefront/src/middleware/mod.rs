//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with `request_id` and `user_id` fields)
//! 3. Request ID (reuse or generate `x-request-id`)
//! 4. Session layer (tower-sessions with the in-memory store)
//!
//! The [`auth`] extractors read the session the last layer attaches;
//! [`json::JsonBody`] turns body rejections into [`crate::error::AppError`].

pub mod auth;
pub mod json;
pub mod request_id;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth};
pub use json::JsonBody;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{ExpiringMemoryStore, SESSION_COOKIE_NAME, create_session_layer};
