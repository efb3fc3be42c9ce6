//! Domain models for storefront.
//!
//! - [`user`] - Registered accounts as held by the account store
//! - [`session`] - Session keys and the authentication state
//! - [`product`] - Catalog payloads (summary and detail)

pub mod product;
pub mod session;
pub mod user;

pub use product::{PageParams, ProductDetail, ProductSummary};
pub use session::{SessionState, keys as session_keys};
pub use user::{NewUser, ProfileView, UserPatch, UserRecord};
