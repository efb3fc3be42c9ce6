//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Signup, login, logout and profile edits; password hashing
//! - `session` - The logged-in user held in the request's session

pub mod auth;
pub mod session;

pub use session::{SessionError, SessionHolder};
