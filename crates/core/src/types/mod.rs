//! Core types for Marketstall.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod name;
pub mod phone;
pub mod price;

pub use email::{Email, EmailError};
pub use id::{ProductId, ProductIdError, UserId};
pub use name::{NameError, PersonName};
pub use phone::{PhoneNumber, PhoneNumberError};
pub use price::Price;
