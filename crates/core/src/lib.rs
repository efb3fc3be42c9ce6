//! Marketstall Core - Shared domain types.
//!
//! This crate provides the validated types used across all Marketstall
//! components:
//! - `storefront` - Account, session, and catalog service
//! - `cli` - Command-line tools for managing stored accounts
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no HTTP
//! clients. Every type here is constructed through a validating `parse`
//! function, and deserialization goes through the same function, so a value
//! that exists is a value that passed validation.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, names, and phone numbers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
