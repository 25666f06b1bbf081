//! DSCommerce Core - Shared domain types library.
//!
//! This crate provides the types shared by every DSCommerce component:
//! - `api` - REST backend for the catalog and order workflows
//! - `cli` - Command-line tools for migrations, seeding, and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Authorization decisions live here so they can be tested
//! without a web layer.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, roles, and order statuses
//! - [`authz`] - The authenticated principal and ownership checks

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod authz;
pub mod types;

pub use authz::{AccessDenied, Principal, ensure_self_or_admin, is_self_or_admin};
pub use types::*;
