//! `mizan-core`: shared identifiers and the domain error model.
//!
//! This crate contains **pure** primitives (no IO, no HTTP).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{StaffRoleId, TenantSlug, UserId};
