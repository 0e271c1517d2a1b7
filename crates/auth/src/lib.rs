//! `mizan-auth`: pure client-side authorization model.
//!
//! This crate is intentionally decoupled from HTTP and storage: it only knows
//! how a resolved permission map answers capability checks.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod tokens;

pub use authorize::{AuthorizationExplanation, DenialKind, explain, has_permission};
pub use permissions::{AccessLevel, Module, ParseAccessLevelError, ParseModuleError, PermissionMap};
pub use principal::Profile;
pub use roles::{StaffEntry, StaffRole, find_staff_entry};
pub use tokens::{AccessToken, Credentials, TokenPair};
