//! `mizan-client`
//!
//! **Responsibility:** Authenticated client for the DigitalJamath backend.
//!
//! This crate provides:
//! - API origin resolution (env override, loopback, same-origin)
//! - Bearer token storage and the authenticated fetch wrapper
//! - The permission session (profile -> staff entry -> role)
//! - Page-level list views for the dashboard and member portal
//!
//! The backend remains the authority; nothing here is persisted beyond the
//! two bearer tokens.

pub mod config;
pub mod http;
pub mod origin;
pub mod session;
pub mod token_store;
pub mod types;
pub mod views;

pub use config::ClientConfig;
pub use http::{ApiClient, ClientError};
pub use origin::{PageLocation, resolve_api_origin, tenant_from_hostname};
pub use session::{AuthorizationSource, PermissionSession, Resolution, resolve_permissions};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError};
pub use views::{ListResource, ListSource, ListView, ViewState};
