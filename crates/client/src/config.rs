//! Client configuration from the process environment.

use std::path::PathBuf;

use mizan_core::{DomainError, TenantSlug};

use crate::origin::{PageLocation, resolve_api_origin, tenant_from_hostname};
use crate::token_store::{FileTokenStore, TokenStoreError};

/// Explicit API origin override.
pub const ENV_API_URL: &str = "MIZAN_API_URL";
/// URL of the page the client runs at (stands in for the browser location).
pub const ENV_PAGE_ORIGIN: &str = "MIZAN_PAGE_ORIGIN";
/// Path of the token file.
pub const ENV_TOKEN_FILE: &str = "MIZAN_TOKEN_FILE";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url_override: Option<String>,
    pub page_location: Option<PageLocation>,
    pub token_file: Option<PathBuf>,
}

impl ClientConfig {
    /// Read configuration from `MIZAN_*` environment variables.
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let page_location = get(ENV_PAGE_ORIGIN)
            .map(|raw| PageLocation::parse(&raw))
            .transpose()?;

        Ok(Self {
            api_url_override: get(ENV_API_URL),
            page_location,
            token_file: get(ENV_TOKEN_FILE).map(PathBuf::from),
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url_override = Some(api_url.into());
        self
    }

    pub fn with_page_location(mut self, location: PageLocation) -> Self {
        self.page_location = Some(location);
        self
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    pub fn api_origin(&self) -> String {
        resolve_api_origin(self.api_url_override.as_deref(), self.page_location.as_ref())
    }

    pub fn tenant(&self) -> Option<TenantSlug> {
        self.page_location
            .as_ref()
            .and_then(|loc| tenant_from_hostname(loc.hostname()))
    }

    /// File-backed token store at the configured path, or the platform default.
    pub fn token_store(&self) -> Result<FileTokenStore, TokenStoreError> {
        match &self.token_file {
            Some(path) => Ok(FileTokenStore::new(path.clone())),
            None => FileTokenStore::at_default_path(),
        }
    }
}
