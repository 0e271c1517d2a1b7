//! Backend origin resolution.
//!
//! Priority: explicit override, then loopback development hosts, then the
//! page's own origin (the API is reverse-proxied next to the front-end).

use reqwest::Url;

use mizan_core::{DomainError, TenantSlug};

/// Hostnames treated as a local development machine.
pub const LOOPBACK_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// Port of the development API server on loopback hosts.
pub const LOCAL_API_PORT: u16 = 8000;

/// The location the client is considered to be running at (the browser's
/// `window.location` equivalent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    url: Url,
}

impl PageLocation {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let url = Url::parse(raw.trim())
            .map_err(|e| DomainError::validation(format!("page location '{raw}': {e}")))?;
        Ok(Self { url })
    }

    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// `scheme://host[:port]`, without a trailing slash. Empty for opaque
    /// origins such as `file:` URLs.
    pub fn origin(&self) -> String {
        let origin = self.url.origin();
        if origin.is_tuple() {
            origin.ascii_serialization()
        } else {
            String::new()
        }
    }

    pub fn is_loopback(&self) -> bool {
        LOOPBACK_HOSTS.contains(&self.hostname())
    }
}

/// Resolve the API origin for the current environment.
///
/// Never fails: with neither an override nor a location it returns `""`,
/// which makes every request path relative.
pub fn resolve_api_origin(api_url_override: Option<&str>, location: Option<&PageLocation>) -> String {
    if let Some(url) = api_url_override.filter(|u| !u.trim().is_empty()) {
        return url.to_string();
    }

    match location {
        Some(loc) if loc.is_loopback() => format!("http://{}:{}", loc.hostname(), LOCAL_API_PORT),
        Some(loc) => loc.origin(),
        None => String::new(),
    }
}

/// Tenant subdomain of a hostname such as `masjid-noor.digitaljamath.com`.
///
/// Bare apex domains, `www.` hosts and loopback hosts carry no tenant.
pub fn tenant_from_hostname(hostname: &str) -> Option<TenantSlug> {
    let hostname = hostname.trim().trim_end_matches('.');
    if LOOPBACK_HOSTS.contains(&hostname) {
        return None;
    }

    let labels: Vec<&str> = hostname.split('.').collect();
    if labels.len() < 3 || labels[0].eq_ignore_ascii_case("www") {
        return None;
    }
    // IPv4 literals have four numeric labels.
    if labels.iter().all(|l| l.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }

    TenantSlug::parse(labels[0]).ok()
}
