use std::collections::BTreeMap;

use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Access level granted to a module by a staff role.
///
/// Levels are compared by membership, not by rank: a `write` check accepts
/// `write` or `admin`, an `admin` check accepts only `admin`, and a `read`
/// check accepts any granted value. There is intentionally no `Ord` impl.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Read,
    Write,
    Admin,
    /// Any value the backend sent that this client does not know, including
    /// non-string JSON such as `null`, booleans or numbers.
    ///
    /// It still counts as "present" for read checks.
    Unrecognized,
}

impl<'de> Deserialize<'de> for AccessLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value.as_str() {
            Some("read") => AccessLevel::Read,
            Some("write") => AccessLevel::Write,
            Some("admin") => AccessLevel::Admin,
            _ => AccessLevel::Unrecognized,
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown access level '{0}' (expected read, write or admin)")]
pub struct ParseAccessLevelError(pub String);

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
            AccessLevel::Admin => "admin",
            AccessLevel::Unrecognized => "unrecognized",
        }
    }

    /// Whether a module granted at `self` passes a check for `required`.
    pub fn satisfies(self, required: AccessLevel) -> bool {
        match required {
            AccessLevel::Read => true,
            AccessLevel::Write => matches!(self, AccessLevel::Write | AccessLevel::Admin),
            AccessLevel::Admin => self == AccessLevel::Admin,
            AccessLevel::Unrecognized => false,
        }
    }
}

impl core::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = ParseAccessLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(AccessLevel::Read),
            "write" => Ok(AccessLevel::Write),
            "admin" => Ok(AccessLevel::Admin),
            other => Err(ParseAccessLevelError(other.to_string())),
        }
    }
}

/// The feature areas known to the client.
///
/// Backend roles may name other modules too; those are still honoured by
/// [`PermissionMap`] since keys are plain strings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Finance,
    Members,
    Welfare,
    Surveys,
    Announcements,
    Reports,
    Settings,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown module '{0}'")]
pub struct ParseModuleError(pub String);

impl Module {
    pub const ALL: [Module; 7] = [
        Module::Finance,
        Module::Members,
        Module::Welfare,
        Module::Surveys,
        Module::Announcements,
        Module::Reports,
        Module::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Finance => "finance",
            Module::Members => "members",
            Module::Welfare => "welfare",
            Module::Surveys => "surveys",
            Module::Announcements => "announcements",
            Module::Reports => "reports",
            Module::Settings => "settings",
        }
    }
}

impl AsRef<str> for Module {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl core::fmt::Display for Module {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = ParseModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Module::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or(ParseModuleError(wanted))
    }
}

/// Module name -> granted level, as carried by a staff role.
///
/// A missing key means no access at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMap(BTreeMap<String, AccessLevel>);

impl PermissionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every predefined module at `admin`; granted to superusers.
    pub fn full_access() -> Self {
        Module::ALL
            .into_iter()
            .map(|m| (m.as_str().to_string(), AccessLevel::Admin))
            .collect()
    }

    pub fn grant(&mut self, module: impl Into<String>, level: AccessLevel) {
        self.0.insert(module.into(), level);
    }

    pub fn level(&self, module: impl AsRef<str>) -> Option<AccessLevel> {
        self.0.get(module.as_ref()).copied()
    }

    /// Capability check under the membership rule described on [`AccessLevel`].
    pub fn allows(&self, module: impl AsRef<str>, required: AccessLevel) -> bool {
        self.level(module)
            .is_some_and(|granted| granted.satisfies(required))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, AccessLevel)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, AccessLevel)> for PermissionMap {
    fn from_iter<I: IntoIterator<Item = (K, AccessLevel)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Treats a JSON `null` permission map as empty.
pub(crate) fn nullable_map<'de, D>(deserializer: D) -> Result<PermissionMap, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<PermissionMap>::deserialize(deserializer)?.unwrap_or_default())
}
