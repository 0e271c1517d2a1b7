use serde::Serialize;

use crate::{AccessLevel, PermissionMap};

/// Synchronous capability check against an already-resolved permission map.
///
/// - No IO
/// - No panics
pub fn has_permission(map: &PermissionMap, module: impl AsRef<str>, required: AccessLevel) -> bool {
    map.allows(module, required)
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of a capability check.
///
/// Answers "why can / can't I see this module?" for diagnostics output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub module: String,
    pub required_level: AccessLevel,
    pub granted_level: Option<AccessLevel>,
    pub granted: bool,

    /// Human-readable reason for the decision.
    pub reason: String,

    /// If denied, what was missing.
    pub denial: Option<DenialKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// The role carries no entry for the module.
    NoModuleAccess,
    /// The module is present but at a level that does not satisfy the check.
    InsufficientLevel,
}

/// Explain the outcome of `has_permission(map, module, required)`.
pub fn explain(map: &PermissionMap, module: &str, required: AccessLevel) -> AuthorizationExplanation {
    let granted_level = map.level(module);
    let granted = map.allows(module, required);

    let (reason, denial) = match (granted_level, granted) {
        (None, _) => (
            format!("No access to module '{module}': the current role does not list it"),
            Some(DenialKind::NoModuleAccess),
        ),
        (Some(level), true) => (
            format!("Module '{module}' is granted at '{level}', which satisfies '{required}'"),
            None,
        ),
        (Some(level), false) => {
            let accepted = match required {
                AccessLevel::Write => "'write' or 'admin'",
                AccessLevel::Admin => "'admin'",
                _ => "a recognised level",
            };
            (
                format!(
                    "Module '{module}' is granted at '{level}'; a '{required}' check requires {accepted}"
                ),
                Some(DenialKind::InsufficientLevel),
            )
        }
    };

    AuthorizationExplanation {
        module: module.to_string(),
        required_level: required,
        granted_level,
        granted,
        reason,
        denial,
    }
}
