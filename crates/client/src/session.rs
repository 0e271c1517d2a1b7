//! Permission session: the caller's resolved capabilities.
//!
//! Resolution order is strictly sequential:
//!
//! 1. `GET /api/user/profile/`; a superuser gets full access and we stop.
//! 2. `GET /api/jamath/staff-members/`; find the entry whose `user` is us.
//! 3. `GET /api/jamath/staff-roles/{role}/`; adopt its permission map.
//!
//! Any failure, or a missing staff entry, resolves to an empty map.

use async_trait::async_trait;

use mizan_auth::{AccessLevel, PermissionMap, Profile, StaffEntry, StaffRole, find_staff_entry};
use mizan_core::StaffRoleId;

use crate::http::{ApiClient, ClientError};

pub const PROFILE_PATH: &str = "/api/user/profile/";
pub const STAFF_MEMBERS_PATH: &str = "/api/jamath/staff-members/";

pub fn staff_role_path(id: StaffRoleId) -> String {
    format!("/api/jamath/staff-roles/{id}/")
}

/// Backend calls needed to resolve permissions.
#[async_trait]
pub trait AuthorizationSource: Send + Sync {
    async fn fetch_profile(&self) -> Result<Profile, ClientError>;
    async fn fetch_staff_members(&self) -> Result<Vec<StaffEntry>, ClientError>;
    async fn fetch_staff_role(&self, id: StaffRoleId) -> Result<StaffRole, ClientError>;
}

#[async_trait]
impl AuthorizationSource for ApiClient {
    async fn fetch_profile(&self) -> Result<Profile, ClientError> {
        self.get_json(PROFILE_PATH).await
    }

    async fn fetch_staff_members(&self) -> Result<Vec<StaffEntry>, ClientError> {
        self.get_json(STAFF_MEMBERS_PATH).await
    }

    async fn fetch_staff_role(&self, id: StaffRoleId) -> Result<StaffRole, ClientError> {
        self.get_json(&staff_role_path(id)).await
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub profile: Profile,
    pub role: Option<StaffRole>,
    pub permissions: PermissionMap,
}

/// Resolve the caller's permissions, surfacing transport errors.
///
/// A missing staff entry (or one without a role) is not an error: it
/// resolves to an empty map.
pub async fn resolve_permissions<S>(source: &S) -> Result<Resolution, ClientError>
where
    S: AuthorizationSource + ?Sized,
{
    let profile = source.fetch_profile().await?;
    let (role, permissions) = resolve_for_profile(source, &profile).await?;
    Ok(Resolution {
        profile,
        role,
        permissions,
    })
}

/// Everything after the profile fetch: superuser check, staff lookup, role.
async fn resolve_for_profile<S>(
    source: &S,
    profile: &Profile,
) -> Result<(Option<StaffRole>, PermissionMap), ClientError>
where
    S: AuthorizationSource + ?Sized,
{
    if profile.is_superuser {
        tracing::debug!(user_id = %profile.id, "superuser; granting full access");
        return Ok((None, PermissionMap::full_access()));
    }

    let staff = source.fetch_staff_members().await?;
    let Some(role_id) = find_staff_entry(profile, &staff).and_then(|entry| entry.role) else {
        tracing::info!(user_id = %profile.id, "no staff role for current user");
        return Ok((None, PermissionMap::new()));
    };

    let role = source.fetch_staff_role(role_id).await?;
    let permissions = role.permissions.clone();
    Ok((Some(role), permissions))
}

/// The caller's capabilities, owned for the lifetime of one signed-in context.
///
/// Construct with [`PermissionSession::initialize`]; consumers only ever get
/// shared access to the cached map.
#[derive(Debug)]
pub struct PermissionSession<S> {
    source: S,
    profile: Option<Profile>,
    role: Option<StaffRole>,
    permissions: PermissionMap,
    loading: bool,
}

impl<S: AuthorizationSource> PermissionSession<S> {
    /// A session with no access that has not resolved anything yet.
    pub fn new(source: S) -> Self {
        Self {
            source,
            profile: None,
            role: None,
            permissions: PermissionMap::new(),
            loading: true,
        }
    }

    /// Create the session and resolve permissions once.
    pub async fn initialize(source: S) -> Self {
        let mut session = Self::new(source);
        session.refresh().await;
        session
    }

    /// Re-resolve from the backend. Never fails; errors mean no access.
    ///
    /// The profile is only cleared when the profile fetch itself fails; a
    /// later staff or role failure keeps the caller signed in with no access.
    pub async fn refresh(&mut self) {
        self.loading = true;
        self.role = None;
        self.permissions = PermissionMap::new();

        match self.source.fetch_profile().await {
            Ok(profile) => {
                match resolve_for_profile(&self.source, &profile).await {
                    Ok((role, permissions)) => {
                        tracing::info!(
                            user_id = %profile.id,
                            modules = permissions.len(),
                            "permissions resolved"
                        );
                        self.role = role;
                        self.permissions = permissions;
                    }
                    Err(err) => {
                        tracing::warn!(
                            user_id = %profile.id,
                            error = %err,
                            "failed to resolve permissions; no access"
                        );
                    }
                }
                self.profile = Some(profile);
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load profile; no access");
                self.profile = None;
            }
        }
        self.loading = false;
    }

    /// Explicit teardown; hands the backend handle back.
    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S> PermissionSession<S> {
    /// Pure lookup; see [`AccessLevel`] for the matching rule.
    pub fn has_permission(&self, module: impl AsRef<str>, required: AccessLevel) -> bool {
        self.permissions.allows(module, required)
    }

    pub fn can_read(&self, module: impl AsRef<str>) -> bool {
        self.has_permission(module, AccessLevel::Read)
    }

    pub fn permissions(&self) -> &PermissionMap {
        &self.permissions
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn role(&self) -> Option<&StaffRole> {
        self.role.as_ref()
    }

    pub fn is_superuser(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.is_superuser)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
