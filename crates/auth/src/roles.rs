use serde::{Deserialize, Serialize};

use mizan_core::{StaffRoleId, UserId};

use crate::permissions::{PermissionMap, nullable_map};
use crate::principal::Profile;

/// A named permission bundle issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffRole {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<StaffRoleId>,

    #[serde(default)]
    pub name: String,

    #[serde(default, deserialize_with = "nullable_map")]
    pub permissions: PermissionMap,
}

/// Links a user account to a role within the tenant.
///
/// `role` may be absent on the backend (staff without an assigned role);
/// such an entry grants nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub user: UserId,

    #[serde(default)]
    pub role: Option<StaffRoleId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
}

/// Locate the staff entry belonging to `profile` (first match wins).
pub fn find_staff_entry<'a>(profile: &Profile, staff: &'a [StaffEntry]) -> Option<&'a StaffEntry> {
    staff.iter().find(|entry| entry.user == profile.id)
}
