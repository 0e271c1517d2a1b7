use serde::{Deserialize, Serialize};

use mizan_core::UserId;

/// The authenticated caller, as returned by `/api/user/profile/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,

    #[serde(default)]
    pub is_superuser: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Profile {
    pub fn new(id: UserId, is_superuser: bool) -> Self {
        Self {
            id,
            is_superuser,
            username: None,
            email: None,
        }
    }

    /// Best human-readable label for the caller.
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| format!("user #{}", self.id))
    }
}
