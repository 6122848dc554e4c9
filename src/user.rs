//! Current user state.

use serde::{Deserialize, Serialize};

/// User record as returned by the CMP API.
///
/// CMP before 2022.3.2 reported admins as `cmpAdmin`; newer versions use
/// `superAdmin`. Both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(default)]
    pub super_admin: Option<bool>,
    #[serde(default)]
    pub cmp_admin: Option<bool>,
    #[serde(default)]
    pub global_viewer: Option<bool>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub global_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// The signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub cmp_admin: bool,
    pub global_viewer: bool,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub id: String,
    pub global_id: String,
    /// Directory the user came from; `None` for local users.
    pub source: Option<String>,
}

impl From<UserPayload> for User {
    fn from(payload: UserPayload) -> Self {
        Self {
            cmp_admin: payload.super_admin.or(payload.cmp_admin).unwrap_or(false),
            global_viewer: payload.global_viewer.unwrap_or(false),
            username: payload.username.unwrap_or_default(),
            email: payload.email.unwrap_or_default(),
            first_name: payload.first_name.unwrap_or_default(),
            last_name: payload.last_name.unwrap_or_default(),
            id: payload.id.unwrap_or_default(),
            global_id: payload.global_id.unwrap_or_default(),
            source: payload.source,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserStore {
    user: User,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_current_user(&mut self, payload: UserPayload) {
        self.user = payload.into();
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn is_admin(&self) -> bool {
        self.user.cmp_admin
    }

    pub fn is_global_viewer(&self) -> bool {
        self.user.global_viewer
    }

    pub fn is_admin_or_global_viewer(&self) -> bool {
        self.is_admin() || self.is_global_viewer()
    }

    pub fn is_ldap_user(&self) -> bool {
        self.user.source.is_some()
    }

    pub fn reset(&mut self) {
        self.user = User::default();
    }
}
