use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// A directory record owned by the external auth/admin system. The engine
/// only reads these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Store key, normally matching the auth UID.
    pub key: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Programme name -> allowed. An absent or empty map means unrestricted
    /// access to all programmes.
    #[serde(default)]
    pub allowed_programmes: BTreeMap<String, bool>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
}

impl UserRecord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            uid: None,
            name: None,
            username: None,
            role: None,
            designation: None,
            department: None,
            status: None,
            allowed_programmes: BTreeMap::new(),
            email: None,
            phone: None,
            phone_number: None,
            mobile: None,
        }
    }

    pub fn is_inactive(&self) -> bool {
        self.status.as_deref().is_some_and(|status| status.trim().eq_ignore_ascii_case("inactive"))
    }

    /// Permissive default: a user with no programme map (or an empty one)
    /// can handle every programme.
    pub fn can_handle_programme(&self, programme: &str) -> bool {
        if self.allowed_programmes.is_empty() {
            return true;
        }
        self.allowed_programmes.get(programme).copied().unwrap_or(false)
    }

    /// Role tags derived from every attribute field that may carry a role
    /// token.
    pub fn roles(&self) -> Vec<Role> {
        [&self.role, &self.designation, &self.department]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .map(Role::parse)
            .collect()
    }

    pub fn has_any_role(&self, wanted: &[Role]) -> bool {
        self.roles().iter().any(|role| wanted.contains(role))
    }

    pub fn best_email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|value| !value.is_empty())
    }

    pub fn best_phone(&self) -> Option<&str> {
        [&self.phone, &self.phone_number, &self.mobile]
            .into_iter()
            .find_map(|field| field.as_deref().map(str::trim).filter(|value| !value.is_empty()))
    }
}
