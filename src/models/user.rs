//! Authenticated user, as reported by `GET /auth/me`

use serde::{Deserialize, Serialize};

/// The user behind the current session
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
}

fn default_active() -> bool {
    true
}

/// Role, derived only from `is_admin`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

impl CurrentUser {
    pub fn role(&self) -> Role {
        if self.is_admin {
            Role::Admin
        } else {
            Role::Customer
        }
    }

    /// Full name when set, otherwise the email address
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}
