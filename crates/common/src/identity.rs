//! Authenticated identity, trusted from upstream middleware.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// Role granted by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The caller of a request. Auth happens upstream; this is taken on trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user: UserId,
    pub role: Role,
}

impl Identity {
    pub fn user(user: UserId) -> Self {
        Self {
            user,
            role: Role::User,
        }
    }

    pub fn admin(user: UserId) -> Self {
        Self {
            user,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this caller may act on a resource owned by `owner`.
    pub fn can_access(&self, owner: UserId) -> bool {
        self.is_admin() || self.user == owner
    }
}
