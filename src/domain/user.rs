//! Identity entities: users, roles and permission claims.

use crate::domain::{TimeMs, UserId};
use serde::{Deserialize, Serialize};

/// An application user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub user_name: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    /// Set by the database on insert.
    pub created_at: TimeMs,
    /// Set by the database on insert and touched on every update.
    pub modified_at: TimeMs,
}

/// Insert payload for a user. Timestamps come from column defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub id: UserId,
    pub user_name: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl NewUser {
    /// New user with a freshly generated id.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            id: UserId::generate(),
            user_name: user_name.into(),
            email: None,
            full_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
        }
    }
}

/// A permission claim (type/value pair).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: i64,
    pub claim_type: String,
    pub claim_value: String,
}
