//! Library members and their wishlists.

use crate::domain::{TimeMs, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: i64,
    /// Optional link to a login account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub full_name: String,
    pub phone: Option<String>,
    pub join_date: TimeMs,
    pub created_at: TimeMs,
    pub modified_at: TimeMs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub user_id: Option<UserId>,
    pub full_name: String,
    pub phone: Option<String>,
}

impl NewMember {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            user_id: None,
            full_name: full_name.into(),
            phone: None,
        }
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// A catalog entry a member wants. At most one row per (member, catalog).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberWishlist {
    pub wishlist_id: i64,
    pub member_id: i64,
    pub catalog_id: i64,
    pub created_at: TimeMs,
}
