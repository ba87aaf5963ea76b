//! Catalog titles, physical books and stock adjustments.

use crate::domain::{TimeMs, UserId};
use serde::{Deserialize, Serialize};

/// A title in the catalog with its copy counters.
///
/// The database enforces `0 <= available_copies <= total_copies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub catalog_id: i64,
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub total_copies: i64,
    pub available_copies: i64,
    pub created_at: TimeMs,
    pub modified_at: TimeMs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCatalog {
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    /// `None` leaves the column default (0) in place.
    pub total_copies: Option<i64>,
    pub available_copies: Option<i64>,
}

impl NewCatalog {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
            isbn: None,
            total_copies: None,
            available_copies: None,
        }
    }

    pub fn with_copies(mut self, total: i64, available: i64) -> Self {
        self.total_copies = Some(total);
        self.available_copies = Some(available);
        self
    }
}

/// A physical copy of a catalog title, identified by its barcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: i64,
    pub catalog_id: i64,
    pub barcode: String,
    pub created_at: TimeMs,
}

/// Manual stock correction against a catalog title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub adjustment_id: i64,
    pub catalog_id: i64,
    /// Who made the adjustment. Cleared if that user is deleted.
    pub user_id: Option<UserId>,
    pub adjustment_date: TimeMs,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAdjustment {
    pub catalog_id: i64,
    pub user_id: Option<UserId>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentDetail {
    pub detail_id: i64,
    pub adjustment_id: i64,
    pub catalog_id: i64,
    /// Signed change in copies.
    pub quantity_changed: i64,
}
