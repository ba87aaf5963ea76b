//! Visit logs: walk-in visitors and the books they use on site.

use crate::domain::{TimeMs, VisitStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryLog {
    pub log_id: i64,
    pub visitor_name: String,
    pub phone: Option<String>,
    pub status: VisitStatus,
    pub visit_date: TimeMs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<TimeMs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returned_at: Option<TimeMs>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLibraryLog {
    pub visitor_name: String,
    pub phone: Option<String>,
}

impl NewLibraryLog {
    pub fn new(visitor_name: impl Into<String>) -> Self {
        Self {
            visitor_name: visitor_name.into(),
            phone: None,
        }
    }
}

/// A book handed out under a visit log. Unique per (log, book).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryLogItem {
    pub item_id: i64,
    pub log_id: i64,
    pub book_id: i64,
    pub returned_at: Option<TimeMs>,
}
