//! Loans (book borrows) and the rows hanging off them.
//!
//! Details, returns and reminders are owned by their loan: deleting the loan
//! deletes them.

use crate::domain::{Decimal, TimeMs};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookBorrow {
    pub borrow_id: i64,
    pub member_id: i64,
    pub loan_date: TimeMs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<TimeMs>,
    pub is_returned: bool,
    pub created_at: TimeMs,
    pub modified_at: TimeMs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookBorrow {
    pub member_id: i64,
    pub due_date: Option<TimeMs>,
}

/// One borrowed book within a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookBorrowDetail {
    pub detail_id: i64,
    pub borrow_id: i64,
    pub book_id: i64,
    pub fine_amount: Decimal,
    pub created_at: TimeMs,
    pub modified_at: TimeMs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookReturn {
    pub return_id: i64,
    pub borrow_id: i64,
    pub return_date: TimeMs,
    pub fine_amount: Decimal,
    pub paid_amount: Decimal,
    pub refund_amount: Decimal,
}

/// Insert payload for a return. Amounts left as `None` take the column default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookReturn {
    pub borrow_id: i64,
    pub fine_amount: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    pub refund_amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanReminder {
    pub reminder_id: i64,
    pub borrow_id: i64,
    pub sent_date: TimeMs,
    pub message: Option<String>,
}
