//! Domain entities for the library data-access layer.
//!
//! This module provides:
//! - Lossless money handling via the Decimal wrapper
//! - Primitives: TimeMs, UserId, VisitStatus
//! - One struct per mapped table, plus `New*` insert payloads that leave
//!   database-defaulted columns out

pub mod catalog;
pub mod decimal;
pub mod loan;
pub mod member;
pub mod primitives;
pub mod purchase;
pub mod user;
pub mod visit;

pub use catalog::{Adjustment, AdjustmentDetail, Book, Catalog, NewAdjustment, NewCatalog};
pub use decimal::Decimal;
pub use loan::{BookBorrow, BookBorrowDetail, BookReturn, LoanReminder, NewBookBorrow, NewBookReturn};
pub use member::{Member, MemberWishlist, NewMember};
pub use primitives::{TimeMs, UserId, VisitStatus, VisitStatusParseError};
pub use purchase::{NewPurchase, NewPurchaseDetail, Purchase, PurchaseDetail, PurchaseError};
pub use user::{NewUser, Permission, Role, User};
pub use visit::{LibraryLog, LibraryLogItem, NewLibraryLog};
