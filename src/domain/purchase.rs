//! Book purchases and their line items.

use crate::domain::{Decimal, TimeMs};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("line total overflows: {quantity} x {unit_price}")]
    LineTotalOverflow { quantity: i64, unit_price: Decimal },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub purchase_id: i64,
    pub book_id: i64,
    pub purchase_date: TimeMs,
    pub cost: Decimal,
    pub supplier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchase {
    pub book_id: i64,
    /// `None` takes the column default (zero).
    pub cost: Option<Decimal>,
    pub supplier: Option<String>,
}

impl NewPurchase {
    pub fn new(book_id: i64) -> Self {
        Self {
            book_id,
            cost: None,
            supplier: None,
        }
    }

    pub fn with_cost(mut self, cost: Decimal) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseDetail {
    pub detail_id: i64,
    pub purchase_id: i64,
    pub book_id: i64,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Line item payload. Fields left as `None` take the column defaults
/// (quantity 1, zero amounts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchaseDetail {
    pub purchase_id: i64,
    pub book_id: i64,
    pub quantity: Option<i64>,
    pub unit_price: Option<Decimal>,
    pub line_total: Option<Decimal>,
}

impl NewPurchaseDetail {
    pub fn new(purchase_id: i64, book_id: i64) -> Self {
        Self {
            purchase_id,
            book_id,
            quantity: None,
            unit_price: None,
            line_total: None,
        }
    }

    /// Line item whose total is `unit_price * quantity`.
    ///
    /// # Errors
    /// Returns `LineTotalOverflow` if the product does not fit a decimal.
    pub fn priced(
        purchase_id: i64,
        book_id: i64,
        quantity: i64,
        unit_price: Decimal,
    ) -> Result<Self, PurchaseError> {
        let line_total = unit_price
            .checked_mul(Decimal::from_i64(quantity))
            .ok_or(PurchaseError::LineTotalOverflow {
                quantity,
                unit_price,
            })?;

        Ok(Self {
            purchase_id,
            book_id,
            quantity: Some(quantity),
            unit_price: Some(unit_price),
            line_total: Some(line_total),
        })
    }
}
