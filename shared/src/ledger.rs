//! Stock ledger arithmetic
//!
//! The single place where a product's quantity is changed. Sales, restocks and
//! request fulfillment all compute their new quantity through [`apply_delta`];
//! the backend wraps it in a row-locking transaction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stock mutation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("Insufficient stock. Available: {available}")]
    Insufficient { available: i32 },

    #[error("Stock quantity out of range")]
    Overflow,
}

/// Compute the quantity after applying `delta` to `current`.
///
/// Fails without side effects if the result would be negative.
pub fn apply_delta(current: i32, delta: i32) -> Result<i32, StockError> {
    let next = current.checked_add(delta).ok_or(StockError::Overflow)?;
    if next < 0 {
        return Err(StockError::Insufficient {
            available: current.max(0),
        });
    }
    Ok(next)
}

/// Total charged for a sale, fixed at the time of sale.
///
/// `None` when the product does not fit in a `Decimal`.
pub fn sale_total(unit_price: Decimal, quantity: i32) -> Option<Decimal> {
    unit_price.checked_mul(Decimal::from(quantity))
}

/// Stock level classification of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn classify(quantity: i32, min_threshold: i32) -> Self {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity < min_threshold {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "in_stock",
            StockStatus::LowStock => "low_stock",
            StockStatus::OutOfStock => "out_of_stock",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::InStock => write!(f, "In stock"),
            StockStatus::LowStock => write!(f, "Low stock"),
            StockStatus::OutOfStock => write!(f, "Out of stock"),
        }
    }
}
