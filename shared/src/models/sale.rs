//! Sale models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProductSummary, UserSummary};

/// A recorded sale. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity_sold: i32,
    /// Unit price times quantity at the time of sale; never recomputed
    pub total_amount: Decimal,
    pub sold_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Sale with product and seller resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleView {
    #[serde(flatten)]
    pub sale: Sale,
    pub product: Option<ProductSummary>,
    pub seller: Option<UserSummary>,
}
