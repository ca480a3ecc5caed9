//! Restock models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProductSummary, SupplierSummary};

/// Stock received from a supplier. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Restock {
    pub id: Uuid,
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub quantity_added: i32,
    pub created_at: DateTime<Utc>,
}

/// Restock with product and supplier resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestockView {
    #[serde(flatten)]
    pub restock: Restock,
    pub product: Option<ProductSummary>,
    pub supplier: Option<SupplierSummary>,
}
