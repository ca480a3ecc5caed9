//! Restock recording service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ProductSummary, Restock, RestockView, SupplierSummary};
use crate::services::ledger::StockLedger;
use shared::{require_positive_quantity, Actor, Operation};

/// Restock service
#[derive(Clone)]
pub struct RestockService {
    db: PgPool,
}

/// Input for recording a restock
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRestockInput {
    pub product_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub quantity_added: Option<i64>,
}

#[derive(Debug, FromRow)]
struct RestockRow {
    id: Uuid,
    product_id: Uuid,
    supplier_id: Uuid,
    quantity_added: i32,
    created_at: DateTime<Utc>,
    product_name: Option<String>,
    product_quantity: Option<i32>,
    supplier_name: Option<String>,
}

impl RestockRow {
    fn into_view(self) -> RestockView {
        let product = self.product_name.map(|product_name| ProductSummary {
            id: self.product_id,
            product_name,
            price: None,
            quantity: self.product_quantity,
        });
        let supplier = self.supplier_name.map(|supplier_name| SupplierSummary {
            id: self.supplier_id,
            supplier_name,
        });

        RestockView {
            restock: Restock {
                id: self.id,
                product_id: self.product_id,
                supplier_id: self.supplier_id,
                quantity_added: self.quantity_added,
                created_at: self.created_at,
            },
            product,
            supplier,
        }
    }
}

const RESTOCK_VIEW_SELECT: &str = r#"
    SELECT r.id, r.product_id, r.supplier_id, r.quantity_added, r.created_at,
           p.product_name, p.quantity AS product_quantity,
           sp.supplier_name
    FROM restocks r
    LEFT JOIN products p ON p.id = r.product_id
    LEFT JOIN suppliers sp ON sp.id = r.supplier_id
"#;

impl RestockService {
    /// Create a new RestockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record stock received from a supplier
    pub async fn record_restock(
        &self,
        actor: &Actor,
        input: RecordRestockInput,
    ) -> AppResult<RestockView> {
        actor.authorize(Operation::RecordRestock)?;

        const MSG: &str = "productId, supplierId and quantityAdded (min 1) are required";
        let product_id = input
            .product_id
            .ok_or_else(|| AppError::validation("productId", MSG))?;
        let supplier_id = input
            .supplier_id
            .ok_or_else(|| AppError::validation("supplierId", MSG))?;
        let quantity = require_positive_quantity("quantityAdded", input.quantity_added, MSG)?;

        let mut tx = self.db.begin().await?;
        let restock = Self::restock_in(&mut tx, product_id, supplier_id, quantity).await?;
        tx.commit().await?;

        self.get_restock(restock.id).await
    }

    /// Increment stock and write the restock record on an open transaction.
    ///
    /// Product is checked before supplier so a request naming neither reports
    /// the product as missing.
    pub(crate) async fn restock_in(
        conn: &mut PgConnection,
        product_id: Uuid,
        supplier_id: Uuid,
        quantity: i32,
    ) -> AppResult<Restock> {
        StockLedger::ensure_product(conn, product_id).await?;
        ensure_supplier(conn, supplier_id).await?;

        StockLedger::apply_delta(conn, product_id, quantity).await?;

        let restock = sqlx::query_as::<_, Restock>(
            r#"
            INSERT INTO restocks (product_id, supplier_id, quantity_added)
            VALUES ($1, $2, $3)
            RETURNING id, product_id, supplier_id, quantity_added, created_at
            "#,
        )
        .bind(product_id)
        .bind(supplier_id)
        .bind(quantity)
        .fetch_one(&mut *conn)
        .await?;

        tracing::info!(
            restock_id = %restock.id,
            product_id = %product_id,
            supplier_id = %supplier_id,
            quantity,
            "restock recorded"
        );

        Ok(restock)
    }

    pub async fn get_restock(&self, restock_id: Uuid) -> AppResult<RestockView> {
        let row = sqlx::query_as::<_, RestockRow>(&format!(
            "{} WHERE r.id = $1",
            RESTOCK_VIEW_SELECT
        ))
        .bind(restock_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Restock".to_string()))?;

        Ok(row.into_view())
    }

    /// All restocks, newest first
    pub async fn list_restocks(&self) -> AppResult<Vec<RestockView>> {
        let rows = sqlx::query_as::<_, RestockRow>(&format!(
            "{} ORDER BY r.created_at DESC",
            RESTOCK_VIEW_SELECT
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(RestockRow::into_view).collect())
    }
}

async fn ensure_supplier(conn: &mut PgConnection, supplier_id: Uuid) -> AppResult<()> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)")
        .bind(supplier_id)
        .fetch_one(&mut *conn)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(AppError::NotFound("Supplier".to_string()))
    }
}
