//! Sale recording service

use chrono::{DateTime, Local, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ProductSummary, Sale, SaleView, UserSummary};
use crate::services::ledger::StockLedger;
use shared::{
    clamp_limit, parse_date_filter, require_positive_quantity, sale_total, Actor, DayBounds,
    Operation, DEFAULT_SALES_LIMIT,
};

/// Sales service for recording and listing sales
#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
}

/// Input for recording a sale
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSaleInput {
    pub product_id: Option<Uuid>,
    pub quantity_sold: Option<i64>,
}

/// Query parameters for listing sales
#[derive(Debug, Default, Deserialize)]
pub struct SalesQuery {
    /// Calendar date, `YYYY-MM-DD`, in the server's local time zone
    pub date: Option<String>,
    pub limit: Option<i64>,
}

/// Sale joined with its product and seller
#[derive(Debug, FromRow)]
struct SaleRow {
    id: Uuid,
    product_id: Uuid,
    quantity_sold: i32,
    total_amount: Decimal,
    sold_by: Uuid,
    created_at: DateTime<Utc>,
    product_name: Option<String>,
    product_price: Option<Decimal>,
    seller_name: Option<String>,
    seller_email: Option<String>,
}

impl SaleRow {
    fn into_view(self) -> SaleView {
        let product = self.product_name.map(|product_name| ProductSummary {
            id: self.product_id,
            product_name,
            price: self.product_price,
            quantity: None,
        });
        let seller = self.seller_name.map(|name| UserSummary {
            id: self.sold_by,
            name,
            email: self.seller_email,
        });

        SaleView {
            sale: Sale {
                id: self.id,
                product_id: self.product_id,
                quantity_sold: self.quantity_sold,
                total_amount: self.total_amount,
                sold_by: self.sold_by,
                created_at: self.created_at,
            },
            product,
            seller,
        }
    }
}

const SALE_VIEW_SELECT: &str = r#"
    SELECT s.id, s.product_id, s.quantity_sold, s.total_amount, s.sold_by, s.created_at,
           p.product_name, p.price AS product_price,
           u.name AS seller_name, u.email AS seller_email
    FROM sales s
    LEFT JOIN products p ON p.id = s.product_id
    LEFT JOIN users u ON u.id = s.sold_by
"#;

impl SalesService {
    /// Create a new SalesService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a sale, decrementing stock in the same transaction
    pub async fn record_sale(&self, actor: &Actor, input: RecordSaleInput) -> AppResult<SaleView> {
        actor.authorize(Operation::RecordSale)?;

        const MSG: &str = "Valid productId and quantitySold are required";
        let product_id = input
            .product_id
            .ok_or_else(|| AppError::validation("productId", MSG))?;
        let quantity = require_positive_quantity("quantitySold", input.quantity_sold, MSG)?;

        let mut tx = self.db.begin().await?;

        let product = StockLedger::apply_delta(&mut tx, product_id, -quantity).await?;
        let total_amount = sale_total(product.price, quantity)
            .ok_or_else(|| AppError::validation("quantitySold", "Sale total out of range"))?;

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (product_id, quantity_sold, total_amount, sold_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, quantity_sold, total_amount, sold_by, created_at
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(total_amount)
        .bind(actor.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            sale_id = %sale.id,
            product_id = %product_id,
            quantity,
            total = %total_amount,
            "sale recorded"
        );

        self.get_sale(sale.id).await
    }

    /// Get a single sale with references resolved
    pub async fn get_sale(&self, sale_id: Uuid) -> AppResult<SaleView> {
        let row = sqlx::query_as::<_, SaleRow>(&format!("{} WHERE s.id = $1", SALE_VIEW_SELECT))
            .bind(sale_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        Ok(row.into_view())
    }

    /// List sales newest-first, optionally restricted to one calendar day
    pub async fn list_sales(&self, query: SalesQuery) -> AppResult<Vec<SaleView>> {
        let bounds = match query.date.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(date) => {
                let date = parse_date_filter(date)?;
                let bounds = DayBounds::for_date(date, &Local).ok_or_else(|| {
                    AppError::validation("date", "Date is not valid in the server time zone")
                })?;
                Some(bounds)
            }
            None => None,
        };
        let limit = clamp_limit(query.limit, DEFAULT_SALES_LIMIT);

        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            r#"{}
            WHERE ($1::timestamptz IS NULL OR s.created_at >= $1)
              AND ($2::timestamptz IS NULL OR s.created_at <= $2)
            ORDER BY s.created_at DESC
            LIMIT $3
            "#,
            SALE_VIEW_SELECT
        ))
        .bind(bounds.map(|b| b.start))
        .bind(bounds.map(|b| b.end))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(SaleRow::into_view).collect())
    }
}
