//! Admin dashboard statistics

use chrono::Local;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};
use shared::{Actor, DayBounds, Operation};

#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: i64,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
    pub today_sales_count: i64,
    pub today_sales_total: Decimal,
    pub total_sales_amount: Decimal,
}

#[derive(Debug, FromRow)]
struct StockCounts {
    total_products: i64,
    low_stock_count: i64,
    out_of_stock_count: i64,
}

#[derive(Debug, FromRow)]
struct SalesTotals {
    today_sales_count: i64,
    today_sales_total: Decimal,
    total_sales_amount: Decimal,
}

impl DashboardService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn stats(&self, actor: &Actor) -> AppResult<DashboardStats> {
        actor.authorize(Operation::ViewDashboard)?;

        let stock = sqlx::query_as::<_, StockCounts>(
            r#"
            SELECT COUNT(*) AS total_products,
                   COUNT(*) FILTER (WHERE quantity > 0 AND quantity < min_threshold) AS low_stock_count,
                   COUNT(*) FILTER (WHERE quantity = 0) AS out_of_stock_count
            FROM products
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let today = DayBounds::for_date(Local::now().date_naive(), &Local)
            .ok_or_else(|| AppError::Internal("Local day has no valid bounds".to_string()))?;

        let sales = sqlx::query_as::<_, SalesTotals>(
            r#"
            SELECT COUNT(*) FILTER (WHERE created_at BETWEEN $1 AND $2) AS today_sales_count,
                   COALESCE(SUM(total_amount) FILTER (WHERE created_at BETWEEN $1 AND $2), 0) AS today_sales_total,
                   COALESCE(SUM(total_amount), 0) AS total_sales_amount
            FROM sales
            "#,
        )
        .bind(today.start)
        .bind(today.end)
        .fetch_one(&self.db)
        .await?;

        Ok(DashboardStats {
            total_products: stock.total_products,
            low_stock_count: stock.low_stock_count,
            out_of_stock_count: stock.out_of_stock_count,
            today_sales_count: sales.today_sales_count,
            today_sales_total: sales.today_sales_total,
            total_sales_amount: sales.total_sales_amount,
        })
    }
}
