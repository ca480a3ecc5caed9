//! Transactional stock ledger
//!
//! Wraps [`shared::ledger::apply_delta`] in a row lock so concurrent sales,
//! restocks and fulfillments against one product serialize. Callers pass the
//! connection of an open transaction; the lock is held until it commits.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Product;

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, product_name, description, category, price, quantity, min_threshold, created_at, updated_at";

pub struct StockLedger;

impl StockLedger {
    /// Lock the product row, apply `delta` and persist the new quantity.
    /// Returns the product as updated.
    pub async fn apply_delta(
        conn: &mut PgConnection,
        product_id: Uuid,
        delta: i32,
    ) -> AppResult<Product> {
        let current = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1 FOR UPDATE",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let next = match shared::ledger::apply_delta(current.quantity, delta) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!(
                    product_id = %product_id,
                    available = current.quantity,
                    delta,
                    "stock mutation rejected"
                );
                return Err(e.into());
            }
        };

        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET quantity = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(next)
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?;

        tracing::info!(
            product_id = %product_id,
            from = current.quantity,
            to = product.quantity,
            "stock updated"
        );

        Ok(product)
    }

    /// Check that a product exists without locking it
    pub async fn ensure_product(conn: &mut PgConnection, product_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)",
        )
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?;

        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound("Product".to_string()))
        }
    }
}
