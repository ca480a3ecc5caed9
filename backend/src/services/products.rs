//! Product catalogue service

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{NewProduct, Product, ProductListing};
use crate::services::ledger::PRODUCT_COLUMNS;
use shared::{validate_price, Actor, Operation};

/// Product catalogue service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Input for creating a product
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductInput {
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 0, max = 2147483647, message = "Quantity cannot be negative"))]
    pub quantity: Option<i64>,
    #[validate(range(min = 0, max = 2147483647, message = "Minimum threshold cannot be negative"))]
    pub min_threshold: Option<i64>,
}

/// Partial product update
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductInput {
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 0, max = 2147483647, message = "Quantity cannot be negative"))]
    pub quantity: Option<i64>,
    #[validate(range(min = 0, max = 2147483647, message = "Minimum threshold cannot be negative"))]
    pub min_threshold: Option<i64>,
}

impl CreateProductInput {
    fn into_new_product(self) -> AppResult<NewProduct> {
        self.validate()?;

        const MSG: &str = "Product name and price are required";
        let product_name = self
            .product_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::validation("productName", MSG))?
            .to_string();
        let price = self
            .price
            .ok_or_else(|| AppError::validation("price", MSG))?;

        Ok(NewProduct {
            product_name,
            description: self.description.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            price: validate_price("price", price)?,
            // Range-validated above
            quantity: self.quantity.unwrap_or(0) as i32,
            min_threshold: self.min_threshold.unwrap_or(0) as i32,
        })
    }
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All products, newest first
    pub async fn list_products(&self) -> AppResult<Vec<ProductListing>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products ORDER BY created_at DESC",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(products.into_iter().map(ProductListing::from).collect())
    }

    /// Products below their restock threshold, emptiest first
    pub async fn list_low_stock(&self) -> AppResult<Vec<ProductListing>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE quantity < min_threshold ORDER BY quantity ASC, created_at DESC",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(products.into_iter().map(ProductListing::from).collect())
    }

    pub async fn create_product(
        &self,
        actor: &Actor,
        input: CreateProductInput,
    ) -> AppResult<ProductListing> {
        actor.authorize(Operation::ManageProducts)?;

        let new_product = input.into_new_product()?;
        let mut conn = self.db.acquire().await?;
        let product = insert_product(&mut conn, &new_product).await?;

        Ok(product.into())
    }

    /// Apply a partial update. The row is locked so a concurrent sale cannot
    /// be overwritten by a stale quantity.
    pub async fn update_product(
        &self,
        actor: &Actor,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<ProductListing> {
        actor.authorize(Operation::ManageProducts)?;
        input.validate()?;

        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1 FOR UPDATE",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let product_name = match input.product_name {
            Some(name) if name.trim().is_empty() => {
                return Err(AppError::validation(
                    "productName",
                    "Product name cannot be empty",
                ))
            }
            Some(name) => name.trim().to_string(),
            None => existing.product_name,
        };
        let price = match input.price {
            Some(price) => validate_price("price", price)?,
            None => existing.price,
        };
        let quantity = input.quantity.map(|q| q as i32).unwrap_or(existing.quantity);
        let min_threshold = input
            .min_threshold
            .map(|m| m as i32)
            .unwrap_or(existing.min_threshold);

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET product_name = $1, description = $2, category = $3, price = $4,
                quantity = $5, min_threshold = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(&product_name)
        .bind(input.description.unwrap_or(existing.description))
        .bind(input.category.unwrap_or(existing.category))
        .bind(price)
        .bind(quantity)
        .bind(min_threshold)
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        if product.quantity != existing.quantity {
            tracing::info!(
                product_id = %product_id,
                from = existing.quantity,
                to = product.quantity,
                "stock adjusted by catalogue edit"
            );
        }

        Ok(product.into())
    }

    pub async fn delete_product(&self, actor: &Actor, product_id: Uuid) -> AppResult<()> {
        actor.authorize(Operation::ManageProducts)?;

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        tracing::info!(product_id = %product_id, "product deleted");
        Ok(())
    }
}

/// Insert a product on an open connection or transaction
pub(crate) async fn insert_product(
    conn: &mut PgConnection,
    product: &NewProduct,
) -> AppResult<Product> {
    let product = sqlx::query_as::<_, Product>(&format!(
        r#"
        INSERT INTO products (product_name, description, category, price, quantity, min_threshold)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {}
        "#,
        PRODUCT_COLUMNS
    ))
    .bind(&product.product_name)
    .bind(&product.description)
    .bind(&product.category)
    .bind(product.price)
    .bind(product.quantity)
    .bind(product.min_threshold)
    .fetch_one(&mut *conn)
    .await?;

    tracing::info!(
        product_id = %product.id,
        quantity = product.quantity,
        "product created"
    );

    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_name_and_price() {
        let err = CreateProductInput {
            price: Some(Decimal::new(250, 2)),
            ..Default::default()
        }
        .into_new_product()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "productName"));

        let err = CreateProductInput {
            product_name: Some("Cola".into()),
            ..Default::default()
        }
        .into_new_product()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "price"));
    }

    #[test]
    fn create_defaults_optional_fields() {
        let product = CreateProductInput {
            product_name: Some(" Cola ".into()),
            price: Some(Decimal::new(250, 2)),
            ..Default::default()
        }
        .into_new_product()
        .unwrap();

        assert_eq!(product.product_name, "Cola");
        assert_eq!(product.description, "");
        assert_eq!(product.quantity, 0);
        assert_eq!(product.min_threshold, 0);
    }

    #[test]
    fn create_rejects_negative_values() {
        let base = || CreateProductInput {
            product_name: Some("Cola".into()),
            price: Some(Decimal::ONE),
            ..Default::default()
        };

        assert!(CreateProductInput {
            quantity: Some(-1),
            ..base()
        }
        .into_new_product()
        .is_err());
        assert!(CreateProductInput {
            min_threshold: Some(-5),
            ..base()
        }
        .into_new_product()
        .is_err());
        assert!(CreateProductInput {
            price: Some(Decimal::new(-1, 0)),
            ..base()
        }
        .into_new_product()
        .is_err());
    }
}
