//! Supplier catalogue service

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Supplier;
use shared::{require_text, Actor, Operation};

const SUPPLIER_COLUMNS: &str =
    "id, supplier_name, contact_number, email, address, created_at, updated_at";

/// Supplier catalogue service
#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

/// Input for creating or updating a supplier. On update, absent fields keep
/// their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierInput {
    pub supplier_name: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

const NAME_REQUIRED: &str = "Supplier name is required";

impl SupplierService {
    /// Create a new SupplierService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All suppliers, newest first
    pub async fn list_suppliers(&self) -> AppResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {} FROM suppliers ORDER BY created_at DESC",
            SUPPLIER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(suppliers)
    }

    pub async fn create_supplier(&self, actor: &Actor, input: SupplierInput) -> AppResult<Supplier> {
        actor.authorize(Operation::ManageSuppliers)?;

        let supplier_name =
            require_text("supplierName", input.supplier_name.as_deref(), NAME_REQUIRED)?;

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            INSERT INTO suppliers (supplier_name, contact_number, email, address)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            SUPPLIER_COLUMNS
        ))
        .bind(&supplier_name)
        .bind(input.contact_number.unwrap_or_default())
        .bind(input.email.unwrap_or_default())
        .bind(input.address.unwrap_or_default())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(supplier_id = %supplier.id, "supplier created");
        Ok(supplier)
    }

    pub async fn update_supplier(
        &self,
        actor: &Actor,
        supplier_id: Uuid,
        input: SupplierInput,
    ) -> AppResult<Supplier> {
        actor.authorize(Operation::ManageSuppliers)?;

        let supplier_name = input
            .supplier_name
            .as_deref()
            .map(|name| require_text("supplierName", Some(name), NAME_REQUIRED))
            .transpose()?;

        sqlx::query_as::<_, Supplier>(&format!(
            r#"
            UPDATE suppliers
            SET supplier_name = COALESCE($1, supplier_name),
                contact_number = COALESCE($2, contact_number),
                email = COALESCE($3, email),
                address = COALESCE($4, address),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            SUPPLIER_COLUMNS
        ))
        .bind(supplier_name)
        .bind(input.contact_number)
        .bind(input.email)
        .bind(input.address)
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    pub async fn delete_supplier(&self, actor: &Actor, supplier_id: Uuid) -> AppResult<()> {
        actor.authorize(Operation::ManageSuppliers)?;

        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(supplier_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        tracing::info!(supplier_id = %supplier_id, "supplier deleted");
        Ok(())
    }
}
