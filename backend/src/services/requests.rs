//! Request workflow service
//!
//! Persists the [`Request`] state machine from `shared`. Fulfillment locks the
//! request row, runs the planned side effect through the stock ledger and
//! writes the new status in a single transaction, so a failed side effect
//! leaves the request pending and two concurrent fulfillments cannot both
//! succeed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    FulfillInput, FulfillmentPlan, NewProductDetails, ProductSummary, RefillDetails, Request,
    RequestKind, RequestPayload, RequestStatus, RequestView, UserSummary,
};
use crate::services::ledger::StockLedger;
use crate::services::products::insert_product;
use crate::services::restock::RestockService;
use shared::{Actor, Operation};

/// Request workflow service
#[derive(Clone)]
pub struct RequestService {
    db: PgPool,
}

/// Query parameters for listing requests
#[derive(Debug, Default, Deserialize)]
pub struct RequestQuery {
    pub status: Option<String>,
}

/// Body of a rejection
#[derive(Debug, Default, Deserialize)]
pub struct RejectInput {
    pub reason: Option<String>,
}

/// A request as stored: one table, variant columns nullable
#[derive(Debug, FromRow)]
struct RequestRow {
    id: Uuid,
    request_type: String,
    product_id: Option<Uuid>,
    quantity_requested: Option<i32>,
    product_name: Option<String>,
    description: Option<String>,
    category: Option<String>,
    suggested_price: Option<Decimal>,
    suggested_quantity: Option<i32>,
    suggested_min_threshold: Option<i32>,
    note: String,
    requested_by: Uuid,
    status: String,
    fulfilled_by: Option<Uuid>,
    fulfilled_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    created_product_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RequestRow {
    fn into_domain(self) -> AppResult<Request> {
        let kind = match self.request_type.as_str() {
            "refill" => RequestKind::Refill(RefillDetails {
                product_id: self.product_id.ok_or_else(|| corrupt(self.id, "product_id"))?,
                quantity_requested: self
                    .quantity_requested
                    .ok_or_else(|| corrupt(self.id, "quantity_requested"))?,
            }),
            "new_product" => RequestKind::NewProduct(NewProductDetails {
                product_name: self
                    .product_name
                    .ok_or_else(|| corrupt(self.id, "product_name"))?,
                description: self.description.unwrap_or_default(),
                category: self.category.unwrap_or_default(),
                suggested_price: self.suggested_price,
                suggested_quantity: self.suggested_quantity.unwrap_or(0),
                suggested_min_threshold: self.suggested_min_threshold.unwrap_or(0),
            }),
            other => {
                return Err(AppError::Internal(format!(
                    "Request {} has unknown type '{}'",
                    self.id, other
                )))
            }
        };

        let status = self
            .status
            .parse::<RequestStatus>()
            .map_err(|_| corrupt(self.id, "status"))?;

        Ok(Request {
            id: self.id,
            kind,
            note: self.note,
            requested_by: self.requested_by,
            status,
            fulfilled_by: self.fulfilled_by,
            fulfilled_at: self.fulfilled_at,
            rejection_reason: self.rejection_reason,
            created_product_id: self.created_product_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn corrupt(id: Uuid, column: &str) -> AppError {
    AppError::Internal(format!("Request {} has an invalid {}", id, column))
}

/// Request joined with product, requester and fulfiller
#[derive(Debug, FromRow)]
struct RequestViewRow {
    #[sqlx(flatten)]
    request: RequestRow,
    linked_product_id: Option<Uuid>,
    linked_product_name: Option<String>,
    linked_product_quantity: Option<i32>,
    requester_name: Option<String>,
    requester_email: Option<String>,
    fulfiller_name: Option<String>,
}

impl RequestViewRow {
    fn into_view(self) -> AppResult<RequestView> {
        let request = self.request.into_domain()?;

        let product = match (self.linked_product_id, self.linked_product_name) {
            (Some(id), Some(product_name)) => Some(ProductSummary {
                id,
                product_name,
                price: None,
                quantity: self.linked_product_quantity,
            }),
            _ => None,
        };
        let requester = self.requester_name.map(|name| UserSummary {
            id: request.requested_by,
            name,
            email: self.requester_email,
        });
        let fulfiller = match (request.fulfilled_by, self.fulfiller_name) {
            (Some(id), Some(name)) => Some(UserSummary {
                id,
                name,
                email: None,
            }),
            _ => None,
        };

        Ok(RequestView {
            request,
            product,
            requester,
            fulfiller,
        })
    }
}

const REQUEST_COLUMNS: &str = r#"
    r.id, r.request_type, r.product_id, r.quantity_requested, r.product_name,
    r.description, r.category, r.suggested_price, r.suggested_quantity,
    r.suggested_min_threshold, r.note, r.requested_by, r.status, r.fulfilled_by,
    r.fulfilled_at, r.rejection_reason, r.created_product_id, r.created_at, r.updated_at
"#;

// A fulfilled new-product request links to the product it created
const REQUEST_VIEW_JOINS: &str = r#"
    LEFT JOIN products p ON p.id = COALESCE(r.product_id, r.created_product_id)
    LEFT JOIN users u ON u.id = r.requested_by
    LEFT JOIN users f ON f.id = r.fulfilled_by
"#;

const REQUEST_VIEW_EXTRAS: &str = r#"
    p.id AS linked_product_id, p.product_name AS linked_product_name,
    p.quantity AS linked_product_quantity,
    u.name AS requester_name, u.email AS requester_email,
    f.name AS fulfiller_name
"#;

impl RequestService {
    /// Create a new RequestService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Raise a refill or new-product request
    pub async fn create_request(
        &self,
        actor: &Actor,
        payload: RequestPayload,
    ) -> AppResult<RequestView> {
        actor.authorize(Operation::CreateRequest)?;

        let kind = RequestKind::from_payload(&payload)?;

        if let RequestKind::Refill(ref details) = kind {
            let mut conn = self.db.acquire().await?;
            StockLedger::ensure_product(&mut conn, details.product_id).await?;
        }

        let (refill, new_product) = match &kind {
            RequestKind::Refill(details) => (Some(details), None),
            RequestKind::NewProduct(details) => (None, Some(details)),
        };

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO requests (
                request_type, product_id, quantity_requested, product_name, description,
                category, suggested_price, suggested_quantity, suggested_min_threshold,
                note, requested_by, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(kind.type_name())
        .bind(refill.map(|r| r.product_id))
        .bind(refill.map(|r| r.quantity_requested))
        .bind(new_product.map(|n| n.product_name.as_str()))
        .bind(new_product.map(|n| n.description.as_str()))
        .bind(new_product.map(|n| n.category.as_str()))
        .bind(new_product.and_then(|n| n.suggested_price))
        .bind(new_product.map(|n| n.suggested_quantity))
        .bind(new_product.map(|n| n.suggested_min_threshold))
        .bind(payload.note.unwrap_or_default())
        .bind(actor.id)
        .bind(RequestStatus::Pending.as_str())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            request_id = %id,
            request_type = kind.type_name(),
            requested_by = %actor.id,
            "request created"
        );

        self.get_request(id).await
    }

    /// Fulfill a pending request and apply its side effect atomically
    pub async fn fulfill_request(
        &self,
        actor: &Actor,
        request_id: Uuid,
        input: FulfillInput,
    ) -> AppResult<RequestView> {
        actor.authorize(Operation::FulfillRequest)?;

        let mut tx = self.db.begin().await?;

        let mut request = lock_request(&mut tx, request_id).await?;
        let plan = request.plan_fulfillment(actor, &input)?;

        let created_product_id = match plan {
            FulfillmentPlan::Restock {
                product_id,
                supplier_id,
                quantity,
            } => {
                RestockService::restock_in(&mut tx, product_id, supplier_id, quantity).await?;
                None
            }
            FulfillmentPlan::CreateProduct(new_product) => {
                let product = insert_product(&mut tx, &new_product).await?;
                Some(product.id)
            }
        };

        request.fulfill(actor, Utc::now(), created_product_id)?;
        persist_transition(&mut tx, &request).await?;

        tx.commit().await?;

        tracing::info!(
            request_id = %request_id,
            request_type = request.kind.type_name(),
            fulfilled_by = %actor.id,
            "request fulfilled"
        );

        self.get_request(request_id).await
    }

    /// Reject a pending request. No stock or catalogue changes.
    pub async fn reject_request(
        &self,
        actor: &Actor,
        request_id: Uuid,
        input: RejectInput,
    ) -> AppResult<RequestView> {
        actor.authorize(Operation::RejectRequest)?;

        let mut tx = self.db.begin().await?;

        let mut request = lock_request(&mut tx, request_id).await?;
        request.reject(actor, Utc::now(), input.reason)?;
        persist_transition(&mut tx, &request).await?;

        tx.commit().await?;

        tracing::info!(request_id = %request_id, rejected_by = %actor.id, "request rejected");

        self.get_request(request_id).await
    }

    pub async fn get_request(&self, request_id: Uuid) -> AppResult<RequestView> {
        let row = sqlx::query_as::<_, RequestViewRow>(&format!(
            "SELECT {}, {} FROM requests r {} WHERE r.id = $1",
            REQUEST_COLUMNS, REQUEST_VIEW_EXTRAS, REQUEST_VIEW_JOINS
        ))
        .bind(request_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Request".to_string()))?;

        row.into_view()
    }

    /// List requests newest first. Inventory controllers only see their own.
    pub async fn list_requests(
        &self,
        actor: &Actor,
        query: RequestQuery,
    ) -> AppResult<Vec<RequestView>> {
        let status = query
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<RequestStatus>)
            .transpose()?;
        let requested_by = actor.sees_only_own_requests().then_some(actor.id);

        let rows = sqlx::query_as::<_, RequestViewRow>(&format!(
            r#"
            SELECT {}, {} FROM requests r {}
            WHERE ($1::text IS NULL OR r.status = $1)
              AND ($2::uuid IS NULL OR r.requested_by = $2)
            ORDER BY r.created_at DESC
            "#,
            REQUEST_COLUMNS, REQUEST_VIEW_EXTRAS, REQUEST_VIEW_JOINS
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(requested_by)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(RequestViewRow::into_view).collect()
    }
}

async fn lock_request(conn: &mut sqlx::PgConnection, request_id: Uuid) -> AppResult<Request> {
    sqlx::query_as::<_, RequestRow>(&format!(
        "SELECT {} FROM requests r WHERE r.id = $1 FOR UPDATE",
        REQUEST_COLUMNS
    ))
    .bind(request_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Request".to_string()))?
    .into_domain()
}

async fn persist_transition(conn: &mut sqlx::PgConnection, request: &Request) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE requests
        SET status = $1, fulfilled_by = $2, fulfilled_at = $3, rejection_reason = $4,
            created_product_id = $5, updated_at = $6
        WHERE id = $7
        "#,
    )
    .bind(request.status.as_str())
    .bind(request.fulfilled_by)
    .bind(request.fulfilled_at)
    .bind(&request.rejection_reason)
    .bind(request.created_product_id)
    .bind(request.updated_at)
    .bind(request.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
