//! Cross-role requests and their fulfillment workflow
//!
//! A request is raised as `pending` and moves exactly once to either
//! `fulfilled` or `rejected`. Fulfilling a refill restocks an existing product;
//! fulfilling a new-product request creates the product. The side effect is
//! described by a [`FulfillmentPlan`] so the caller can run it in the same
//! transaction as the status change.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::{NewProduct, ProductSummary, UserSummary};
use crate::access::{AccessDenied, Operation};
use crate::types::Actor;
use crate::validation::{
    non_negative_count, require_positive_quantity, require_text, validate_price,
    ValidationError, ValidationResult,
};

/// Request lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Fulfilled,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Fulfilled => "fulfilled",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl FromStr for RequestStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "fulfilled" => Ok(RequestStatus::Fulfilled),
            "rejected" => Ok(RequestStatus::Rejected),
            _ => Err(ValidationError::new(
                "status",
                "Status must be pending, fulfilled or rejected",
            )),
        }
    }
}

/// Fields of a refill request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefillDetails {
    pub product_id: Uuid,
    pub quantity_requested: i32,
}

/// Suggested attributes of a product that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProductDetails {
    pub product_name: String,
    pub description: String,
    pub category: String,
    pub suggested_price: Option<Decimal>,
    pub suggested_quantity: i32,
    pub suggested_min_threshold: i32,
}

impl NewProductDetails {
    /// Product to create on fulfillment; an unset price becomes 0
    pub fn to_new_product(&self) -> NewProduct {
        NewProduct {
            product_name: self.product_name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            price: self.suggested_price.unwrap_or(Decimal::ZERO),
            quantity: self.suggested_quantity,
            min_threshold: self.suggested_min_threshold,
        }
    }
}

/// The two request variants. Exactly one field group exists per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestKind {
    Refill(RefillDetails),
    NewProduct(NewProductDetails),
}

impl RequestKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            RequestKind::Refill(_) => "refill",
            RequestKind::NewProduct(_) => "new_product",
        }
    }

    /// Validate a client payload into a request variant
    pub fn from_payload(payload: &RequestPayload) -> ValidationResult<Self> {
        match payload.request_type.as_deref() {
            Some("refill") => {
                const MSG: &str = "productId and quantityRequested (min 1) required for refill";
                let product_id = payload
                    .product_id
                    .ok_or_else(|| ValidationError::new("productId", MSG))?;
                let quantity_requested =
                    require_positive_quantity("quantityRequested", payload.quantity_requested, MSG)?;
                Ok(RequestKind::Refill(RefillDetails {
                    product_id,
                    quantity_requested,
                }))
            }
            Some("new_product") => {
                let product_name = require_text(
                    "productName",
                    payload.product_name.as_deref(),
                    "productName required for new product request",
                )?;
                let suggested_price = payload
                    .suggested_price
                    .map(|p| validate_price("suggestedPrice", p))
                    .transpose()?;
                Ok(RequestKind::NewProduct(NewProductDetails {
                    product_name,
                    description: payload.description.clone().unwrap_or_default(),
                    category: payload.category.clone().unwrap_or_default(),
                    suggested_price,
                    suggested_quantity: non_negative_count(
                        "suggestedQuantity",
                        payload.suggested_quantity,
                    )?,
                    suggested_min_threshold: non_negative_count(
                        "suggestedMinThreshold",
                        payload.suggested_min_threshold,
                    )?,
                }))
            }
            _ => Err(ValidationError::new(
                "type",
                "Type must be refill or new_product",
            )),
        }
    }
}

/// Client payload for raising a request. Every field is optional so that
/// validation can report exactly what is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    #[serde(rename = "type")]
    pub request_type: Option<String>,
    pub product_id: Option<Uuid>,
    pub quantity_requested: Option<i64>,
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub suggested_price: Option<Decimal>,
    pub suggested_quantity: Option<i64>,
    pub suggested_min_threshold: Option<i64>,
    pub note: Option<String>,
}

/// Client payload for fulfilling a request. Ignored for new-product requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillInput {
    pub supplier_id: Option<Uuid>,
    pub quantity_added: Option<i64>,
}

/// Side effect that must commit together with a fulfillment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentPlan {
    Restock {
        product_id: Uuid,
        supplier_id: Uuid,
        quantity: i32,
    },
    CreateProduct(NewProduct),
}

/// Workflow failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Request is not pending")]
    NotPending { status: RequestStatus },

    #[error(transparent)]
    Forbidden(#[from] AccessDenied),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Quantity a refill is fulfilled with: the explicit amount when it is at
/// least 1, otherwise the amount originally requested.
pub fn effective_refill_quantity(requested: i32, added: Option<i64>) -> Option<i32> {
    match added {
        Some(a) if a >= 1 => i32::try_from(a).ok(),
        _ if requested >= 1 => Some(requested),
        _ => None,
    }
}

/// A cross-role request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: RequestKind,
    pub note: String,
    pub requested_by: Uuid,
    pub status: RequestStatus,
    pub fulfilled_by: Option<Uuid>,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    /// Product created when a new-product request was fulfilled
    pub created_product_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Request {
    /// A freshly raised request
    pub fn new_pending(
        id: Uuid,
        kind: RequestKind,
        note: String,
        requested_by: Uuid,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            note,
            requested_by,
            status: RequestStatus::Pending,
            fulfilled_by: None,
            fulfilled_at: None,
            rejection_reason: None,
            created_product_id: None,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub fn ensure_pending(&self) -> Result<(), RequestError> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(RequestError::NotPending {
                status: self.status,
            })
        }
    }

    /// Work out the side effect of fulfilling this request.
    ///
    /// Checks role, state and input, in that order. Nothing is mutated.
    pub fn plan_fulfillment(
        &self,
        actor: &Actor,
        input: &FulfillInput,
    ) -> Result<FulfillmentPlan, RequestError> {
        actor.authorize(Operation::FulfillRequest)?;
        self.ensure_pending()?;

        match &self.kind {
            RequestKind::Refill(details) => {
                const MSG: &str = "supplierId and quantityAdded (min 1) required";
                let supplier_id = input
                    .supplier_id
                    .ok_or_else(|| ValidationError::new("supplierId", MSG))?;
                let quantity =
                    effective_refill_quantity(details.quantity_requested, input.quantity_added)
                        .ok_or_else(|| ValidationError::new("quantityAdded", MSG))?;
                Ok(FulfillmentPlan::Restock {
                    product_id: details.product_id,
                    supplier_id,
                    quantity,
                })
            }
            RequestKind::NewProduct(details) => {
                Ok(FulfillmentPlan::CreateProduct(details.to_new_product()))
            }
        }
    }

    /// Move to `fulfilled`. Call only after the planned side effect succeeded.
    pub fn fulfill(
        &mut self,
        actor: &Actor,
        at: DateTime<Utc>,
        created_product_id: Option<Uuid>,
    ) -> Result<(), RequestError> {
        actor.authorize(Operation::FulfillRequest)?;
        self.ensure_pending()?;

        self.status = RequestStatus::Fulfilled;
        self.fulfilled_by = Some(actor.id);
        self.fulfilled_at = Some(at);
        if matches!(self.kind, RequestKind::NewProduct(_)) {
            self.created_product_id = created_product_id;
        }
        self.updated_at = at;
        Ok(())
    }

    /// Move to `rejected`; a missing reason is stored as an empty string
    pub fn reject(
        &mut self,
        actor: &Actor,
        at: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<(), RequestError> {
        actor.authorize(Operation::RejectRequest)?;
        self.ensure_pending()?;

        self.status = RequestStatus::Rejected;
        self.fulfilled_by = Some(actor.id);
        self.fulfilled_at = Some(at);
        self.rejection_reason = Some(reason.unwrap_or_default());
        self.updated_at = at;
        Ok(())
    }
}

/// Request with product, requester and fulfiller resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    #[serde(flatten)]
    pub request: Request,
    pub product: Option<ProductSummary>,
    pub requester: Option<UserSummary>,
    pub fulfiller: Option<UserSummary>,
}
