//! Supplier catalogue handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::Supplier;
use crate::services::suppliers::SupplierInput;
use crate::services::SupplierService;
use crate::AppState;
use shared::MessageResponse;

pub async fn list_suppliers(State(state): State<AppState>) -> AppResult<Json<Vec<Supplier>>> {
    let service = SupplierService::new(state.db.clone());
    Ok(Json(service.list_suppliers().await?))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<SupplierInput>,
) -> AppResult<(StatusCode, Json<Supplier>)> {
    let service = SupplierService::new(state.db.clone());
    let supplier = service.create_supplier(&actor, input).await?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(supplier_id): Path<Uuid>,
    Json(input): Json<SupplierInput>,
) -> AppResult<Json<Supplier>> {
    let service = SupplierService::new(state.db.clone());
    Ok(Json(service.update_supplier(&actor, supplier_id, input).await?))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let service = SupplierService::new(state.db.clone());
    service.delete_supplier(&actor, supplier_id).await?;

    Ok(Json(MessageResponse::new("Supplier deleted")))
}
