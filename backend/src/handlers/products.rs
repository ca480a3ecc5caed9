//! Product catalogue handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::ProductListing;
use crate::services::products::{CreateProductInput, UpdateProductInput};
use crate::services::ProductService;
use crate::AppState;
use shared::MessageResponse;

/// List all products with their stock status
pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<ProductListing>>> {
    let service = ProductService::new(state.db.clone());
    Ok(Json(service.list_products().await?))
}

/// Products below their minimum threshold
pub async fn list_low_stock(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ProductListing>>> {
    let service = ProductService::new(state.db.clone());
    Ok(Json(service.list_low_stock().await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<ProductListing>)> {
    let service = ProductService::new(state.db.clone());
    let product = service.create_product(&actor, input).await?;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<ProductListing>> {
    let service = ProductService::new(state.db.clone());
    Ok(Json(service.update_product(&actor, product_id, input).await?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let service = ProductService::new(state.db.clone());
    service.delete_product(&actor, product_id).await?;

    Ok(Json(MessageResponse::new("Product deleted")))
}
