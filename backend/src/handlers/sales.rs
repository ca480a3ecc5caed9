//! Sale recording handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::SaleView;
use crate::services::sales::{RecordSaleInput, SalesQuery};
use crate::services::SalesService;
use crate::AppState;

/// Record a sale and decrement stock
pub async fn record_sale(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<RecordSaleInput>,
) -> AppResult<(StatusCode, Json<SaleView>)> {
    let service = SalesService::new(state.db.clone());
    let sale = service.record_sale(&actor, input).await?;

    Ok((StatusCode::CREATED, Json(sale)))
}

/// List sales, optionally for a single day
pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> AppResult<Json<Vec<SaleView>>> {
    let service = SalesService::new(state.db.clone());
    Ok(Json(service.list_sales(query).await?))
}
