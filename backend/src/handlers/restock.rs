//! Restock handlers

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::RestockView;
use crate::services::restock::RecordRestockInput;
use crate::services::RestockService;
use crate::AppState;

pub async fn record_restock(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<RecordRestockInput>,
) -> AppResult<(StatusCode, Json<RestockView>)> {
    let service = RestockService::new(state.db.clone());
    let restock = service.record_restock(&actor, input).await?;

    Ok((StatusCode::CREATED, Json(restock)))
}

pub async fn list_restocks(State(state): State<AppState>) -> AppResult<Json<Vec<RestockView>>> {
    let service = RestockService::new(state.db.clone());
    Ok(Json(service.list_restocks().await?))
}
