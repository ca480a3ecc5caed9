//! Dashboard handlers

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::dashboard::DashboardStats;
use crate::services::DashboardService;
use crate::AppState;

pub async fn get_stats(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<DashboardStats>> {
    let service = DashboardService::new(state.db.clone());
    Ok(Json(service.stats(&actor).await?))
}
