//! Request workflow handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, OptionalJson};
use crate::models::{FulfillInput, RequestPayload, RequestView};
use crate::services::requests::{RejectInput, RequestQuery};
use crate::services::RequestService;
use crate::AppState;

/// List requests visible to the caller
pub async fn list_requests(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<RequestQuery>,
) -> AppResult<Json<Vec<RequestView>>> {
    let service = RequestService::new(state.db.clone());
    Ok(Json(service.list_requests(&actor, query).await?))
}

/// Raise a refill or new-product request
pub async fn create_request(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(payload): Json<RequestPayload>,
) -> AppResult<(StatusCode, Json<RequestView>)> {
    let service = RequestService::new(state.db.clone());
    let request = service.create_request(&actor, payload).await?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// Fulfill a pending request
pub async fn fulfill_request(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(request_id): Path<Uuid>,
    OptionalJson(input): OptionalJson<FulfillInput>,
) -> AppResult<Json<RequestView>> {
    let service = RequestService::new(state.db.clone());
    Ok(Json(service.fulfill_request(&actor, request_id, input).await?))
}

/// Reject a pending request
pub async fn reject_request(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(request_id): Path<Uuid>,
    OptionalJson(input): OptionalJson<RejectInput>,
) -> AppResult<Json<RequestView>> {
    let service = RequestService::new(state.db.clone());
    Ok(Json(service.reject_request(&actor, request_id, input).await?))
}
