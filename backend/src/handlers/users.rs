//! User administration handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::User;
use crate::services::users::UpdateUserInput;
use crate::services::UserService;
use crate::AppState;
use shared::MessageResponse;

pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<Vec<User>>> {
    let service = UserService::new(state.db.clone());
    Ok(Json(service.list_users(&actor).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(input): Json<UpdateUserInput>,
) -> AppResult<Json<User>> {
    let service = UserService::new(state.db.clone());
    Ok(Json(service.update_user(&actor, user_id, input).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let service = UserService::new(state.db.clone());
    service.delete_user(&actor, user_id).await?;

    Ok(Json(MessageResponse::new("User deleted")))
}
