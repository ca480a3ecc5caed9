//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::User;
use crate::services::auth::{AuthResponse, LoginInput, RegisterInput};
use crate::services::AuthService;
use crate::AppState;

#[derive(Serialize)]
pub struct MeResponse {
    pub user: User,
}

/// Register endpoint handler
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let response = auth_service.register(body).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginInput>,
) -> AppResult<Json<AuthResponse>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let response = auth_service.login(body).await?;

    Ok(Json(response))
}

/// Current account
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<MeResponse>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let user = auth_service.current_user(actor.id).await?;

    Ok(Json(MeResponse { user }))
}
