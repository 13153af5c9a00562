//! HTTP handlers for the admin dashboard

use axum::{extract::State, response::IntoResponse, Json};
use shared::UserRole;
use uuid::Uuid;

use crate::{
    error::AppResult, extract::AppPath, middleware::CurrentUser, services::AdminService, AppState,
};

/// Impact statistics
pub async fn get_stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[UserRole::Admin])?;
    let service = AdminService::new(state.store, state.users);
    Ok(Json(service.stats().await?))
}

/// Donations still in flight
pub async fn list_active_donations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[UserRole::Admin])?;
    let service = AdminService::new(state.store, state.users);
    Ok(Json(service.active_donations().await?))
}

/// Verify an NGO or volunteer account
pub async fn verify_user(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(user_id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[UserRole::Admin])?;
    let service = AdminService::new(state.store, state.users);
    Ok(Json(service.verify_user(user_id).await?))
}
