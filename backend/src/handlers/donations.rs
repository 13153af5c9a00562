//! HTTP handlers for the donation workflow

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;
use shared::UserRole;
use uuid::Uuid;

use crate::{
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::CurrentUser,
    services::{
        donation::{AttachProofInput, CreateDonationInput, VerifyHandoverInput},
        matching::NearbyQuery,
        reporting::ReportInput,
        DonationService, MatchingService, ReportingService,
    },
    AppState,
};

/// Donor: post a donation
pub async fn create_donation(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(input): AppJson<CreateDonationInput>,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[UserRole::Donor])?;
    let service = DonationService::new(state.store, &state.config);
    let created = service.create(user.user_id, input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Donor: my donations, newest first
pub async fn list_my_donations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[UserRole::Donor])?;
    let service = DonationService::new(state.store, &state.config);
    Ok(Json(service.list_for_donor(user.user_id).await?))
}

/// Volunteer: donations I have claimed
pub async fn list_claimed_donations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[UserRole::Volunteer])?;
    let service = DonationService::new(state.store, &state.config);
    Ok(Json(service.list_for_volunteer(user.user_id).await?))
}

/// Volunteer: available donations within a radius (default 5 km)
pub async fn list_nearby_donations(
    State(state): State<AppState>,
    user: CurrentUser,
    AppQuery(query): AppQuery<NearbyQuery>,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[UserRole::Volunteer])?;
    let service = MatchingService::new(state.store, state.users, &state.config);
    Ok(Json(service.find_nearby(user.user_id, query, Utc::now()).await?))
}

/// Volunteer: claim a donation, first come first served
pub async fn accept_donation(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(donation_id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[UserRole::Volunteer])?;
    let service = DonationService::new(state.store, &state.config);
    Ok(Json(service.claim(donation_id, user.user_id).await?))
}

/// Volunteer: mark as picked up
pub async fn mark_picked(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(donation_id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[UserRole::Volunteer])?;
    let service = DonationService::new(state.store, &state.config);
    Ok(Json(service.mark_picked(donation_id, user.user_id).await?))
}

/// Volunteer: verify the handover code and complete
pub async fn verify_handover(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(donation_id): AppPath<Uuid>,
    AppJson(input): AppJson<VerifyHandoverInput>,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[UserRole::Volunteer])?;
    let service = DonationService::new(state.store, &state.config);
    let donation = service
        .verify_handover(donation_id, user.user_id, input)
        .await?;
    Ok(Json(json!({
        "message": "Handover verified, donation completed",
        "donation": donation,
    })))
}

/// Volunteer: attach proof of distribution
pub async fn attach_proof(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(donation_id): AppPath<Uuid>,
    AppJson(input): AppJson<AttachProofInput>,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[UserRole::Volunteer])?;
    let service = DonationService::new(state.store, &state.config);
    Ok(Json(
        service
            .attach_proof(donation_id, user.user_id, input)
            .await?,
    ))
}

/// Any authenticated caller: report spoiled food or a no-show
pub async fn report_donation(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(donation_id): AppPath<Uuid>,
    AppJson(input): AppJson<ReportInput>,
) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.store);
    let report = service.report(donation_id, user.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Report submitted", "report": report })),
    ))
}
