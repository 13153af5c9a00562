//! Route definitions for the Food Rescue Network

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Protected routes - donation workflow
        .nest("/donations", donation_routes(state.clone()))
        // Protected routes - admin dashboard
        .nest("/admin", admin_routes(state))
}

/// Donation routes (protected)
fn donation_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_donation))
        .route("/my", get(handlers::list_my_donations))
        .route("/claimed", get(handlers::list_claimed_donations))
        .route("/nearby", get(handlers::list_nearby_donations))
        .route("/:donation_id/accept", post(handlers::accept_donation))
        .route("/:donation_id/picked", post(handlers::mark_picked))
        .route("/:donation_id/verify-code", post(handlers::verify_handover))
        .route("/:donation_id/proof", post(handlers::attach_proof))
        .route("/:donation_id/report", post(handlers::report_donation))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Admin routes (protected)
fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stats", get(handlers::get_stats))
        .route("/active-donations", get(handlers::list_active_donations))
        .route("/verify-user/:user_id", post(handlers::verify_user))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
