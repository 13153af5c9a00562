//! Proximity matching of available donations for volunteers

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{filter_nearby, DonationStatus, GeoPoint, NearbyDonation, NearbyOrdering};
use uuid::Uuid;

use crate::config::{Config, MatchingConfig};
use crate::error::{AppError, AppResult};
use crate::store::{DonationStore, UserStore};

/// Matching service
#[derive(Clone)]
pub struct MatchingService {
    store: Arc<dyn DonationStore>,
    users: Arc<dyn UserStore>,
    config: MatchingConfig,
}

/// Query parameters for a nearby search
#[derive(Debug, Default, Deserialize)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(alias = "radiusKm")]
    pub radius_km: Option<f64>,
}

impl MatchingService {
    pub fn new(store: Arc<dyn DonationStore>, users: Arc<dyn UserStore>, config: &Config) -> Self {
        Self {
            store,
            users,
            config: config.matching.clone(),
        }
    }

    /// Pending, unexpired donations within the requested radius of the volunteer
    pub async fn find_nearby(
        &self,
        volunteer_id: Uuid,
        query: NearbyQuery,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<NearbyDonation>> {
        let radius_km = query.radius_km.unwrap_or(self.config.default_radius_km);
        shared::validate_radius(radius_km, self.config.max_radius_km)
            .map_err(|m| AppError::validation("radius_km", m))?;

        let origin = self.resolve_origin(volunteer_id, &query).await?;

        let ordering = if self.config.sort_by_distance {
            NearbyOrdering::Distance
        } else {
            NearbyOrdering::Unordered
        };

        let pending = self.store.list_by_status(&[DonationStatus::Pending]).await?;
        let candidates = pending.len();
        let nearby = filter_nearby(pending, origin, radius_km, now, ordering);

        tracing::debug!(
            volunteer_id = %volunteer_id,
            radius_km,
            candidates,
            matched = nearby.len(),
            "Nearby search"
        );

        Ok(nearby)
    }

    /// Explicit coordinates win; otherwise fall back to the volunteer's registered location
    async fn resolve_origin(&self, volunteer_id: Uuid, query: &NearbyQuery) -> AppResult<GeoPoint> {
        match (query.lat, query.lng) {
            (Some(lat), Some(lng)) => {
                GeoPoint::new(lat, lng).map_err(|m| AppError::validation("location", m))
            }
            (None, None) => self
                .users
                .get_user(volunteer_id)
                .await?
                .and_then(|user| user.location)
                .ok_or_else(|| {
                    AppError::validation(
                        "location",
                        "lat and lng are required when no location is registered",
                    )
                }),
            _ => Err(AppError::validation(
                "location",
                "Latitude and longitude must be given together",
            )),
        }
    }
}
