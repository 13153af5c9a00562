//! Proximity filtering of open donations for a volunteer
//!
//! A pure read, filter and compute pipeline. Records with missing or unusable
//! coordinates are skipped rather than failing the query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Donation, DonationStatus};
use crate::types::GeoPoint;

/// Default search radius in kilometers
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// An available donation together with its distance from the volunteer
#[derive(Debug, Clone, Serialize)]
pub struct NearbyDonation {
    #[serde(flatten)]
    pub donation: Donation,
    pub distance_km: f64,
    /// Milliseconds left until best-before
    pub remaining_ms: i64,
}

/// Result ordering for proximity queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NearbyOrdering {
    /// Store order
    Unordered,
    /// Closest first, ties broken by earliest best-before
    #[default]
    Distance,
}

/// Keep pending, unexpired donations within `radius_km` (inclusive) of `origin`
pub fn filter_nearby(
    donations: impl IntoIterator<Item = Donation>,
    origin: GeoPoint,
    radius_km: f64,
    now: DateTime<Utc>,
    ordering: NearbyOrdering,
) -> Vec<NearbyDonation> {
    let mut nearby: Vec<NearbyDonation> = donations
        .into_iter()
        .filter(|d| d.status == DonationStatus::Pending)
        .filter(|d| !d.is_expired(now))
        .filter_map(|d| {
            let point = d.location.as_ref()?.point()?;
            let distance_km = origin.distance_km(&point);
            if distance_km <= radius_km {
                let remaining_ms = (d.best_before - now).num_milliseconds();
                Some(NearbyDonation {
                    donation: d,
                    distance_km,
                    remaining_ms,
                })
            } else {
                None
            }
        })
        .collect();

    if ordering == NearbyOrdering::Distance {
        nearby.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.donation.best_before.cmp(&b.donation.best_before))
        });
    }

    nearby
}
