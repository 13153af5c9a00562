//! Common types used across the platform

use serde::{Deserialize, Serialize};

use crate::validation::{validate_latitude, validate_longitude};

/// A validated point on the earth's surface, in degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize)]
struct RawGeoPoint {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = &'static str;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.lat, raw.lng)
    }
}

impl GeoPoint {
    /// Build a point, rejecting NaN and out-of-range coordinates
    pub fn new(lat: f64, lng: f64) -> Result<Self, &'static str> {
        validate_latitude(lat)?;
        validate_longitude(lng)?;
        Ok(Self { lat, lng })
    }

    /// Great-circle distance to another point in kilometers
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        crate::geo::haversine_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Pickup location attached to a donation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DonationLocation {
    pub lat: f64,
    pub lng: f64,
    pub address: Option<String>,
}

impl DonationLocation {
    /// The validated coordinates, or `None` when the stored values are unusable
    pub fn point(&self) -> Option<GeoPoint> {
        GeoPoint::new(self.lat, self.lng).ok()
    }
}
