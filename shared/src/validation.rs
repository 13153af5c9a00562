//! Validation utilities for the Food Rescue Network
//!
//! Boundary checks applied before any input reaches the lifecycle engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Maximum length of a donation title
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum length of a report reason
pub const MAX_REPORT_REASON_LEN: usize = 1000;

// ============================================================================
// Location Validations
// ============================================================================

/// Validate latitude is a finite value in [-90, 90]
pub fn validate_latitude(lat: f64) -> Result<(), &'static str> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err("Latitude must be between -90 and 90");
    }
    Ok(())
}

/// Validate longitude is a finite value in [-180, 180]
pub fn validate_longitude(lng: f64) -> Result<(), &'static str> {
    if !(-180.0..=180.0).contains(&lng) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

/// Validate a search radius against the configured ceiling
pub fn validate_radius(radius_km: f64, max_radius_km: f64) -> Result<(), &'static str> {
    if radius_km.is_nan() || radius_km <= 0.0 {
        return Err("Radius must be greater than 0");
    }
    if radius_km > max_radius_km {
        return Err("Radius exceeds the maximum search distance");
    }
    Ok(())
}

// ============================================================================
// Donation Validations
// ============================================================================

/// Validate a donation title is present and reasonably short
pub fn validate_title(title: &str) -> Result<(), &'static str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err("Title is required");
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err("Title must be at most 200 characters");
    }
    Ok(())
}

/// Validate quantity in kilograms is strictly positive
pub fn validate_quantity_kg(quantity_kg: Decimal) -> Result<(), &'static str> {
    if quantity_kg <= Decimal::ZERO {
        return Err("Quantity must be greater than 0 kg");
    }
    Ok(())
}

/// Validate a best-before timestamp lies in the future
pub fn validate_best_before(best_before: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), &'static str> {
    if best_before <= now {
        return Err("Best-before time must be in the future");
    }
    Ok(())
}

/// Validate a report reason
pub fn validate_report_reason(reason: &str) -> Result<(), &'static str> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err("Reason is required");
    }
    if trimmed.chars().count() > MAX_REPORT_REASON_LEN {
        return Err("Reason must be at most 1000 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(90.0001).is_err());
        assert!(validate_latitude(f64::NAN).is_err());
        assert!(validate_latitude(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(77.6).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(181.0).is_err());
        assert!(validate_longitude(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_radius() {
        assert!(validate_radius(5.0, 50.0).is_ok());
        assert!(validate_radius(50.0, 50.0).is_ok());
        assert!(validate_radius(0.0, 50.0).is_err());
        assert!(validate_radius(-1.0, 50.0).is_err());
        assert!(validate_radius(f64::NAN, 50.0).is_err());
        assert!(validate_radius(51.0, 50.0).is_err());
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Leftover biryani").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity_kg(Decimal::new(5, 1)).is_ok());
        assert!(validate_quantity_kg(Decimal::ZERO).is_err());
        assert!(validate_quantity_kg(Decimal::from(-3)).is_err());
    }

    #[test]
    fn test_validate_best_before() {
        let now = Utc::now();
        assert!(validate_best_before(now + Duration::hours(2), now).is_ok());
        assert!(validate_best_before(now, now).is_err());
        assert!(validate_best_before(now - Duration::minutes(1), now).is_err());
    }

    #[test]
    fn test_validate_report_reason() {
        assert!(validate_report_reason("Food smelled spoiled").is_ok());
        assert!(validate_report_reason("").is_err());
        assert!(validate_report_reason(&"a".repeat(1001)).is_err());
    }
}
