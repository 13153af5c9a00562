//! Impact statistics for the admin dashboard

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::donation::Donation;

/// Meals credited per kilogram of distributed food
pub const MEALS_PER_KG: i64 = 4;

/// Aggregate counts across all donations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactStats {
    pub total_donations: u64,
    pub active_count: u64,
    pub completed_count: u64,
    /// Kilograms across completed donations only
    pub total_kg: Decimal,
    pub meals_saved: Decimal,
}

impl ImpactStats {
    pub fn from_donations<'a>(donations: impl IntoIterator<Item = &'a Donation>) -> Self {
        let mut stats = ImpactStats {
            total_donations: 0,
            active_count: 0,
            completed_count: 0,
            total_kg: Decimal::ZERO,
            meals_saved: Decimal::ZERO,
        };

        for donation in donations {
            stats.total_donations += 1;
            if donation.status.is_active() {
                stats.active_count += 1;
            } else {
                stats.completed_count += 1;
                stats.total_kg += donation.quantity_kg;
            }
        }

        stats.meals_saved = stats.total_kg * Decimal::from(MEALS_PER_KG);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::models::donation::{DonationStatus, FoodType};

    fn donation(status: DonationStatus, kg: i64) -> Donation {
        let now = Utc::now();
        Donation {
            id: Uuid::new_v4(),
            title: "Rice".to_string(),
            food_type: FoodType::Cooked,
            quantity_kg: Decimal::from(kg),
            best_before: now + Duration::hours(3),
            image_url: None,
            proof_image_url: None,
            location: None,
            status,
            donor_id: Uuid::new_v4(),
            volunteer_id: status.requires_volunteer().then(Uuid::new_v4),
            handover_code_hash: String::new(),
            failed_code_attempts: 0,
            reports: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_empty_stats() {
        let stats = ImpactStats::from_donations(&Vec::<Donation>::new());
        assert_eq!(stats.total_donations, 0);
        assert_eq!(stats.total_kg, Decimal::ZERO);
        assert_eq!(stats.meals_saved, Decimal::ZERO);
    }

    #[test]
    fn test_only_completed_donations_count_towards_kg() {
        let donations = vec![
            donation(DonationStatus::Completed, 10),
            donation(DonationStatus::Pending, 7),
            donation(DonationStatus::Accepted, 3),
            donation(DonationStatus::Picked, 2),
            donation(DonationStatus::Completed, 5),
        ];

        let stats = ImpactStats::from_donations(&donations);
        assert_eq!(stats.total_donations, 5);
        assert_eq!(stats.completed_count, 2);
        assert_eq!(stats.active_count, 3);
        assert_eq!(stats.total_kg, Decimal::from(15));
        assert_eq!(stats.meals_saved, Decimal::from(60));
    }
}
