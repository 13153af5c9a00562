//! Donation models and the donation lifecycle state machine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::DonationLocation;

/// A single posted unit of surplus food
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    pub title: String,
    pub food_type: FoodType,
    pub quantity_kg: Decimal,
    pub best_before: DateTime<Utc>,
    /// Food photo reference from the media store
    pub image_url: Option<String>,
    /// Distribution proof photo reference
    pub proof_image_url: Option<String>,
    pub location: Option<DonationLocation>,
    pub status: DonationStatus,
    pub donor_id: Uuid,
    pub volunteer_id: Option<Uuid>,
    /// Keyed hash of the handover code; the plaintext is never stored
    #[serde(skip_serializing, default)]
    pub handover_code_hash: String,
    #[serde(skip_serializing, default)]
    pub failed_code_attempts: i32,
    pub reports: Vec<Report>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Donation {
    /// Expired once `now` reaches the best-before time
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.best_before <= now
    }

    pub fn is_assigned_to(&self, volunteer_id: Uuid) -> bool {
        self.volunteer_id == Some(volunteer_id)
    }
}

/// Category of donated food
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FoodType {
    #[serde(rename = "veg", alias = "vegetarian")]
    Vegetarian,
    #[serde(rename = "non-veg", alias = "non_vegetarian")]
    NonVegetarian,
    #[serde(rename = "cooked")]
    Cooked,
}

impl FoodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodType::Vegetarian => "veg",
            FoodType::NonVegetarian => "non-veg",
            FoodType::Cooked => "cooked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "veg" => Some(FoodType::Vegetarian),
            "non-veg" => Some(FoodType::NonVegetarian),
            "cooked" => Some(FoodType::Cooked),
            _ => None,
        }
    }
}

/// Lifecycle state of a donation.
///
/// Transitions only move forward: pending → accepted → picked → completed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    Pending,
    Accepted,
    Picked,
    Completed,
}

impl DonationStatus {
    pub const ALL: [DonationStatus; 4] = [
        DonationStatus::Pending,
        DonationStatus::Accepted,
        DonationStatus::Picked,
        DonationStatus::Completed,
    ];

    /// States counted as "active" on the admin dashboard
    pub const ACTIVE: [DonationStatus; 3] = [
        DonationStatus::Pending,
        DonationStatus::Accepted,
        DonationStatus::Picked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Accepted => "accepted",
            DonationStatus::Picked => "picked",
            DonationStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DonationStatus::Pending),
            "accepted" => Some(DonationStatus::Accepted),
            "picked" => Some(DonationStatus::Picked),
            "completed" => Some(DonationStatus::Completed),
            _ => None,
        }
    }

    /// The single legal successor state
    pub fn next(&self) -> Option<DonationStatus> {
        match self {
            DonationStatus::Pending => Some(DonationStatus::Accepted),
            DonationStatus::Accepted => Some(DonationStatus::Picked),
            DonationStatus::Picked => Some(DonationStatus::Completed),
            DonationStatus::Completed => None,
        }
    }

    pub fn can_transition_to(&self, target: DonationStatus) -> bool {
        self.next() == Some(target)
    }

    /// States whose legal successor is `self`
    pub fn predecessors(&self) -> Vec<DonationStatus> {
        DonationStatus::ALL
            .into_iter()
            .filter(|s| s.can_transition_to(*self))
            .collect()
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, DonationStatus::Completed)
    }

    /// A volunteer is assigned in every state after pending
    pub fn requires_volunteer(&self) -> bool {
        !matches!(self, DonationStatus::Pending)
    }
}

impl std::fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An append-only incident note attached to a donation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
