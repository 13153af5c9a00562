//! Store adapters for donations and the users they reference
//!
//! The durable store is the only shared mutable resource. Claiming relies on
//! [`DonationStore::conditional_update`] being a single atomic
//! compare-and-set against the current status.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{Donation, DonationLocation, DonationStatus, FoodType, Report, UserProfile};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Fields for inserting a new donation
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub id: Uuid,
    pub title: String,
    pub food_type: FoodType,
    pub quantity_kg: Decimal,
    pub best_before: DateTime<Utc>,
    pub image_url: Option<String>,
    pub location: Option<DonationLocation>,
    pub donor_id: Uuid,
    pub handover_code_hash: String,
}

/// Partial update applied by the store in one write
#[derive(Debug, Clone, Default)]
pub struct DonationPatch {
    pub status: Option<DonationStatus>,
    pub volunteer_id: Option<Uuid>,
    pub proof_image_url: Option<String>,
    /// Increment the failed handover attempt counter
    pub record_failed_attempt: bool,
    /// Only apply while the failed attempt counter is below this ceiling
    pub attempts_below: Option<i32>,
}

impl DonationPatch {
    pub fn status(status: DonationStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_volunteer(mut self, volunteer_id: Uuid) -> Self {
        self.volunteer_id = Some(volunteer_id);
        self
    }

    pub fn proof(url: String) -> Self {
        Self {
            proof_image_url: Some(url),
            ..Default::default()
        }
    }

    pub fn failed_attempt() -> Self {
        Self {
            record_failed_attempt: true,
            ..Default::default()
        }
    }

    pub fn below_attempts(mut self, ceiling: i32) -> Self {
        self.attempts_below = Some(ceiling);
        self
    }

    /// Whether the attempt ceiling, if any, still admits this record
    pub(crate) fn admits(&self, donation: &Donation) -> bool {
        match self.attempts_below {
            Some(ceiling) => donation.failed_code_attempts < ceiling,
            None => true,
        }
    }

    /// Apply to an in-memory record
    pub(crate) fn apply(self, donation: &mut Donation, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            donation.status = status;
        }
        if let Some(volunteer_id) = self.volunteer_id {
            donation.volunteer_id = Some(volunteer_id);
        }
        if let Some(url) = self.proof_image_url {
            donation.proof_image_url = Some(url);
        }
        if self.record_failed_attempt {
            donation.failed_code_attempts += 1;
        }
        donation.updated_at = now;
    }
}

/// Which ownership field scopes a query or update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Donor(Uuid),
    Volunteer(Uuid),
}

impl Owner {
    pub fn column(&self) -> &'static str {
        match self {
            Owner::Donor(_) => "donor_id",
            Owner::Volunteer(_) => "volunteer_id",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Owner::Donor(id) | Owner::Volunteer(id) => *id,
        }
    }

    pub fn owns(&self, donation: &Donation) -> bool {
        match self {
            Owner::Donor(id) => donation.donor_id == *id,
            Owner::Volunteer(id) => donation.volunteer_id == Some(*id),
        }
    }
}

/// Outcome of a status-conditioned update
#[derive(Debug)]
pub enum ConditionalUpdate {
    Applied(Donation),
    /// The record is missing, no longer in the expected status, or past the
    /// patch's attempt ceiling
    Conflict,
}

/// Outcome of an owner-scoped update
#[derive(Debug)]
pub enum OwnedUpdate {
    Applied(Donation),
    NotFound,
    NotOwner,
    /// Owner matched but the status guard did not
    StatusMismatch(DonationStatus),
    /// Owner and status matched but the attempt ceiling was reached
    Locked,
}

/// A report to append
#[derive(Debug, Clone)]
pub struct NewReport {
    pub reporter_id: Uuid,
    pub reason: String,
}

#[async_trait]
pub trait DonationStore: Send + Sync {
    async fn create_donation(&self, new: NewDonation) -> StoreResult<Donation>;

    async fn get_donation(&self, id: Uuid) -> StoreResult<Option<Donation>>;

    /// Atomically apply `patch` iff the donation is currently in `expected`
    async fn conditional_update(
        &self,
        id: Uuid,
        expected: DonationStatus,
        patch: DonationPatch,
    ) -> StoreResult<ConditionalUpdate>;

    /// Apply `patch` iff `owner` matches, the current status is one of
    /// `allowed` (any status when empty) and the patch's attempt ceiling
    /// admits the record, all in one atomic step
    async fn update_owned(
        &self,
        id: Uuid,
        owner: Owner,
        allowed: &[DonationStatus],
        patch: DonationPatch,
    ) -> StoreResult<OwnedUpdate>;

    async fn list_by_status(&self, statuses: &[DonationStatus]) -> StoreResult<Vec<Donation>>;

    /// Newest first
    async fn list_by_owner(&self, owner: Owner) -> StoreResult<Vec<Donation>>;

    /// Returns `None` when the donation does not exist
    async fn append_report(&self, id: Uuid, report: NewReport) -> StoreResult<Option<Report>>;

    async fn ping(&self) -> StoreResult<()>;
}

/// Read access to users owned by the auth collaborator
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<UserProfile>>;

    /// Set the verified NGO flag; `None` when the user does not exist
    async fn mark_verified(&self, id: Uuid) -> StoreResult<Option<UserProfile>>;
}
