//! In-memory store used for tests and local development
//!
//! Every check-and-write happens under one write-lock acquisition, which gives
//! the same atomicity as the single-statement updates of the Postgres store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use shared::{Donation, DonationStatus, Report, UserProfile};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ConditionalUpdate, DonationPatch, DonationStore, NewDonation, NewReport, Owner, OwnedUpdate,
    StoreResult, UserStore,
};

#[derive(Default)]
pub struct MemoryStore {
    donations: RwLock<HashMap<Uuid, Donation>>,
    users: RwLock<HashMap<Uuid, UserProfile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user, as the auth service would on sign-up
    pub async fn insert_user(&self, user: UserProfile) {
        self.users.write().await.insert(user.id, user);
    }
}

fn newest_first(mut donations: Vec<Donation>) -> Vec<Donation> {
    donations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    donations
}

#[async_trait]
impl DonationStore for MemoryStore {
    async fn create_donation(&self, new: NewDonation) -> StoreResult<Donation> {
        let now = Utc::now();
        let donation = Donation {
            id: new.id,
            title: new.title,
            food_type: new.food_type,
            quantity_kg: new.quantity_kg,
            best_before: new.best_before,
            image_url: new.image_url,
            proof_image_url: None,
            location: new.location,
            status: DonationStatus::Pending,
            donor_id: new.donor_id,
            volunteer_id: None,
            handover_code_hash: new.handover_code_hash,
            failed_code_attempts: 0,
            reports: vec![],
            created_at: now,
            updated_at: now,
        };

        self.donations
            .write()
            .await
            .insert(donation.id, donation.clone());
        Ok(donation)
    }

    async fn get_donation(&self, id: Uuid) -> StoreResult<Option<Donation>> {
        Ok(self.donations.read().await.get(&id).cloned())
    }

    async fn conditional_update(
        &self,
        id: Uuid,
        expected: DonationStatus,
        patch: DonationPatch,
    ) -> StoreResult<ConditionalUpdate> {
        let mut donations = self.donations.write().await;
        match donations.get_mut(&id) {
            Some(donation) if donation.status == expected && patch.admits(donation) => {
                patch.apply(donation, Utc::now());
                Ok(ConditionalUpdate::Applied(donation.clone()))
            }
            _ => Ok(ConditionalUpdate::Conflict),
        }
    }

    async fn update_owned(
        &self,
        id: Uuid,
        owner: Owner,
        allowed: &[DonationStatus],
        patch: DonationPatch,
    ) -> StoreResult<OwnedUpdate> {
        let mut donations = self.donations.write().await;
        let Some(donation) = donations.get_mut(&id) else {
            return Ok(OwnedUpdate::NotFound);
        };
        if !owner.owns(donation) {
            return Ok(OwnedUpdate::NotOwner);
        }
        if !allowed.is_empty() && !allowed.contains(&donation.status) {
            return Ok(OwnedUpdate::StatusMismatch(donation.status));
        }
        if !patch.admits(donation) {
            return Ok(OwnedUpdate::Locked);
        }

        patch.apply(donation, Utc::now());
        Ok(OwnedUpdate::Applied(donation.clone()))
    }

    async fn list_by_status(&self, statuses: &[DonationStatus]) -> StoreResult<Vec<Donation>> {
        let donations = self.donations.read().await;
        let matching = donations
            .values()
            .filter(|d| statuses.contains(&d.status))
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    async fn list_by_owner(&self, owner: Owner) -> StoreResult<Vec<Donation>> {
        let donations = self.donations.read().await;
        let owned = donations.values().filter(|d| owner.owns(d)).cloned().collect();
        Ok(newest_first(owned))
    }

    async fn append_report(&self, id: Uuid, report: NewReport) -> StoreResult<Option<Report>> {
        let mut donations = self.donations.write().await;
        let Some(donation) = donations.get_mut(&id) else {
            return Ok(None);
        };

        let report = Report {
            id: Uuid::new_v4(),
            reporter_id: report.reporter_id,
            reason: report.reason,
            created_at: Utc::now(),
        };
        donation.reports.push(report.clone());
        Ok(Some(report))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn mark_verified(&self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            user.verified_ngo = true;
            user.clone()
        }))
    }
}
