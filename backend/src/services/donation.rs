//! Donation lifecycle service
//!
//! Enforces pending → accepted → picked → completed. Claiming is a single
//! conditional update in the store; every later step is scoped to the
//! volunteer who won the claim.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{Donation, DonationLocation, DonationStatus, FoodType, GeoPoint};
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::handover::{HandoverCodes, SubmittedCode};
use crate::store::{ConditionalUpdate, DonationPatch, DonationStore, NewDonation, Owner, OwnedUpdate};

/// Donation service for the donor and volunteer workflow
#[derive(Clone)]
pub struct DonationService {
    store: Arc<dyn DonationStore>,
    codes: HandoverCodes,
    max_failed_attempts: i32,
    allow_completion_from_accepted: bool,
}

/// Input for posting a donation
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateDonationInput {
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: Option<String>,
    #[serde(alias = "type")]
    pub food_type: Option<FoodType>,
    #[serde(alias = "quantityKg")]
    pub quantity_kg: Option<Decimal>,
    #[serde(alias = "bestBefore")]
    pub best_before: Option<DateTime<Utc>>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[validate(length(max = 500, message = "Address must be at most 500 characters"))]
    pub address: Option<String>,
    #[serde(alias = "imageUrl")]
    #[validate(length(min = 1, max = 2048, message = "Image URL must be 1-2048 characters"))]
    pub image_url: Option<String>,
}

/// A freshly created donation with its handover code.
///
/// The code is only ever returned here; the store keeps a hash.
#[derive(Debug, Serialize)]
pub struct CreatedDonation {
    #[serde(flatten)]
    pub donation: Donation,
    pub handover_code: u16,
}

/// Input for verifying the handover code
#[derive(Debug, Deserialize)]
pub struct VerifyHandoverInput {
    #[serde(alias = "otp")]
    pub code: SubmittedCode,
}

/// Input for attaching a proof-of-distribution photo
#[derive(Debug, Deserialize, Validate)]
pub struct AttachProofInput {
    #[serde(alias = "proofImageUrl")]
    #[validate(length(min = 1, max = 2048, message = "Proof image URL must be 1-2048 characters"))]
    pub proof_image_url: String,
}

impl DonationService {
    /// Create a new DonationService instance
    pub fn new(store: Arc<dyn DonationStore>, config: &Config) -> Self {
        Self {
            store,
            codes: HandoverCodes::new(config.handover.secret.clone()),
            max_failed_attempts: config.handover.max_failed_attempts,
            allow_completion_from_accepted: config.handover.allow_completion_from_accepted,
        }
    }

    /// Post a new donation in the pending state
    pub async fn create(
        &self,
        donor_id: Uuid,
        input: CreateDonationInput,
        now: DateTime<Utc>,
    ) -> AppResult<CreatedDonation> {
        input.validate()?;

        let title = input
            .title
            .ok_or_else(|| AppError::validation("title", "Title is required"))?;
        shared::validate_title(&title).map_err(|m| AppError::validation("title", m))?;

        let food_type = input
            .food_type
            .ok_or_else(|| AppError::validation("food_type", "Food type is required"))?;

        let quantity_kg = input
            .quantity_kg
            .ok_or_else(|| AppError::validation("quantity_kg", "Quantity is required"))?;
        shared::validate_quantity_kg(quantity_kg).map_err(|m| AppError::validation("quantity_kg", m))?;

        let best_before = input
            .best_before
            .ok_or_else(|| AppError::validation("best_before", "Best-before time is required"))?;
        shared::validate_best_before(best_before, now)
            .map_err(|m| AppError::validation("best_before", m))?;

        let location = match (input.lat, input.lng) {
            (Some(lat), Some(lng)) => {
                let point = GeoPoint::new(lat, lng).map_err(|m| AppError::validation("location", m))?;
                Some(DonationLocation {
                    lat: point.lat,
                    lng: point.lng,
                    address: input.address.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
                })
            }
            (None, None) => None,
            _ => {
                return Err(AppError::validation(
                    "location",
                    "Latitude and longitude must be given together",
                ))
            }
        };

        let id = Uuid::new_v4();
        let handover_code = self.codes.generate();
        let handover_code_hash = self.codes.hash(id, handover_code)?;

        let donation = self
            .store
            .create_donation(NewDonation {
                id,
                title: title.trim().to_string(),
                food_type,
                quantity_kg,
                best_before,
                image_url: input.image_url,
                location,
                donor_id,
                handover_code_hash,
            })
            .await?;

        tracing::info!(donation_id = %donation.id, donor_id = %donor_id, "Donation posted");

        Ok(CreatedDonation {
            donation,
            handover_code,
        })
    }

    /// Donations posted by a donor, newest first
    pub async fn list_for_donor(&self, donor_id: Uuid) -> AppResult<Vec<Donation>> {
        Ok(self.store.list_by_owner(Owner::Donor(donor_id)).await?)
    }

    /// Donations claimed by a volunteer, newest first
    pub async fn list_for_volunteer(&self, volunteer_id: Uuid) -> AppResult<Vec<Donation>> {
        Ok(self.store.list_by_owner(Owner::Volunteer(volunteer_id)).await?)
    }

    /// First-come first-served claim of a pending donation.
    ///
    /// A missing donation is reported as a lost claim too: either way the
    /// caller should refresh its view of what is still available.
    pub async fn claim(&self, donation_id: Uuid, volunteer_id: Uuid) -> AppResult<Donation> {
        let patch = DonationPatch::status(DonationStatus::Accepted).with_volunteer(volunteer_id);

        match self
            .store
            .conditional_update(donation_id, DonationStatus::Pending, patch)
            .await?
        {
            ConditionalUpdate::Applied(donation) => {
                tracing::info!(
                    donation_id = %donation_id,
                    volunteer_id = %volunteer_id,
                    status = %donation.status,
                    "Donation claimed"
                );
                Ok(donation)
            }
            ConditionalUpdate::Conflict => {
                tracing::warn!(donation_id = %donation_id, volunteer_id = %volunteer_id, "Claim lost");
                Err(AppError::ClaimConflict)
            }
        }
    }

    /// accepted → picked, by the assigned volunteer only
    pub async fn mark_picked(&self, donation_id: Uuid, volunteer_id: Uuid) -> AppResult<Donation> {
        let outcome = self
            .store
            .update_owned(
                donation_id,
                Owner::Volunteer(volunteer_id),
                &DonationStatus::Picked.predecessors(),
                DonationPatch::status(DonationStatus::Picked),
            )
            .await?;

        let donation = applied(outcome, "mark as picked")?;
        tracing::info!(
            donation_id = %donation_id,
            volunteer_id = %volunteer_id,
            status = %donation.status,
            "Donation picked up"
        );
        Ok(donation)
    }

    fn completable_from(&self) -> Vec<DonationStatus> {
        let mut allowed = DonationStatus::Completed.predecessors();
        if self.allow_completion_from_accepted {
            allowed.push(DonationStatus::Accepted);
        }
        allowed
    }

    /// Complete a donation once the in-person handover code matches
    pub async fn verify_handover(
        &self,
        donation_id: Uuid,
        volunteer_id: Uuid,
        input: VerifyHandoverInput,
    ) -> AppResult<Donation> {
        let donation = self
            .store
            .get_donation(donation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Donation".to_string()))?;

        if !donation.is_assigned_to(volunteer_id) {
            return Err(AppError::NotOwner);
        }

        let allowed = self.completable_from();
        if !allowed.contains(&donation.status) {
            return Err(transition_error(donation.status, "verify the handover code"));
        }

        // Fast path only; the guarded updates below are what enforce the lock
        if donation.failed_code_attempts >= self.max_failed_attempts {
            tracing::warn!(donation_id = %donation_id, "Handover verification locked");
            return Err(AppError::HandoverLocked);
        }

        let owner = Owner::Volunteer(volunteer_id);

        if !self
            .codes
            .verify(donation_id, &input.code, &donation.handover_code_hash)?
        {
            let outcome = self
                .store
                .update_owned(
                    donation_id,
                    owner,
                    &allowed,
                    DonationPatch::failed_attempt().below_attempts(self.max_failed_attempts),
                )
                .await?;
            let updated = applied(outcome, "verify the handover code")?;
            let attempts_remaining = (self.max_failed_attempts - updated.failed_code_attempts).max(0);

            tracing::warn!(
                donation_id = %donation_id,
                volunteer_id = %volunteer_id,
                attempts_remaining,
                "Wrong handover code"
            );
            return Err(AppError::WrongCode { attempts_remaining });
        }

        let outcome = self
            .store
            .update_owned(
                donation_id,
                owner,
                &allowed,
                DonationPatch::status(DonationStatus::Completed).below_attempts(self.max_failed_attempts),
            )
            .await?;

        let completed = applied(outcome, "complete")?;
        tracing::info!(
            donation_id = %donation_id,
            volunteer_id = %volunteer_id,
            status = %completed.status,
            "Handover verified, donation completed"
        );
        Ok(completed)
    }

    /// Attach the distribution proof photo; allowed in any state
    pub async fn attach_proof(
        &self,
        donation_id: Uuid,
        volunteer_id: Uuid,
        input: AttachProofInput,
    ) -> AppResult<Donation> {
        input.validate()?;

        let outcome = self
            .store
            .update_owned(
                donation_id,
                Owner::Volunteer(volunteer_id),
                &[],
                DonationPatch::proof(input.proof_image_url),
            )
            .await?;

        let donation = applied(outcome, "attach proof to")?;
        tracing::info!(donation_id = %donation_id, volunteer_id = %volunteer_id, "Proof attached");
        Ok(donation)
    }
}

fn transition_error(current: DonationStatus, action: &str) -> AppError {
    AppError::InvalidTransition(format!("Cannot {} a donation that is {}", action, current))
}

/// Map an owner-scoped update outcome onto the error taxonomy
fn applied(outcome: OwnedUpdate, action: &str) -> AppResult<Donation> {
    match outcome {
        OwnedUpdate::Applied(donation) => Ok(donation),
        OwnedUpdate::NotFound => Err(AppError::NotFound("Donation".to_string())),
        OwnedUpdate::NotOwner => Err(AppError::NotOwner),
        OwnedUpdate::StatusMismatch(current) => Err(transition_error(current, action)),
        OwnedUpdate::Locked => Err(AppError::HandoverLocked),
    }
}
