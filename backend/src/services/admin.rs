//! Admin dashboard: impact statistics, monitoring and NGO verification

use std::sync::Arc;

use shared::{Donation, DonationStatus, ImpactStats, UserProfile};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{DonationStore, UserStore};

/// Admin service
#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn DonationStore>,
    users: Arc<dyn UserStore>,
}

impl AdminService {
    pub fn new(store: Arc<dyn DonationStore>, users: Arc<dyn UserStore>) -> Self {
        Self { store, users }
    }

    /// Totals across every donation ever posted
    pub async fn stats(&self) -> AppResult<ImpactStats> {
        let all = self.store.list_by_status(&DonationStatus::ALL).await?;
        Ok(ImpactStats::from_donations(&all))
    }

    /// Donations not yet completed, for the monitoring map
    pub async fn active_donations(&self) -> AppResult<Vec<Donation>> {
        Ok(self.store.list_by_status(&DonationStatus::ACTIVE).await?)
    }

    /// Mark a volunteer or NGO account as verified
    pub async fn verify_user(&self, user_id: Uuid) -> AppResult<UserProfile> {
        let user = self
            .users
            .mark_verified(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        tracing::info!(user_id = %user_id, role = %user.role, "User verified");
        Ok(user)
    }
}
