//! Incident reports on donations (spoiled food, no-shows)
//!
//! Reports are append-only and never touch the lifecycle state.

use std::sync::Arc;

use serde::Deserialize;
use shared::Report;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::store::{DonationStore, NewReport};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    store: Arc<dyn DonationStore>,
}

/// Input for filing a report
#[derive(Debug, Deserialize, Validate)]
pub struct ReportInput {
    #[validate(length(max = 1000, message = "Reason must be at most 1000 characters"))]
    pub reason: String,
}

impl ReportingService {
    pub fn new(store: Arc<dyn DonationStore>) -> Self {
        Self { store }
    }

    /// Append a report; any authenticated caller may report any donation
    pub async fn report(&self, donation_id: Uuid, reporter_id: Uuid, input: ReportInput) -> AppResult<Report> {
        input.validate()?;
        shared::validate_report_reason(&input.reason).map_err(|m| AppError::validation("reason", m))?;

        let report = self
            .store
            .append_report(
                donation_id,
                NewReport {
                    reporter_id,
                    reason: input.reason.trim().to_string(),
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Donation".to_string()))?;

        tracing::info!(donation_id = %donation_id, reporter_id = %reporter_id, "Donation reported");
        Ok(report)
    }
}
