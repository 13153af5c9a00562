//! PostgreSQL store
//!
//! Conditional transitions are single `UPDATE ... WHERE ... RETURNING`
//! statements so no read-then-write window exists between volunteers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    Donation, DonationLocation, DonationStatus, FoodType, GeoPoint, Report, UserProfile, UserRole,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    ConditionalUpdate, DonationPatch, DonationStore, NewDonation, NewReport, Owner, OwnedUpdate,
    StoreError, StoreResult, UserStore,
};

const DONATION_COLUMNS: &str = "id, title, food_type, quantity_kg, best_before, image_url, \
     proof_image_url, latitude, longitude, address, status, donor_id, volunteer_id, \
     handover_code_hash, failed_code_attempts, created_at, updated_at";

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

/// Database row for a donation
#[derive(Debug, sqlx::FromRow)]
struct DonationRow {
    id: Uuid,
    title: String,
    food_type: String,
    quantity_kg: Decimal,
    best_before: DateTime<Utc>,
    image_url: Option<String>,
    proof_image_url: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    address: Option<String>,
    status: String,
    donor_id: Uuid,
    volunteer_id: Option<Uuid>,
    handover_code_hash: String,
    failed_code_attempts: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DonationRow {
    fn into_donation(self, reports: Vec<Report>) -> StoreResult<Donation> {
        let status = DonationStatus::parse(&self.status).ok_or_else(|| {
            StoreError::Corrupt(format!("donation {} has status {:?}", self.id, self.status))
        })?;
        let food_type = FoodType::parse(&self.food_type).ok_or_else(|| {
            StoreError::Corrupt(format!("donation {} has food type {:?}", self.id, self.food_type))
        })?;
        // Partial coordinates are treated as no location at all
        let location = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(DonationLocation {
                lat,
                lng,
                address: self.address,
            }),
            _ => None,
        };

        Ok(Donation {
            id: self.id,
            title: self.title,
            food_type,
            quantity_kg: self.quantity_kg,
            best_before: self.best_before,
            image_url: self.image_url,
            proof_image_url: self.proof_image_url,
            location,
            status,
            donor_id: self.donor_id,
            volunteer_id: self.volunteer_id,
            handover_code_hash: self.handover_code_hash,
            failed_code_attempts: self.failed_code_attempts,
            reports,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Database row for a report
#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    id: Uuid,
    donation_id: Uuid,
    reporter_id: Uuid,
    reason: String,
    created_at: DateTime<Utc>,
}

impl From<ReportRow> for Report {
    fn from(row: ReportRow) -> Self {
        Report {
            id: row.id,
            reporter_id: row.reporter_id,
            reason: row.reason,
            created_at: row.created_at,
        }
    }
}

/// Database row for a user
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    role: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    verified_ngo: bool,
}

impl TryFrom<UserRow> for UserProfile {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = UserRole::parse(&row.role)
            .ok_or_else(|| StoreError::Corrupt(format!("user {} has role {:?}", row.id, row.role)))?;
        let location = match (row.latitude, row.longitude) {
            (Some(lat), Some(lng)) => GeoPoint::new(lat, lng).ok(),
            _ => None,
        };

        Ok(UserProfile {
            id: row.id,
            name: row.name,
            role,
            location,
            verified_ngo: row.verified_ngo,
        })
    }
}

fn status_texts(statuses: &[DonationStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Attach reports to a batch of rows in one query
    async fn hydrate(&self, rows: Vec<DonationRow>) -> StoreResult<Vec<Donation>> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let report_rows = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT id, donation_id, reporter_id, reason, created_at
            FROM donation_reports
            WHERE donation_id = ANY($1)
            ORDER BY created_at, seq
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut reports: HashMap<Uuid, Vec<Report>> = HashMap::new();
        for row in report_rows {
            reports.entry(row.donation_id).or_default().push(row.into());
        }

        rows.into_iter()
            .map(|row| {
                let attached = reports.remove(&row.id).unwrap_or_default();
                row.into_donation(attached)
            })
            .collect()
    }

    async fn hydrate_one(&self, row: DonationRow) -> StoreResult<Donation> {
        let mut donations = self.hydrate(vec![row]).await?;
        donations
            .pop()
            .ok_or_else(|| StoreError::Corrupt("hydrated donation vanished".to_string()))
    }
}

#[async_trait]
impl DonationStore for PgStore {
    async fn create_donation(&self, new: NewDonation) -> StoreResult<Donation> {
        let (latitude, longitude, address) = match new.location {
            Some(loc) => (Some(loc.lat), Some(loc.lng), loc.address),
            None => (None, None, None),
        };

        let row = sqlx::query_as::<_, DonationRow>(&format!(
            r#"
            INSERT INTO donations (id, title, food_type, quantity_kg, best_before, image_url,
                                   latitude, longitude, address, status, donor_id, handover_code_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {DONATION_COLUMNS}
            "#
        ))
        .bind(new.id)
        .bind(&new.title)
        .bind(new.food_type.as_str())
        .bind(new.quantity_kg)
        .bind(new.best_before)
        .bind(&new.image_url)
        .bind(latitude)
        .bind(longitude)
        .bind(&address)
        .bind(DonationStatus::Pending.as_str())
        .bind(new.donor_id)
        .bind(&new.handover_code_hash)
        .fetch_one(&self.db)
        .await?;

        row.into_donation(vec![])
    }

    async fn get_donation(&self, id: Uuid) -> StoreResult<Option<Donation>> {
        let row = sqlx::query_as::<_, DonationRow>(&format!(
            "SELECT {DONATION_COLUMNS} FROM donations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate_one(row).await?)),
            None => Ok(None),
        }
    }

    async fn conditional_update(
        &self,
        id: Uuid,
        expected: DonationStatus,
        patch: DonationPatch,
    ) -> StoreResult<ConditionalUpdate> {
        let row = sqlx::query_as::<_, DonationRow>(&format!(
            r#"
            UPDATE donations
            SET status = COALESCE($3, status),
                volunteer_id = COALESCE($4, volunteer_id),
                proof_image_url = COALESCE($5, proof_image_url),
                failed_code_attempts = failed_code_attempts + $6,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
              AND ($7::int IS NULL OR failed_code_attempts < $7)
            RETURNING {DONATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(expected.as_str())
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.volunteer_id)
        .bind(&patch.proof_image_url)
        .bind(i32::from(patch.record_failed_attempt))
        .bind(patch.attempts_below)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => Ok(ConditionalUpdate::Applied(self.hydrate_one(row).await?)),
            None => Ok(ConditionalUpdate::Conflict),
        }
    }

    async fn update_owned(
        &self,
        id: Uuid,
        owner: Owner,
        allowed: &[DonationStatus],
        patch: DonationPatch,
    ) -> StoreResult<OwnedUpdate> {
        let owner_column = owner.column();
        let row = sqlx::query_as::<_, DonationRow>(&format!(
            r#"
            UPDATE donations
            SET status = COALESCE($4, status),
                volunteer_id = COALESCE($5, volunteer_id),
                proof_image_url = COALESCE($6, proof_image_url),
                failed_code_attempts = failed_code_attempts + $7,
                updated_at = NOW()
            WHERE id = $1
              AND {owner_column} = $2
              AND (cardinality($3::text[]) = 0 OR status = ANY($3))
              AND ($8::int IS NULL OR failed_code_attempts < $8)
            RETURNING {DONATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner.id())
        .bind(status_texts(allowed))
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.volunteer_id)
        .bind(&patch.proof_image_url)
        .bind(i32::from(patch.record_failed_attempt))
        .bind(patch.attempts_below)
        .fetch_optional(&self.db)
        .await?;

        if let Some(row) = row {
            return Ok(OwnedUpdate::Applied(self.hydrate_one(row).await?));
        }

        // The write already failed; this read only explains why
        let current = sqlx::query_as::<_, (String, Option<Uuid>, i32)>(&format!(
            "SELECT status, {owner_column}, failed_code_attempts FROM donations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        let Some((status, current_owner, failed_code_attempts)) = current else {
            return Ok(OwnedUpdate::NotFound);
        };
        if current_owner != Some(owner.id()) {
            return Ok(OwnedUpdate::NotOwner);
        }
        let status = DonationStatus::parse(&status).ok_or_else(|| {
            StoreError::Corrupt(format!("donation {} has status {:?}", id, status))
        })?;
        if !allowed.is_empty() && !allowed.contains(&status) {
            return Ok(OwnedUpdate::StatusMismatch(status));
        }
        match patch.attempts_below {
            Some(ceiling) if failed_code_attempts >= ceiling => Ok(OwnedUpdate::Locked),
            // A concurrent writer moved the record between the two statements
            _ => Ok(OwnedUpdate::StatusMismatch(status)),
        }
    }

    async fn list_by_status(&self, statuses: &[DonationStatus]) -> StoreResult<Vec<Donation>> {
        let rows = sqlx::query_as::<_, DonationRow>(&format!(
            "SELECT {DONATION_COLUMNS} FROM donations WHERE status = ANY($1) ORDER BY created_at DESC"
        ))
        .bind(status_texts(statuses))
        .fetch_all(&self.db)
        .await?;

        self.hydrate(rows).await
    }

    async fn list_by_owner(&self, owner: Owner) -> StoreResult<Vec<Donation>> {
        let rows = sqlx::query_as::<_, DonationRow>(&format!(
            "SELECT {DONATION_COLUMNS} FROM donations WHERE {} = $1 ORDER BY created_at DESC",
            owner.column()
        ))
        .bind(owner.id())
        .fetch_all(&self.db)
        .await?;

        self.hydrate(rows).await
    }

    async fn append_report(&self, id: Uuid, report: NewReport) -> StoreResult<Option<Report>> {
        let row = sqlx::query_as::<_, ReportRow>(
            r#"
            INSERT INTO donation_reports (id, donation_id, reporter_id, reason)
            SELECT $2, d.id, $3, $4 FROM donations d WHERE d.id = $1
            RETURNING id, donation_id, reporter_id, reason, created_at
            "#,
        )
        .bind(id)
        .bind(Uuid::new_v4())
        .bind(report.reporter_id)
        .bind(&report.reason)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Report::from))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, role, latitude, longitude, verified_ngo FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(UserProfile::try_from).transpose()
    }

    async fn mark_verified(&self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET verified_ngo = TRUE
            WHERE id = $1
            RETURNING id, name, role, latitude, longitude, verified_ngo
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(UserProfile::try_from).transpose()
    }
}
