//! Donation lifecycle tests for the Food Rescue Network
//!
//! Covers creation, first-come first-served claiming under concurrency,
//! monotonic transitions, ownership checks and handover code verification.

use std::sync::Arc;

use chrono::{Duration, Utc};
use food_rescue_backend::{
    error::AppError,
    services::{
        donation::{AttachProofInput, CreateDonationInput, CreatedDonation, VerifyHandoverInput},
        handover::SubmittedCode,
        DonationService,
    },
    store::{DonationStore, MemoryStore},
    Config,
};
use rust_decimal::Decimal;
use shared::{DonationStatus, FoodType};
use uuid::Uuid;

fn setup() -> (Arc<MemoryStore>, DonationService) {
    setup_with(Config::for_testing())
}

fn setup_with(config: Config) -> (Arc<MemoryStore>, DonationService) {
    let store = Arc::new(MemoryStore::new());
    let service = DonationService::new(store.clone(), &config);
    (store, service)
}

fn donation_input() -> CreateDonationInput {
    CreateDonationInput {
        title: Some("Veg pulao".to_string()),
        food_type: Some(FoodType::Cooked),
        quantity_kg: Some(Decimal::from(10)),
        best_before: Some(Utc::now() + Duration::hours(2)),
        lat: Some(12.9),
        lng: Some(77.6),
        address: Some("MG Road".to_string()),
        image_url: Some("https://media.example.org/pulao.jpg".to_string()),
    }
}

async fn create(service: &DonationService) -> CreatedDonation {
    service
        .create(Uuid::new_v4(), donation_input(), Utc::now())
        .await
        .unwrap()
}

fn code(value: u16) -> VerifyHandoverInput {
    VerifyHandoverInput {
        code: SubmittedCode::Number(u64::from(value)),
    }
}

/// A code guaranteed to differ from the real one
fn wrong(value: u16) -> u16 {
    if value == 9999 {
        1000
    } else {
        value + 1
    }
}

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn test_created_donation_starts_pending_with_code() {
    let (_, service) = setup();
    let donor = Uuid::new_v4();

    let created = service.create(donor, donation_input(), Utc::now()).await.unwrap();

    assert_eq!(created.donation.status, DonationStatus::Pending);
    assert_eq!(created.donation.volunteer_id, None);
    assert_eq!(created.donation.donor_id, donor);
    assert!((1000..=9999).contains(&created.handover_code));
    assert!(created.donation.proof_image_url.is_none());
    assert!(created.donation.reports.is_empty());
    assert_ne!(created.donation.handover_code_hash, created.handover_code.to_string());
}

#[tokio::test]
async fn test_create_rejects_missing_required_fields() {
    let (_, service) = setup();

    let cases: Vec<(&str, CreateDonationInput)> = vec![
        ("title", CreateDonationInput { title: None, ..donation_input() }),
        ("food_type", CreateDonationInput { food_type: None, ..donation_input() }),
        ("quantity_kg", CreateDonationInput { quantity_kg: None, ..donation_input() }),
        ("best_before", CreateDonationInput { best_before: None, ..donation_input() }),
    ];

    for (expected_field, input) in cases {
        let err = service.create(Uuid::new_v4(), input, Utc::now()).await.unwrap_err();
        match err {
            AppError::Validation { field, .. } => assert_eq!(field, expected_field),
            other => panic!("expected validation error for {}, got {:?}", expected_field, other),
        }
    }
}

#[tokio::test]
async fn test_create_rejects_bad_values() {
    let (_, service) = setup();

    let zero_quantity = CreateDonationInput {
        quantity_kg: Some(Decimal::ZERO),
        ..donation_input()
    };
    assert!(matches!(
        service.create(Uuid::new_v4(), zero_quantity, Utc::now()).await,
        Err(AppError::Validation { .. })
    ));

    let expired = CreateDonationInput {
        best_before: Some(Utc::now() - Duration::minutes(5)),
        ..donation_input()
    };
    assert!(matches!(
        service.create(Uuid::new_v4(), expired, Utc::now()).await,
        Err(AppError::Validation { .. })
    ));

    let half_location = CreateDonationInput {
        lng: None,
        ..donation_input()
    };
    assert!(matches!(
        service.create(Uuid::new_v4(), half_location, Utc::now()).await,
        Err(AppError::Validation { .. })
    ));

    let out_of_range = CreateDonationInput {
        lat: Some(95.0),
        ..donation_input()
    };
    assert!(matches!(
        service.create(Uuid::new_v4(), out_of_range, Utc::now()).await,
        Err(AppError::Validation { .. })
    ));
}

#[tokio::test]
async fn test_create_without_location_is_allowed() {
    let (_, service) = setup();
    let input = CreateDonationInput {
        lat: None,
        lng: None,
        address: None,
        ..donation_input()
    };

    let created = service.create(Uuid::new_v4(), input, Utc::now()).await.unwrap();
    assert!(created.donation.location.is_none());
}

// ============================================================================
// Claiming
// ============================================================================

#[tokio::test]
async fn test_claim_sets_volunteer_once() {
    let (store, service) = setup();
    let created = create(&service).await;
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    let claimed = service.claim(created.donation.id, first).await.unwrap();
    assert_eq!(claimed.status, DonationStatus::Accepted);
    assert_eq!(claimed.volunteer_id, Some(first));

    let err = service.claim(created.donation.id, second).await.unwrap_err();
    assert!(matches!(err, AppError::ClaimConflict));

    let stored = store.get_donation(created.donation.id).await.unwrap().unwrap();
    assert_eq!(stored.volunteer_id, Some(first));
}

#[tokio::test]
async fn test_claim_missing_donation_is_a_lost_claim() {
    let (_, service) = setup();
    let err = service.claim(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::ClaimConflict));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_have_exactly_one_winner() {
    let (store, service) = setup();
    let created = create(&service).await;
    let donation_id = created.donation.id;

    let volunteers: Vec<Uuid> = (0..32).map(|_| Uuid::new_v4()).collect();
    let handles: Vec<_> = volunteers
        .iter()
        .map(|&volunteer| {
            let service = service.clone();
            tokio::spawn(async move { (volunteer, service.claim(donation_id, volunteer).await) })
        })
        .collect();

    let mut winners = vec![];
    let mut conflicts = 0;
    for handle in handles {
        let (volunteer, result) = handle.await.unwrap();
        match result {
            Ok(_) => winners.push(volunteer),
            Err(AppError::ClaimConflict) => conflicts += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(conflicts, volunteers.len() - 1);

    let stored = store.get_donation(donation_id).await.unwrap().unwrap();
    assert_eq!(stored.status, DonationStatus::Accepted);
    assert_eq!(stored.volunteer_id, Some(winners[0]));
}

// ============================================================================
// Transitions and ownership
// ============================================================================

#[tokio::test]
async fn test_mark_picked_requires_accepted_state() {
    let (_, service) = setup();
    let created = create(&service).await;
    let volunteer = Uuid::new_v4();

    // Nobody owns a pending donation yet
    let err = service.mark_picked(created.donation.id, volunteer).await.unwrap_err();
    assert!(matches!(err, AppError::NotOwner));

    service.claim(created.donation.id, volunteer).await.unwrap();
    let picked = service.mark_picked(created.donation.id, volunteer).await.unwrap();
    assert_eq!(picked.status, DonationStatus::Picked);

    let err = service.mark_picked(created.donation.id, volunteer).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_other_volunteers_are_not_owners_in_any_state() {
    let (_, service) = setup();
    let created = create(&service).await;
    let id = created.donation.id;
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    service.claim(id, owner).await.unwrap();
    assert!(matches!(service.mark_picked(id, stranger).await, Err(AppError::NotOwner)));
    assert!(matches!(
        service.verify_handover(id, stranger, code(created.handover_code)).await,
        Err(AppError::NotOwner)
    ));

    service.mark_picked(id, owner).await.unwrap();
    assert!(matches!(
        service.verify_handover(id, stranger, code(created.handover_code)).await,
        Err(AppError::NotOwner)
    ));
    assert!(matches!(
        service
            .attach_proof(
                id,
                stranger,
                AttachProofInput {
                    proof_image_url: "https://media.example.org/x.jpg".to_string()
                }
            )
            .await,
        Err(AppError::NotOwner)
    ));
}

#[tokio::test]
async fn test_verify_requires_picked_by_default() {
    let (_, service) = setup();
    let created = create(&service).await;
    let volunteer = Uuid::new_v4();
    service.claim(created.donation.id, volunteer).await.unwrap();

    let err = service
        .verify_handover(created.donation.id, volunteer, code(created.handover_code))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_completion_from_accepted_when_enabled() {
    let mut config = Config::for_testing();
    config.handover.allow_completion_from_accepted = true;
    let (_, service) = setup_with(config);

    let created = create(&service).await;
    let volunteer = Uuid::new_v4();
    service.claim(created.donation.id, volunteer).await.unwrap();

    let completed = service
        .verify_handover(created.donation.id, volunteer, code(created.handover_code))
        .await
        .unwrap();
    assert_eq!(completed.status, DonationStatus::Completed);
}

// ============================================================================
// Handover code verification
// ============================================================================

#[tokio::test]
async fn test_wrong_code_leaves_state_unchanged() {
    let (store, service) = setup();
    let created = create(&service).await;
    let id = created.donation.id;
    let volunteer = Uuid::new_v4();
    service.claim(id, volunteer).await.unwrap();
    service.mark_picked(id, volunteer).await.unwrap();

    let err = service
        .verify_handover(id, volunteer, code(wrong(created.handover_code)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::WrongCode { attempts_remaining: 4 }));

    let stored = store.get_donation(id).await.unwrap().unwrap();
    assert_eq!(stored.status, DonationStatus::Picked);
}

#[tokio::test]
async fn test_correct_code_completes_exactly_once() {
    let (_, service) = setup();
    let created = create(&service).await;
    let id = created.donation.id;
    let volunteer = Uuid::new_v4();
    service.claim(id, volunteer).await.unwrap();
    service.mark_picked(id, volunteer).await.unwrap();

    let as_text = VerifyHandoverInput {
        code: SubmittedCode::Text(created.handover_code.to_string()),
    };
    let completed = service.verify_handover(id, volunteer, as_text).await.unwrap();
    assert_eq!(completed.status, DonationStatus::Completed);
    assert_eq!(completed.volunteer_id, Some(volunteer));

    let err = service
        .verify_handover(id, volunteer, code(created.handover_code))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_repeated_wrong_codes_lock_verification() {
    let (_, service) = setup();
    let created = create(&service).await;
    let id = created.donation.id;
    let volunteer = Uuid::new_v4();
    service.claim(id, volunteer).await.unwrap();
    service.mark_picked(id, volunteer).await.unwrap();

    let bad = wrong(created.handover_code);
    for expected_remaining in (0..5).rev() {
        let err = service.verify_handover(id, volunteer, code(bad)).await.unwrap_err();
        match err {
            AppError::WrongCode { attempts_remaining } => {
                assert_eq!(attempts_remaining, expected_remaining)
            }
            other => panic!("expected wrong code, got {:?}", other),
        }
    }

    // Even the right code is refused once locked
    let err = service
        .verify_handover(id, volunteer, code(created.handover_code))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::HandoverLocked));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_wrong_codes_never_exceed_the_limit() {
    let (store, service) = setup();
    let created = create(&service).await;
    let id = created.donation.id;
    let volunteer = Uuid::new_v4();
    service.claim(id, volunteer).await.unwrap();
    service.mark_picked(id, volunteer).await.unwrap();

    let bad = wrong(created.handover_code);
    let handles: Vec<_> = (0..64)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.verify_handover(id, volunteer, code(bad)).await })
        })
        .collect();

    let mut wrong_codes = 0;
    let mut locked = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Err(AppError::WrongCode { .. }) => wrong_codes += 1,
            Err(AppError::HandoverLocked) => locked += 1,
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    assert_eq!(wrong_codes, 5);
    assert_eq!(locked, 64 - 5);

    let stored = store.get_donation(id).await.unwrap().unwrap();
    assert_eq!(stored.failed_code_attempts, 5);
    assert_eq!(stored.status, DonationStatus::Picked);

    let err = service
        .verify_handover(id, volunteer, code(created.handover_code))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::HandoverLocked));
}

// ============================================================================
// Proof of distribution
// ============================================================================

#[tokio::test]
async fn test_attach_proof_in_any_assigned_state() {
    let (_, service) = setup();
    let created = create(&service).await;
    let id = created.donation.id;
    let volunteer = Uuid::new_v4();
    service.claim(id, volunteer).await.unwrap();

    let updated = service
        .attach_proof(
            id,
            volunteer,
            AttachProofInput {
                proof_image_url: "https://media.example.org/proof.jpg".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, DonationStatus::Accepted);
    assert_eq!(
        updated.proof_image_url.as_deref(),
        Some("https://media.example.org/proof.jpg")
    );
}

#[tokio::test]
async fn test_attach_proof_to_missing_donation() {
    let (_, service) = setup();
    let err = service
        .attach_proof(
            Uuid::new_v4(),
            Uuid::new_v4(),
            AttachProofInput {
                proof_image_url: "https://media.example.org/proof.jpg".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_donor_and_volunteer_listings() {
    let (_, service) = setup();
    let donor = Uuid::new_v4();
    let volunteer = Uuid::new_v4();

    let first = service.create(donor, donation_input(), Utc::now()).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = service.create(donor, donation_input(), Utc::now()).await.unwrap();
    service.create(Uuid::new_v4(), donation_input(), Utc::now()).await.unwrap();

    let mine = service.list_for_donor(donor).await.unwrap();
    let ids: Vec<Uuid> = mine.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![second.donation.id, first.donation.id]);

    service.claim(first.donation.id, volunteer).await.unwrap();
    let claimed = service.list_for_volunteer(volunteer).await.unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].id, first.donation.id);
}
