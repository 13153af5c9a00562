//! Business logic services for the Food Rescue Network

pub mod admin;
pub mod donation;
pub mod handover;
pub mod matching;
pub mod reporting;

pub use admin::AdminService;
pub use donation::DonationService;
pub use handover::HandoverCodes;
pub use matching::MatchingService;
pub use reporting::ReportingService;
