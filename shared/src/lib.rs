//! Shared domain types for the Food Rescue Network
//!
//! Pure, I/O-free building blocks used by the backend: coordinates and
//! great-circle distance, the donation model and its lifecycle states,
//! proximity filtering and impact statistics.

pub mod geo;
pub mod matching;
pub mod models;
pub mod types;
pub mod validation;

pub use matching::*;
pub use models::*;
pub use types::*;
pub use validation::*;
