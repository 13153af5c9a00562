//! Domain models for the Food Rescue Network

mod donation;
mod stats;
mod user;

pub use donation::*;
pub use stats::*;
pub use user::*;
