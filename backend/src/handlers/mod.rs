//! HTTP handlers

pub mod admin;
pub mod donations;
pub mod health;

pub use admin::*;
pub use donations::*;
pub use health::*;
