//! Event ingestors: profile sync, swipes, recipe adjustments and meal logs

pub mod manager;
pub mod models;

pub use manager::IngestManager;
pub use models::*;
