// ============================================================================
// TallyDB Library
// ============================================================================

pub mod config;
pub mod core;
pub mod facade;
pub mod ledger;
pub mod stats;
pub mod storage;
pub mod web;

// Re-export main types for convenience
pub use crate::core::{Clock, Document, Event, Position, Result, TrackerError};
pub use facade::ProgressTracker;
pub use storage::DocumentStore;
