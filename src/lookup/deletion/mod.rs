pub mod manager;
pub mod models;

pub use manager::DeletionManager;
pub use models::{DeletionError, DeletionIntent, DeletionOutcome, DeletionState};
