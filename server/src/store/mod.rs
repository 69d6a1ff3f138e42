//! Intake form persistence.

mod sqlite;

pub use sqlite::{IntakeStore, StoreError};
