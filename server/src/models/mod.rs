//! Request, response, and storage data types.

pub mod intake;

pub use intake::{IntakeRecord, IntakeSubmission};
