//! Batch orchestration.
//!
//! Turns a list of uploaded files into one record each and walks them
//! sequentially through encode → extract → sanitize, recording every outcome
//! in the report store. One item's failure never affects another.

pub mod error;
pub mod runner;
pub mod types;

pub use error::DigitizeError;
pub use runner::{run_batch, BatchRunner};
pub use types::*;
