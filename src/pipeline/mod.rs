pub mod batch;
pub mod import;
pub mod structuring;
