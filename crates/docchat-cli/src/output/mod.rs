pub mod json;
pub mod progress;
pub mod table;

pub use crate::cli::OutputFormat;
