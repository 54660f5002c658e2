//! Handling of raw generator output: extraction and syntax repair

pub mod extract;
pub mod repair;

pub use extract::{extract_documents, extract_json};
pub use repair::{attempt_repair, sanitize};
