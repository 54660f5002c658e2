pub mod config;
pub mod error;
pub mod lenient;
pub mod types;

pub use config::TownConfig;
pub use error::{Result, TownError};
