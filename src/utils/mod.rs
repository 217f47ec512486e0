//! Utility modules for error handling, configuration and status reporting

pub mod config;
pub mod error;
pub mod status;

// Re-export for convenience
pub use config::{AppSettings, DEFAULT_FALLBACK_QUALITY, DEFAULT_PREFERRED_QUALITY};
pub use error::BilifetchError;
pub use status::{LogStatus, MemoryStatus, StatusLevel, StatusSink};
