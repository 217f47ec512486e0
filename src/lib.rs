//! Bilifetch library

pub mod extractor;
pub mod ledger;
pub mod organizer;
pub mod pipeline;
pub mod storage;
pub mod utils;

// Re-export main types for easier use
pub use extractor::{quality_label, PlayUrlClient, StreamDescriptor, StreamSource, VideoInfo};
pub use ledger::{DownloadRecord, ExportEmitter, RecordLedger};
pub use organizer::{LibraryOrganizer, OrganizeSummary};
pub use pipeline::Pipeline;
pub use storage::{sanitize_title, AssetCategory, AssetPersister, AssetSink};
pub use utils::{AppSettings, BilifetchError, StatusLevel, StatusSink};
