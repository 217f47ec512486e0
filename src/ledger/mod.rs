pub mod export;
pub mod records;

pub use export::ExportEmitter;
pub use records::{DownloadRecord, RecordLedger};
