pub mod backend;
pub mod persister;

pub use backend::{AssetCategory, LooseDownloadBackend, ProjectDirBackend, StorageBackend};
pub use persister::{sanitize_title, AssetPersister, AssetSink};
