pub mod models;
pub mod playurl;
pub mod quality;
pub mod search;

pub use models::{VideoInfo, VideoPage};
pub use playurl::{PlayUrlClient, StreamDescriptor, StreamSource};
pub use quality::quality_label;
pub use search::{SearchClient, SearchHit, VideoSearch};
