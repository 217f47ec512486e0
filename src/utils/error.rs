//! Error handling for Bilifetch

use thiserror::Error;

/// Main error type for Bilifetch
#[derive(Debug, Error)]
pub enum BilifetchError {
    #[error("page state is missing or contains no video data")]
    NoPageState,

    #[error("playurl API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("no playable stream at any attempted quality")]
    NoPlayableStream,

    #[error("asset fetch failed: {0}")]
    Fetch(String),

    #[error("asset write failed: {0}")]
    Write(String),

    #[error("spreadsheet export failed: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
