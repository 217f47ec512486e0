//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default quality codes for the two-attempt ladder.
pub const DEFAULT_PREFERRED_QUALITY: u32 = 80; // 1080p HD
pub const DEFAULT_FALLBACK_QUALITY: u32 = 64; // 720p HD

const BILIBILI_REFERER: &str = "https://www.bilibili.com";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Root directory for the per-video project layout. When unset (or not
    /// creatable) assets fall back to loose files in the Downloads directory.
    pub download_root: Option<PathBuf>,

    /// Quality code requested on the first playurl attempt
    pub preferred_quality: u32,

    /// Quality code for the single retry after the first attempt fails
    pub fallback_quality: u32,

    /// Backing file for the download-record ledger
    pub ledger_path: PathBuf,

    /// Directory receiving the exported spreadsheet
    pub export_dir: PathBuf,

    /// Referer sent with playurl and asset requests; the API rejects
    /// requests lacking it
    pub referer: String,

    /// User agent for all outbound requests
    pub user_agent: String,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bilifetch");

        Self {
            download_root: None,
            preferred_quality: DEFAULT_PREFERRED_QUALITY,
            fallback_quality: DEFAULT_FALLBACK_QUALITY,
            ledger_path: data_dir.join("download_records.json"),
            export_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            referer: BILIBILI_REFERER.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppSettings::default();
        assert_eq!(config.preferred_quality, 80);
        assert_eq!(config.fallback_quality, 64);
        assert!(config.timeout_secs > 0);
        assert!(config.referer.starts_with("https://"));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = AppSettings::default();
        let text = serde_json::to_string(&config).unwrap();
        let back: AppSettings = serde_json::from_str(&text).unwrap();
        assert_eq!(back.preferred_quality, config.preferred_quality);
        assert_eq!(back.ledger_path, config.ledger_path);
    }
}
