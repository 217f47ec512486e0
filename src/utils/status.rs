//! Transient status surface
//!
//! The pipeline reports its progress as short human-readable messages with a
//! severity. Callers only display these; nothing consumes them programmatically.

use std::sync::Mutex;
use tracing::{error, info, warn};

/// Severity of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Receiver for transient status messages
pub trait StatusSink: Send + Sync {
    fn notify(&self, level: StatusLevel, message: &str);
}

/// Routes status messages to the tracing subscriber
pub struct LogStatus;

impl StatusSink for LogStatus {
    fn notify(&self, level: StatusLevel, message: &str) {
        match level {
            StatusLevel::Info | StatusLevel::Success => info!("{}", message),
            StatusLevel::Warning => warn!("{}", message),
            StatusLevel::Error => error!("{}", message),
        }
    }
}

/// Collects status messages in memory; used by tests
#[derive(Default)]
pub struct MemoryStatus {
    messages: Mutex<Vec<(StatusLevel, String)>>,
}

impl MemoryStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(StatusLevel, String)> {
        self.messages.lock().expect("status lock poisoned").clone()
    }
}

impl StatusSink for MemoryStatus {
    fn notify(&self, level: StatusLevel, message: &str) {
        self.messages
            .lock()
            .expect("status lock poisoned")
            .push((level, message.to_string()));
    }
}
