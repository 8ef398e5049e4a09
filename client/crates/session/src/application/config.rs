//! Session Controller Configuration

use std::time::Duration;

use crate::infra::store::DEFAULT_STORAGE_KEY;

/// Refresh ahead of expiry when less than this remains (5 minutes)
pub const DEFAULT_AUTO_REFRESH_THRESHOLD: Duration = Duration::from_secs(300);

/// How often the auto-refresh task checks the session (1 minute)
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Session controller configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Key the session is persisted under
    pub storage_key: String,
    /// Run the background auto-refresh task
    pub auto_refresh: bool,
    pub auto_refresh_threshold: Duration,
    pub refresh_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            auto_refresh: true,
            auto_refresh_threshold: DEFAULT_AUTO_REFRESH_THRESHOLD,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_refresh_timing(mut self, threshold: Duration, interval: Duration) -> Self {
        self.auto_refresh_threshold = threshold;
        self.refresh_interval = interval;
        self
    }

    pub fn without_auto_refresh(mut self) -> Self {
        self.auto_refresh = false;
        self
    }
}
