//! Tile service connection settings.

use std::time::Duration;

use crate::locator::{DEFAULT_BASE_URL, DEFAULT_PLANET, JPEG_TEXTURE_FORMAT};
use crate::metadata::NODE_CONTAINER_THRESHOLD;

/// Browser identity sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Referer sent with every request.
pub const DEFAULT_REFERER: &str = "https://earth.google.com/";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

/// Everything needed to reach the tile service.
///
/// Built once per run from the configuration file and handed to both the
/// HTTP client and the [`TileService`](super::TileService).
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub planet: String,
    pub user_agent: String,
    pub referer: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub texture_format: u32,
    pub container_threshold: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            planet: DEFAULT_PLANET.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            texture_format: JPEG_TEXTURE_FORMAT,
            container_threshold: NODE_CONTAINER_THRESHOLD,
        }
    }
}
