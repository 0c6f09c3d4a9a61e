//! Tile service client.
//!
//! Wraps an [`HttpClient`] with locator construction, bounded retries and
//! decoding of the service's metadata and imagery payloads.

use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::config::ServiceConfig;
use super::http::HttpClient;
use super::types::ProviderError;
use crate::imagery::extract_jpeg;
use crate::locator::{LocatorBuilder, TileAddress};
use crate::metadata::{
    decode_bulk_metadata_with_threshold, decode_planetoid_metadata, BulkMetadata,
    PlanetoidMetadata,
};
use crate::overlap::Octant;
use crate::tile::TileImage;

/// Retry budget for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `retry` (zero-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << retry.min(16))
    }
}

/// Client for the tile service's planetoid, bulk metadata and node data
/// resources.
pub struct TileService<C: HttpClient> {
    client: C,
    locator: LocatorBuilder,
    retry: RetryPolicy,
    container_threshold: usize,
}

impl<C: HttpClient> TileService<C> {
    pub fn new(client: C, config: &ServiceConfig) -> Self {
        Self {
            client,
            locator: LocatorBuilder::new(config.base_url.clone(), config.planet.clone())
                .with_texture_format(config.texture_format),
            retry: RetryPolicy::new(config.max_retries, config.retry_base_delay),
            container_threshold: config.container_threshold,
        }
    }

    /// Overrides the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn locator(&self) -> &LocatorBuilder {
        &self.locator
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetches and decodes the planet's root metadata.
    pub fn fetch_planetoid(&self) -> Result<PlanetoidMetadata, ProviderError> {
        let body = self.get(&self.locator.planetoid())?;
        Ok(decode_planetoid_metadata(&body))
    }

    /// Fetches and decodes the bulk metadata packet rooted at `path`.
    pub fn fetch_bulk_metadata(
        &self,
        path: &str,
        epoch: u64,
    ) -> Result<BulkMetadata, ProviderError> {
        let body = self.get(&self.locator.bulk_metadata(path, epoch))?;
        let bulk = decode_bulk_metadata_with_threshold(&body, self.container_threshold);
        debug!(
            path,
            epoch,
            nodes = bulk.nodes.len(),
            dropped = bulk.dropped,
            "decoded bulk metadata"
        );
        Ok(bulk)
    }

    /// Fetches the raw node-data payload for an address.
    pub fn fetch_node_data(&self, address: &TileAddress) -> Result<Vec<u8>, ProviderError> {
        self.get(&self.locator.node_data(address))
    }

    /// Fetches an octant's imagery at `address`.
    ///
    /// Fails with [`ProviderError::NoImagery`] when the node data holds no
    /// JPEG stream.
    pub fn fetch_tile(
        &self,
        octant: &Octant,
        address: TileAddress,
    ) -> Result<TileImage, ProviderError> {
        let payload = self.fetch_node_data(&address)?;
        let jpeg = extract_jpeg(&payload)?.to_vec();
        debug!(%address, bytes = jpeg.len(), "extracted tile imagery");
        Ok(TileImage::new(jpeg, address, octant.bbox))
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let mut retry = 0;
        loop {
            match self.client.get(url) {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && retry < self.retry.max_retries => {
                    let delay = self.retry.delay_for(retry);
                    warn!(
                        url,
                        error = %e,
                        attempt = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        "request failed, retrying"
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
