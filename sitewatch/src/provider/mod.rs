//! Tile service access.
//!
//! [`TileService`] builds locators, issues requests through an
//! [`HttpClient`] and decodes what comes back. The HTTP layer is a trait so
//! tests can substitute a mock for the network.
//!
//! ```ignore
//! use sitewatch::provider::{ReqwestClient, ServiceConfig, TileService};
//!
//! let config = ServiceConfig::default();
//! let service = TileService::new(ReqwestClient::new(&config)?, &config);
//! let planetoid = service.fetch_planetoid()?;
//! ```

mod config;
mod http;
mod service;
mod types;

pub use config::{
    ServiceConfig, DEFAULT_MAX_RETRIES, DEFAULT_REFERER, DEFAULT_RETRY_BASE_DELAY_MS,
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
pub use http::{HttpClient, ReqwestClient};
pub use service::{RetryPolicy, TileService};
pub use types::ProviderError;

#[cfg(test)]
pub use http::tests::{MockHttpClient, ScriptedHttpClient};
