//! Locator construction and parsing.
//!
//! The tile service encodes its RPC arguments positionally in the URL path:
//!
//! ```text
//! {base}/{planet}/PlanetoidMetadata
//! {base}/{planet}/BulkMetadata/pb=!1m2!1s{path}!2u{epoch}
//! {base}/{planet}/NodeData/pb=!1m2!1s{path}!2u{epoch}!2e{format}[!3u{version}]!4b0[!5i{timestamp}]
//! ```
//!
//! Parameters cannot be reordered; the service rejects locators whose markers
//! appear out of sequence. [`extract_versions`] reads `(epoch, version,
//! timestamp)` back out of a locator or a bare `pb=` fragment.

mod address;

pub use address::{DatasetVersion, TileAddress, VersionTriple};

use std::fmt;

/// Default service root.
pub const DEFAULT_BASE_URL: &str = "https://kh.google.com/rt/tm";

/// Default planet segment.
pub const DEFAULT_PLANET: &str = "earth";

/// Texture format selector requesting JPEG imagery.
pub const JPEG_TEXTURE_FORMAT: u32 = 1;

const PATH_MARKER: &str = "!1s";
const EPOCH_MARKER: &str = "!2u";
const VERSION_MARKER: &str = "!3u";
const TIMESTAMP_MARKER: &str = "!5i";

/// Resource kinds served by the tile service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    PlanetoidMetadata,
    BulkMetadata,
    NodeData,
}

impl ResourceKind {
    /// Path segment naming the resource.
    pub fn segment(&self) -> &'static str {
        match self {
            ResourceKind::PlanetoidMetadata => "PlanetoidMetadata",
            ResourceKind::BulkMetadata => "BulkMetadata",
            ResourceKind::NodeData => "NodeData",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Builds locators for one planet of the tile service.
///
/// Holds no state beyond its configuration; every method is a pure function of
/// its inputs.
///
/// # Example
///
/// ```
/// use sitewatch::locator::{LocatorBuilder, TileAddress};
///
/// let builder = LocatorBuilder::default();
/// let address = TileAddress::new("30524153625370535063", 990)
///     .with_version(350)
///     .with_timestamp(1036419);
///
/// assert_eq!(
///     builder.node_data(&address),
///     "https://kh.google.com/rt/tm/earth/NodeData/pb=!1m2!1s30524153625370535063!2u990!2e1!3u350!4b0!5i1036419"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorBuilder {
    base_url: String,
    planet: String,
    texture_format: u32,
}

impl Default for LocatorBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_PLANET)
    }
}

impl LocatorBuilder {
    /// Creates a builder. A trailing slash on `base_url` is ignored.
    pub fn new(base_url: impl Into<String>, planet: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            planet: planet.into(),
            texture_format: JPEG_TEXTURE_FORMAT,
        }
    }

    /// Sets the `!2e` texture format selector used for node data.
    pub fn with_texture_format(mut self, texture_format: u32) -> Self {
        self.texture_format = texture_format;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn planet(&self) -> &str {
        &self.planet
    }

    fn resource_root(&self, kind: ResourceKind) -> String {
        format!("{}/{}/{}", self.base_url, self.planet, kind.segment())
    }

    /// Locator for the planet's root metadata.
    pub fn planetoid(&self) -> String {
        self.resource_root(ResourceKind::PlanetoidMetadata)
    }

    /// Locator for the bulk metadata of the subtree rooted at `path`.
    ///
    /// The root subtree uses an empty path.
    pub fn bulk_metadata(&self, path: &str, epoch: u64) -> String {
        format!(
            "{}/pb=!1m2{}{}{}{}",
            self.resource_root(ResourceKind::BulkMetadata),
            PATH_MARKER,
            path,
            EPOCH_MARKER,
            epoch
        )
    }

    /// Locator for one node's data.
    ///
    /// `!3u` carries the address's version, or its imagery epoch when no
    /// version is set, and is omitted when neither is known. `!5i` is omitted
    /// without a timestamp.
    pub fn node_data(&self, address: &TileAddress) -> String {
        let mut locator = format!(
            "{}/pb=!1m2{}{}{}{}!2e{}",
            self.resource_root(ResourceKind::NodeData),
            PATH_MARKER,
            address.path(),
            EPOCH_MARKER,
            address.epoch(),
            self.texture_format
        );
        if let Some(version) = address.version().or(address.imagery_epoch()) {
            locator.push_str(&format!("{}{}", VERSION_MARKER, version));
        }
        locator.push_str("!4b0");
        if let Some(timestamp) = address.timestamp() {
            locator.push_str(&format!("{}{}", TIMESTAMP_MARKER, timestamp));
        }
        locator
    }
}

/// Reads the decimal value that follows `marker`, if present.
fn numeric_after(locator: &str, marker: &str) -> Option<u64> {
    let start = locator.find(marker)? + marker.len();
    let digits: &str = {
        let rest = &locator[start..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };
    digits.parse().ok()
}

/// Recovers `(epoch, version, timestamp)` from a locator or `pb=` fragment.
///
/// Missing markers yield `None` for that component.
///
/// ```
/// use sitewatch::locator::extract_versions;
///
/// let triple = extract_versions("!1m2!1s30524153625370535241!2u990!2e1!3u253!4b0!5i1033769");
/// assert_eq!(triple.epoch, Some(990));
/// assert_eq!(triple.version, Some(253));
/// assert_eq!(triple.timestamp, Some(1033769));
/// ```
pub fn extract_versions(locator: &str) -> VersionTriple {
    VersionTriple {
        epoch: numeric_after(locator, EPOCH_MARKER),
        version: numeric_after(locator, VERSION_MARKER),
        timestamp: numeric_after(locator, TIMESTAMP_MARKER),
    }
}

/// Recovers the octant path from a locator or `pb=` fragment.
pub fn extract_path(locator: &str) -> Option<&str> {
    let start = locator.find(PATH_MARKER)? + PATH_MARKER.len();
    let rest = &locator[start..];
    let end = rest.find('!').unwrap_or(rest.len());
    Some(&rest[..end])
}
