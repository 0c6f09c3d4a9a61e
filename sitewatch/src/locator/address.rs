//! Tile addresses and dataset versions.

use std::fmt;

/// Everything needed to locate one node's data.
///
/// # Example
///
/// ```
/// use sitewatch::locator::TileAddress;
///
/// let address = TileAddress::new("383927", 990).with_imagery_epoch(5);
/// assert_eq!(address.path(), "383927");
/// assert_eq!(address.imagery_epoch(), Some(5));
/// assert_eq!(address.timestamp(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileAddress {
    path: String,
    epoch: u64,
    version: Option<u64>,
    imagery_epoch: Option<u64>,
    timestamp: Option<u64>,
}

impl TileAddress {
    pub fn new(path: impl Into<String>, epoch: u64) -> Self {
        Self {
            path: path.into(),
            epoch,
            version: None,
            imagery_epoch: None,
            timestamp: None,
        }
    }

    /// Address for `path` at a pinned dataset version.
    pub fn at_version(path: impl Into<String>, dataset: DatasetVersion) -> Self {
        Self::new(path, dataset.epoch)
            .with_version(dataset.version)
            .with_timestamp(dataset.timestamp)
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_imagery_epoch(mut self, imagery_epoch: u64) -> Self {
        self.imagery_epoch = Some(imagery_epoch);
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn imagery_epoch(&self) -> Option<u64> {
        self.imagery_epoch
    }

    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.path, self.epoch)
    }
}

/// Version components recovered from a locator; any may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VersionTriple {
    pub epoch: Option<u64>,
    pub version: Option<u64>,
    pub timestamp: Option<u64>,
}

impl VersionTriple {
    /// Returns all three components when every one is present.
    pub fn complete(&self) -> Option<(u64, u64, u64)> {
        Some((self.epoch?, self.version?, self.timestamp?))
    }

    /// Converts to a [`DatasetVersion`] when every component is present.
    pub fn to_dataset(&self) -> Option<DatasetVersion> {
        self.complete()
            .map(|(epoch, version, timestamp)| DatasetVersion {
                epoch,
                version,
                timestamp,
            })
    }
}

/// A fully specified imagery dataset: one per surveyed year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatasetVersion {
    pub epoch: u64,
    pub version: u64,
    pub timestamp: u64,
}

impl fmt::Display for DatasetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "epoch {} version {} timestamp {}",
            self.epoch, self.version, self.timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_version_sets_all_components() {
        let dataset = DatasetVersion {
            epoch: 990,
            version: 253,
            timestamp: 1033769,
        };
        let address = TileAddress::at_version("30524153625370535241", dataset);
        assert_eq!(address.epoch(), 990);
        assert_eq!(address.version(), Some(253));
        assert_eq!(address.timestamp(), Some(1033769));
        assert_eq!(address.imagery_epoch(), None);
    }

    #[test]
    fn test_triple_to_dataset_requires_all_parts() {
        let partial = VersionTriple {
            epoch: Some(990),
            version: None,
            timestamp: Some(1),
        };
        assert_eq!(partial.to_dataset(), None);

        let full = VersionTriple {
            epoch: Some(990),
            version: Some(350),
            timestamp: Some(1036419),
        };
        assert_eq!(
            full.to_dataset(),
            Some(DatasetVersion {
                epoch: 990,
                version: 350,
                timestamp: 1036419
            })
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(TileAddress::new("0123", 7).to_string(), "0123@7");
    }
}
