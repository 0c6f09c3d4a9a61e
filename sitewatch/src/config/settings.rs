//! Configuration settings, one struct per INI section.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::mosaic::PlacementPolicy;

/// Contents of `config.ini` after defaults have been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub service: ServiceSettings,
    pub metadata: MetadataSettings,
    pub survey: SurveySettings,
    /// Year to dataset locator (or bare `pb=` fragment).
    pub versions: BTreeMap<u32, String>,
    pub classifier: ClassifierSettings,
    pub output: OutputSettings,
    pub logging: LoggingSettings,
}

/// `[service]`
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub base_url: String,
    pub planet: String,
    pub user_agent: String,
    pub referer: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

/// `[metadata]`
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataSettings {
    pub container_threshold: usize,
}

/// `[survey]`
#[derive(Debug, Clone, PartialEq)]
pub struct SurveySettings {
    pub years: Vec<u32>,
    pub level: u8,
    pub resolution: u32,
    pub placement: PlacementPolicy,
    pub jpeg_quality: u8,
}

/// `[classifier]`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// `[output]`
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub image_dir: PathBuf,
    pub results_file: PathBuf,
    pub report_dir: PathBuf,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
    pub level: String,
}
