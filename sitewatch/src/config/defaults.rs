//! Default configuration values.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::classify::{DEFAULT_CLASSIFIER_ENDPOINT, DEFAULT_CLASSIFIER_MODEL};
use crate::locator::{DEFAULT_BASE_URL, DEFAULT_PLANET};
use crate::metadata::NODE_CONTAINER_THRESHOLD;
use crate::mosaic::{PlacementPolicy, DEFAULT_JPEG_QUALITY};
use crate::provider::{
    DEFAULT_MAX_RETRIES, DEFAULT_REFERER, DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT,
};
use crate::survey::{DEFAULT_IMAGE_DIR, DEFAULT_OCTANT_LEVEL, DEFAULT_RESOLUTION, DEFAULT_RESULTS_FILE};

use super::settings::{
    ClassifierSettings, ConfigFile, LoggingSettings, MetadataSettings, OutputSettings,
    ServiceSettings, SurveySettings,
};

/// Environment variable that overrides `[classifier] api_key`.
pub const CLASSIFIER_API_KEY_ENV: &str = "SITEWATCH_CLASSIFIER_API_KEY";

pub const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LOG_FILE: &str = "sitewatch.log";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Dataset locators captured from the web client for the default survey
/// years.
pub const DEFAULT_VERSIONS: &[(u32, &str)] = &[
    (2019, "!1m2!1s30524153625370535241!2u990!2e1!3u253!4b0!5i1033769"),
    (2024, "!1m2!1s30524153625370535063!2u990!2e1!3u350!4b0!5i1036419"),
];

pub const DEFAULT_SURVEY_YEARS: &[u32] = &[2019, 2024];

/// `~/.sitewatch`, or `.sitewatch` when no home directory is known.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sitewatch")
}

/// `~/.sitewatch/config.ini`.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            service: ServiceSettings {
                base_url: DEFAULT_BASE_URL.to_string(),
                planet: DEFAULT_PLANET.to_string(),
                user_agent: DEFAULT_USER_AGENT.to_string(),
                referer: DEFAULT_REFERER.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                max_retries: DEFAULT_MAX_RETRIES,
                retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            },
            metadata: MetadataSettings {
                container_threshold: NODE_CONTAINER_THRESHOLD,
            },
            survey: SurveySettings {
                years: DEFAULT_SURVEY_YEARS.to_vec(),
                level: DEFAULT_OCTANT_LEVEL,
                resolution: DEFAULT_RESOLUTION,
                placement: PlacementPolicy::default(),
                jpeg_quality: DEFAULT_JPEG_QUALITY,
            },
            versions: DEFAULT_VERSIONS
                .iter()
                .map(|(year, locator)| (*year, locator.to_string()))
                .collect::<BTreeMap<_, _>>(),
            classifier: ClassifierSettings {
                endpoint: DEFAULT_CLASSIFIER_ENDPOINT.to_string(),
                model: DEFAULT_CLASSIFIER_MODEL.to_string(),
                api_key: None,
                timeout_secs: DEFAULT_CLASSIFIER_TIMEOUT_SECS,
            },
            output: OutputSettings {
                image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
                results_file: PathBuf::from(DEFAULT_RESULTS_FILE),
                report_dir: PathBuf::from("."),
            },
            logging: LoggingSettings {
                directory: config_directory().join("logs"),
                file: DEFAULT_LOG_FILE.to_string(),
                level: DEFAULT_LOG_LEVEL.to_string(),
            },
        }
    }
}
