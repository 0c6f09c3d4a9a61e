//! INI configuration.
//!
//! `~/.sitewatch/config.ini` is optional. Every key has a default, and a
//! present file only overrides what it names:
//!
//! ```ini
//! [service]
//! base_url = https://kh.google.com/rt/tm
//! timeout = 30
//! max_retries = 3
//!
//! [survey]
//! years = 2019, 2024
//! level = 20
//! placement = best-effort
//!
//! [versions]
//! 2019 = !1m2!1s30524153625370535241!2u990!2e1!3u253!4b0!5i1033769
//!
//! [classifier]
//! model = gpt-4o
//!
//! [output]
//! image_dir = images
//! ```

mod defaults;
mod file;
mod parser;
mod settings;

pub use defaults::{
    config_directory, config_file_path, CLASSIFIER_API_KEY_ENV, DEFAULT_CLASSIFIER_TIMEOUT_SECS,
    DEFAULT_LOG_FILE, DEFAULT_LOG_LEVEL, DEFAULT_SURVEY_YEARS, DEFAULT_VERSIONS,
};
pub use file::ConfigError;
pub use settings::{
    ClassifierSettings, ConfigFile, LoggingSettings, MetadataSettings, OutputSettings,
    ServiceSettings, SurveySettings,
};
