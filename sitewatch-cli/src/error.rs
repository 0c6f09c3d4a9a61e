//! CLI error handling with user-friendly messages.

use std::fmt;
use std::path::PathBuf;
use std::process;

use sitewatch::classify::ClassifyError;
use sitewatch::config::{ConfigError, CLASSIFIER_API_KEY_ENV};
use sitewatch::imagery::ImageryError;
use sitewatch::overlap::OverlapError;
use sitewatch::provider::ProviderError;
use sitewatch::survey::SurveyError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration could not be loaded or resolved
    Config(ConfigError),
    /// Invalid combination of arguments
    Usage(String),
    /// Tile service request failed
    Provider(ProviderError),
    /// Node data held no imagery
    Imagery(ImageryError),
    /// Classifier could not be set up
    Classifier(ClassifyError),
    /// Octant catalog could not be loaded
    Overlap(OverlapError),
    /// Areas, results or reports could not be read or written
    Survey(SurveyError),
    /// Failed to write output file
    FileWrite {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Classifier(ClassifyError::MissingApiKey) => {
                eprintln!();
                eprintln!(
                    "Set {} or add api_key under [classifier] in config.ini.",
                    CLASSIFIER_API_KEY_ENV
                );
            }
            CliError::Config(ConfigError::UnmappedYear { year }) => {
                eprintln!();
                eprintln!("Add the dataset locator for {} to config.ini:", year);
                eprintln!("  [versions]");
                eprintln!("  {} = !1m2!1s<path>!2u<epoch>!2e1!3u<version>!4b0!5i<timestamp>", year);
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::Provider(e) => write!(f, "Tile service error: {}", e),
            CliError::Imagery(e) => write!(f, "No imagery: {}", e),
            CliError::Classifier(e) => write!(f, "Classifier error: {}", e),
            CliError::Overlap(e) => write!(f, "Octant catalog error: {}", e),
            CliError::Survey(e) => write!(f, "{}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Provider(e) => Some(e),
            CliError::Imagery(e) => Some(e),
            CliError::Classifier(e) => Some(e),
            CliError::Overlap(e) => Some(e),
            CliError::Survey(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::Usage(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Provider(e)
    }
}

impl From<ImageryError> for CliError {
    fn from(e: ImageryError) -> Self {
        CliError::Imagery(e)
    }
}

impl From<ClassifyError> for CliError {
    fn from(e: ClassifyError) -> Self {
        CliError::Classifier(e)
    }
}

impl From<OverlapError> for CliError {
    fn from(e: OverlapError) -> Self {
        CliError::Overlap(e)
    }
}

impl From<SurveyError> for CliError {
    fn from(e: SurveyError) -> Self {
        CliError::Survey(e)
    }
}
