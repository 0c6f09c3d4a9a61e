//! Loading `config.ini` and turning it into component settings.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use super::defaults::{config_file_path, CLASSIFIER_API_KEY_ENV};
use super::parser::parse_ini;
use super::settings::ConfigFile;
use crate::classify::ClassifierConfig;
use crate::locator::{extract_versions, DatasetVersion, JPEG_TEXTURE_FORMAT};
use crate::provider::ServiceConfig;
use crate::survey::SurveyConfig;

/// Errors from loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] ini::Error),

    #[error("invalid value '{value}' for [{section}] {key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("no dataset version configured for {year}; add it to [versions]")]
    UnmappedYear { year: u32 },

    #[error("dataset locator for {year} lacks an epoch, version or timestamp: {value}")]
    IncompleteVersion { year: u32, value: String },

    #[error("no survey years configured")]
    NoYears,
}

impl ConfigFile {
    /// Loads `~/.sitewatch/config.ini`, or defaults when it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Loads the file at `path`, or defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            base_url: self.service.base_url.clone(),
            planet: self.service.planet.clone(),
            user_agent: self.service.user_agent.clone(),
            referer: self.service.referer.clone(),
            timeout: Duration::from_secs(self.service.timeout_secs),
            max_retries: self.service.max_retries,
            retry_base_delay: Duration::from_millis(self.service.retry_base_delay_ms),
            texture_format: JPEG_TEXTURE_FORMAT,
            container_threshold: self.metadata.container_threshold,
        }
    }

    /// Classifier settings, with the API key taken from
    /// `SITEWATCH_CLASSIFIER_API_KEY` when set.
    pub fn classifier_config(&self) -> ClassifierConfig {
        self.classifier_config_with_key(std::env::var(CLASSIFIER_API_KEY_ENV).ok())
    }

    /// Classifier settings with an explicit key override.
    pub fn classifier_config_with_key(&self, key: Option<String>) -> ClassifierConfig {
        let api_key = key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.classifier.api_key.clone());
        ClassifierConfig {
            endpoint: self.classifier.endpoint.clone(),
            model: self.classifier.model.clone(),
            api_key,
            timeout: Duration::from_secs(self.classifier.timeout_secs),
        }
    }

    /// Resolves a year's dataset from `[versions]`.
    pub fn dataset_for(&self, year: u32) -> Result<DatasetVersion, ConfigError> {
        let value = self
            .versions
            .get(&year)
            .ok_or(ConfigError::UnmappedYear { year })?;
        extract_versions(value)
            .to_dataset()
            .ok_or_else(|| ConfigError::IncompleteVersion {
                year,
                value: value.clone(),
            })
    }

    /// Survey settings for `[survey] years`.
    ///
    /// Every surveyed year must resolve to a complete dataset version.
    pub fn survey_config(&self) -> Result<SurveyConfig, ConfigError> {
        self.survey_config_for(&self.survey.years)
    }

    /// Survey settings for an explicit set of years.
    pub fn survey_config_for(&self, years: &[u32]) -> Result<SurveyConfig, ConfigError> {
        if years.is_empty() {
            return Err(ConfigError::NoYears);
        }
        let years = years
            .iter()
            .map(|&year| Ok((year, self.dataset_for(year)?)))
            .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

        Ok(SurveyConfig {
            level: self.survey.level,
            resolution: self.survey.resolution,
            years,
            image_dir: self.output.image_dir.clone(),
            results_path: self.output.results_file.clone(),
            placement: self.survey.placement,
            jpeg_quality: self.survey.jpeg_quality,
            ..SurveyConfig::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("config.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(&path, "[survey]\nlevel = 18\n\n[metadata]\ncontainer_threshold = 64\n")
            .unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.survey.level, 18);
        assert_eq!(config.service_config().container_threshold, 64);
    }

    #[test]
    fn test_invalid_file_reports_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(&path, "[service]\nmax_retries = many\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("[service] max_retries"));
    }

    #[test]
    fn test_default_years_resolve() {
        let survey = ConfigFile::default().survey_config().unwrap();
        let years: Vec<_> = survey.years.keys().copied().collect();
        assert_eq!(years, vec![2019, 2024]);
        assert_eq!(
            survey.years[&2024],
            DatasetVersion {
                epoch: 990,
                version: 350,
                timestamp: 1036419,
            }
        );
    }

    #[test]
    fn test_unmapped_year() {
        let err = ConfigFile::default().survey_config_for(&[2019, 2031]).unwrap_err();
        assert!(matches!(err, ConfigError::UnmappedYear { year: 2031 }));
    }

    #[test]
    fn test_incomplete_version() {
        let mut config = ConfigFile::default();
        config.versions.insert(2020, "!1m2!1s305!2u990".to_string());
        let err = config.survey_config_for(&[2020]).unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteVersion { year: 2020, .. }));
    }

    #[test]
    fn test_no_years() {
        let err = ConfigFile::default().survey_config_for(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::NoYears));
    }

    #[test]
    fn test_api_key_override() {
        let mut config = ConfigFile::default();
        config.classifier.api_key = Some("from-file".to_string());

        let overridden = config.classifier_config_with_key(Some("from-env".to_string()));
        assert_eq!(overridden.api_key.as_deref(), Some("from-env"));

        let blank = config.classifier_config_with_key(Some("  ".to_string()));
        assert_eq!(blank.api_key.as_deref(), Some("from-file"));

        let none = ConfigFile::default().classifier_config_with_key(None);
        assert_eq!(none.api_key, None);
    }
}
