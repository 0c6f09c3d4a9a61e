//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("service")) {
        let s = Section::new("service", section);
        s.string("base_url", &mut config.service.base_url);
        s.string("planet", &mut config.service.planet);
        s.string("user_agent", &mut config.service.user_agent);
        s.string("referer", &mut config.service.referer);
        s.parse(
            "timeout",
            &mut config.service.timeout_secs,
            "must be a positive integer (seconds)",
        )?;
        s.parse(
            "max_retries",
            &mut config.service.max_retries,
            "must be a non-negative integer",
        )?;
        s.parse(
            "retry_base_delay_ms",
            &mut config.service.retry_base_delay_ms,
            "must be a non-negative integer (milliseconds)",
        )?;
        if config.service.timeout_secs == 0 {
            return Err(s.invalid("timeout", "0", "must be a positive integer (seconds)"));
        }
    }

    if let Some(section) = ini.section(Some("metadata")) {
        let s = Section::new("metadata", section);
        s.parse(
            "container_threshold",
            &mut config.metadata.container_threshold,
            "must be a non-negative integer (bytes)",
        )?;
    }

    if let Some(section) = ini.section(Some("survey")) {
        let s = Section::new("survey", section);
        if let Some(v) = s.get("years") {
            config.survey.years = parse_years(v)
                .ok_or_else(|| s.invalid("years", v, "expected a comma-separated list of years"))?;
        }
        s.parse("level", &mut config.survey.level, "must be an integer from 0 to 255")?;
        s.parse(
            "resolution",
            &mut config.survey.resolution,
            "must be a positive integer",
        )?;
        s.parse(
            "placement",
            &mut config.survey.placement,
            "must be 'strict' or 'best-effort'",
        )?;
        s.parse(
            "jpeg_quality",
            &mut config.survey.jpeg_quality,
            "must be an integer from 1 to 100",
        )?;
        if !(1..=100).contains(&config.survey.jpeg_quality) {
            let value = config.survey.jpeg_quality.to_string();
            return Err(s.invalid("jpeg_quality", &value, "must be an integer from 1 to 100"));
        }
    }

    if let Some(section) = ini.section(Some("versions")) {
        for (key, value) in section.iter() {
            let year: u32 = key.trim().parse().map_err(|_| ConfigError::InvalidValue {
                section: "versions".to_string(),
                key: key.to_string(),
                value: value.to_string(),
                reason: "keys must be years".to_string(),
            })?;
            config.versions.insert(year, value.trim().to_string());
        }
    }

    if let Some(section) = ini.section(Some("classifier")) {
        let s = Section::new("classifier", section);
        s.string("endpoint", &mut config.classifier.endpoint);
        s.string("model", &mut config.classifier.model);
        if let Some(v) = s.get("api_key") {
            config.classifier.api_key = Some(v.to_string());
        }
        s.parse(
            "timeout",
            &mut config.classifier.timeout_secs,
            "must be a positive integer (seconds)",
        )?;
    }

    if let Some(section) = ini.section(Some("output")) {
        let s = Section::new("output", section);
        s.path("image_dir", &mut config.output.image_dir);
        s.path("results_file", &mut config.output.results_file);
        s.path("report_dir", &mut config.output.report_dir);
    }

    if let Some(section) = ini.section(Some("logging")) {
        let s = Section::new("logging", section);
        s.path("directory", &mut config.logging.directory);
        s.string("file", &mut config.logging.file);
        s.string("level", &mut config.logging.level);
    }

    Ok(config)
}

/// One INI section with helpers that skip blank values.
struct Section<'a> {
    name: &'static str,
    properties: &'a Properties,
}

impl<'a> Section<'a> {
    fn new(name: &'static str, properties: &'a Properties) -> Self {
        Self { name, properties }
    }

    /// Trimmed value, or `None` when absent or blank.
    fn get(&self, key: &str) -> Option<&'a str> {
        self.properties
            .get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn string(&self, key: &str, target: &mut String) {
        if let Some(v) = self.get(key) {
            *target = v.to_string();
        }
    }

    fn path(&self, key: &str, target: &mut PathBuf) {
        if let Some(v) = self.get(key) {
            *target = expand_tilde(v);
        }
    }

    fn parse<T: FromStr>(&self, key: &str, target: &mut T, reason: &str) -> Result<(), ConfigError> {
        if let Some(v) = self.get(key) {
            *target = v.parse().map_err(|_| self.invalid(key, v, reason))?;
        }
        Ok(())
    }

    fn invalid(&self, key: &str, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn parse_years(value: &str) -> Option<Vec<u32>> {
    let years = value
        .split(',')
        .map(str::trim)
        .filter(|y| !y.is_empty())
        .map(|y| y.parse().ok())
        .collect::<Option<Vec<u32>>>()?;
    (!years.is_empty()).then_some(years)
}

/// Expand a leading `~` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mosaic::PlacementPolicy;

    fn parse(text: &str) -> Result<ConfigFile, ConfigError> {
        parse_ini(&Ini::load_from_str(text).unwrap())
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_overlays_values() {
        let config = parse(
            r#"
[service]
base_url = https://tiles.example/rt
timeout = 10
max_retries = 5

[metadata]
container_threshold = 2048

[survey]
years = 2015, 2024
level = 19
placement = strict

[output]
image_dir = /tmp/composites
"#,
        )
        .unwrap();

        assert_eq!(config.service.base_url, "https://tiles.example/rt");
        assert_eq!(config.service.timeout_secs, 10);
        assert_eq!(config.service.max_retries, 5);
        assert_eq!(config.metadata.container_threshold, 2048);
        assert_eq!(config.survey.years, vec![2015, 2024]);
        assert_eq!(config.survey.level, 19);
        assert_eq!(config.survey.placement, PlacementPolicy::Strict);
        assert_eq!(config.output.image_dir, PathBuf::from("/tmp/composites"));
        assert_eq!(config.service.planet, "earth");
    }

    #[test]
    fn test_versions_section() {
        let config = parse(
            r#"
[versions]
2015 = !1m2!1s30524153625370535163!2u990!2e1!3u215!4b1!5i1031986
"#,
        )
        .unwrap();
        assert_eq!(config.versions.len(), 3);
        assert!(config.versions[&2015].contains("!3u215"));
    }

    #[test]
    fn test_non_numeric_year_key() {
        let err = parse("[versions]\nlatest = !2u990\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref section, .. } if section == "versions"
        ));
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            "[service]\ntimeout = soon\n",
            "[service]\ntimeout = 0\n",
            "[survey]\nyears = twenty\n",
            "[survey]\nplacement = sloppy\n",
            "[survey]\njpeg_quality = 0\n",
            "[survey]\nlevel = 300\n",
        ];
        for text in cases {
            assert!(
                matches!(parse(text), Err(ConfigError::InvalidValue { .. })),
                "accepted {:?}",
                text
            );
        }
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = parse("[classifier]\napi_key =\nmodel = \n").unwrap();
        assert_eq!(config.classifier.api_key, None);
        assert_eq!(config.classifier.model, "gpt-4o");
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/logs"), home.join("logs"));
        }
        assert_eq!(expand_tilde("/var/log"), PathBuf::from("/var/log"));
    }
}
