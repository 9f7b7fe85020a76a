//! Scheduler configuration: sectioned event options, board aliases, and
//! env-backed build-server settings.
//!
//! Event parameters live in an ini-shaped `section → option → value` map,
//! loadable from a YAML mapping. Sections are named `<keyword>_params`
//! (see [`crate::names`]); absent sections and options surface as hard
//! errors when queried, never silent defaults. Ambient settings such as
//! the build-server pool come from environment variables.

use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::names;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

// ── Sectioned event config ──────────────────────────────────

/// Section/option view over the scheduler's declarative configuration.
///
/// The file format itself is owned by the deployment (YAML here); events
/// only ever read typed options out of their own `<keyword>_params`
/// section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionedConfig {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl SectionedConfig {
    /// Create an empty config (populate with [`set`](Self::set)).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML mapping of sections to option maps.
    ///
    /// Scalar option values (strings, booleans, numbers) are stored in
    /// string form; nested mappings or sequences are malformed.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, BTreeMap<String, serde_yaml::Value>> =
            serde_yaml::from_str(yaml)?;

        let mut sections = BTreeMap::new();
        for (section, options) in raw {
            let mut parsed = BTreeMap::new();
            for (option, value) in options {
                parsed.insert(option.clone(), scalar_to_string(&section, &option, &value)?);
            }
            sections.insert(section, parsed);
        }
        Ok(Self { sections })
    }

    /// Read and parse a YAML config file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Insert or replace a single option.
    pub fn set(&mut self, section: &str, option: &str, value: &str) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(option.to_string(), value.to_string());
    }

    /// All section names, in sorted order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Section names that belong to event types (end in `_params`).
    pub fn event_sections(&self) -> impl Iterator<Item = &str> {
        self.sections().filter(|s| names::honored_section(s))
    }

    /// Whether the named section exists.
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Raw string value of `section.option`.
    pub fn get(&self, section: &str, option: &str) -> Result<&str, ConfigError> {
        let options = self
            .sections
            .get(section)
            .ok_or_else(|| ConfigError::MissingSection(section.to_string()))?;
        options
            .get(option)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingOption {
                section: section.to_string(),
                option: option.to_string(),
            })
    }

    /// Boolean value of `section.option`.
    ///
    /// Accepts `true/false`, `yes/no`, `on/off`, `1/0` (case-insensitive).
    pub fn get_bool(&self, section: &str, option: &str) -> Result<bool, ConfigError> {
        let value = self.get(section, option)?;
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(ConfigError::Malformed {
                section: section.to_string(),
                option: option.to_string(),
                value: value.to_string(),
                reason: "expected a boolean".to_string(),
            }),
        }
    }
}

/// Render a YAML scalar in string form; non-scalars are malformed.
fn scalar_to_string(
    section: &str,
    option: &str,
    value: &serde_yaml::Value,
) -> Result<String, ConfigError> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(ConfigError::Malformed {
            section: section.to_string(),
            option: option.to_string(),
            value: serde_yaml::to_string(other)
                .unwrap_or_default()
                .trim_end()
                .to_string(),
            reason: "expected a scalar value".to_string(),
        }),
    }
}

// ── Board alias table ───────────────────────────────────────

/// Immutable board → launch-control board-name aliases.
///
/// Some boards are addressed under a different name in the alternate build
/// system. Unmapped boards translate to themselves.
#[derive(Debug, Clone, Default)]
pub struct BoardAliases {
    map: BTreeMap<String, String>,
}

impl BoardAliases {
    /// An empty table: every board translates to itself.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The launch-control name for `board`.
    pub fn translate<'a>(&'a self, board: &'a str) -> &'a str {
        self.map.get(board).map(String::as_str).unwrap_or(board)
    }

    /// Number of aliased boards.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the table has no aliases.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BoardAliases {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            map: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

// ── Build servers ───────────────────────────────────────────

/// Build-metadata server pool settings, read from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildServerConfig {
    /// Base URLs of the pool members.
    pub endpoints: Vec<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl BuildServerConfig {
    /// Read pool settings from `CADENCE_BUILD_SERVERS` (comma-separated
    /// base URLs) and `CADENCE_BUILD_SERVER_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let endpoints = env_opt("CADENCE_BUILD_SERVERS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().trim_end_matches('/').to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            endpoints,
            timeout_secs: env_or("CADENCE_BUILD_SERVER_TIMEOUT_SECS", "30")
                .parse()
                .unwrap_or(30),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.endpoints.is_empty()
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!(
            "  build servers: {} endpoint(s), timeout={}s",
            self.endpoints.len(),
            self.timeout_secs
        );
    }

    /// Redacted view safe for API responses (endpoint count only).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "endpoints": self.endpoints.len(),
            "timeout_secs": self.timeout_secs,
            "configured": self.is_configured(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_YAML: &str = r#"
nightly_params:
  always_handle: false
  hour: 21
weekly_params:
  always_handle: true
general:
  cycle_secs: 300
"#;

    // ── from_yaml_str ───────────────────────────────────────────────

    #[test]
    fn parses_sections_and_scalars() {
        let config = SectionedConfig::from_yaml_str(SAMPLE_YAML).unwrap();
        assert_eq!(config.get("nightly_params", "hour").unwrap(), "21");
        assert_eq!(config.get("general", "cycle_secs").unwrap(), "300");
    }

    #[test]
    fn yaml_booleans_become_bools() {
        let config = SectionedConfig::from_yaml_str(SAMPLE_YAML).unwrap();
        assert!(!config.get_bool("nightly_params", "always_handle").unwrap());
        assert!(config.get_bool("weekly_params", "always_handle").unwrap());
    }

    #[test]
    fn nested_values_are_malformed() {
        let yaml = "nightly_params:\n  always_handle: [1, 2]\n";
        let err = SectionedConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn from_yaml_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scheduler.yml");
        std::fs::write(&path, SAMPLE_YAML).unwrap();

        let config = SectionedConfig::from_yaml_file(&path).unwrap();
        assert!(config.has_section("nightly_params"));
    }

    #[test]
    fn from_yaml_file_missing_is_io_error() {
        let err = SectionedConfig::from_yaml_file("/nonexistent/scheduler.yml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    // ── get / get_bool ──────────────────────────────────────────────

    #[test]
    fn missing_section_is_an_error() {
        let config = SectionedConfig::from_yaml_str(SAMPLE_YAML).unwrap();
        let err = config.get("absent_params", "always_handle").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection(s) if s == "absent_params"));
    }

    #[test]
    fn missing_option_is_an_error() {
        let config = SectionedConfig::from_yaml_str(SAMPLE_YAML).unwrap();
        let err = config.get("nightly_params", "absent").unwrap_err();
        assert!(matches!(err, ConfigError::MissingOption { .. }));
    }

    #[test]
    fn get_bool_accepts_ini_spellings() {
        let mut config = SectionedConfig::new();
        config.set("s", "a", "Yes");
        config.set("s", "b", "off");
        config.set("s", "c", "1");
        assert!(config.get_bool("s", "a").unwrap());
        assert!(!config.get_bool("s", "b").unwrap());
        assert!(config.get_bool("s", "c").unwrap());
    }

    #[test]
    fn get_bool_rejects_garbage() {
        let mut config = SectionedConfig::new();
        config.set("s", "a", "nightly");
        let err = config.get_bool("s", "a").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    // ── event_sections ──────────────────────────────────────────────

    #[test]
    fn event_sections_filters_by_suffix() {
        let config = SectionedConfig::from_yaml_str(SAMPLE_YAML).unwrap();
        let sections: Vec<&str> = config.event_sections().collect();
        assert_eq!(sections, vec!["nightly_params", "weekly_params"]);
    }

    // ── BoardAliases ────────────────────────────────────────────────

    #[test]
    fn aliases_translate_mapped_boards() {
        let aliases: BoardAliases = [("veyron_minnie-cheets", "tot")].into_iter().collect();
        assert_eq!(aliases.translate("veyron_minnie-cheets"), "tot");
    }

    #[test]
    fn aliases_pass_unmapped_boards_through() {
        let aliases = BoardAliases::empty();
        assert_eq!(aliases.translate("shamu"), "shamu");
    }

    // ── BuildServerConfig ───────────────────────────────────────────

    // Both cases share one test: the env var is process-global and tests
    // run in parallel threads.
    #[test]
    fn build_servers_from_env() {
        std::env::remove_var("CADENCE_BUILD_SERVERS");
        let config = BuildServerConfig::from_env();
        assert!(config.endpoints.is_empty());
        assert!(!config.is_configured());
        assert_eq!(config.timeout_secs, 30);

        std::env::set_var(
            "CADENCE_BUILD_SERVERS",
            "http://ds1.example.com:8080/, http://ds2.example.com:8080",
        );
        let config = BuildServerConfig::from_env();
        assert_eq!(
            config.endpoints,
            vec![
                "http://ds1.example.com:8080".to_string(),
                "http://ds2.example.com:8080".to_string(),
            ]
        );
        assert!(config.is_configured());
        std::env::remove_var("CADENCE_BUILD_SERVERS");
    }
}
