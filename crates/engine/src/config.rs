//! Engine configuration
//!
//! Defaults match the reference timing (1000ms descent, 800ms line clear).
//! A TOML file can override any field, and environment variables override the
//! file:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `BLOCKFALL_CONFIG` | path of the TOML file |
//! | `BLOCKFALL_DROP_MS` | `drop_interval_ms` |
//! | `BLOCKFALL_CLEAR_DELAY_MS` | `line_clear_delay_ms` |
//! | `BLOCKFALL_SEED` | `seed` |

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{DROP_INTERVAL_MS, LINE_CLEAR_DELAY_MS};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "BLOCKFALL_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Automatic descent period used by the driver
    pub drop_interval_ms: u64,
    /// Delay before a multi-line clear collapses
    pub line_clear_delay_ms: u64,
    /// Piece RNG seed; random when absent
    pub seed: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            drop_interval_ms: DROP_INTERVAL_MS,
            line_clear_delay_ms: LINE_CLEAR_DELAY_MS,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load the file named by `BLOCKFALL_CONFIG` (if set), then apply
    /// environment overrides and validate.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim())?,
            _ => Self::default(),
        };
        base.with_env_overrides().validated()
    }

    /// Load `path`, then apply environment overrides and validate
    pub fn load_with_env(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load(path)?.with_env_overrides().validated()
    }

    /// Read and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validated()
    }

    /// Apply `BLOCKFALL_*` overrides from the process environment.
    ///
    /// Unparseable values are ignored. The result is not validated.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `BLOCKFALL_*` overrides read through `lookup`
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(ms) = lookup("BLOCKFALL_DROP_MS").and_then(|s| s.parse().ok()) {
            self.drop_interval_ms = ms;
        }
        if let Some(ms) = lookup("BLOCKFALL_CLEAR_DELAY_MS").and_then(|s| s.parse().ok()) {
            self.line_clear_delay_ms = ms;
        }
        if let Some(seed) = lookup("BLOCKFALL_SEED").and_then(|s| s.parse().ok()) {
            self.seed = Some(seed);
        }
        self
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.drop_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "drop_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn drop_interval(&self) -> Duration {
        Duration::from_millis(self.drop_interval_ms)
    }

    pub fn line_clear_delay(&self) -> Duration {
        Duration::from_millis(self.line_clear_delay_ms)
    }

    /// Configured seed, or a fresh random one
    pub fn seed_or_random(&self) -> u32 {
        self.seed.unwrap_or_else(|| fastrand::u32(1..))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_timing() {
        let config = EngineConfig::default();
        assert_eq!(config.drop_interval(), Duration::from_millis(1000));
        assert_eq!(config.line_clear_delay(), Duration::from_millis(800));
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("seed = 42\n").unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.drop_interval_ms, DROP_INTERVAL_MS);
    }

    #[test]
    fn test_zero_drop_interval_rejected() {
        let err = EngineConfig::from_toml_str("drop_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_zero_clear_delay_allowed() {
        let config = EngineConfig::from_toml_str("line_clear_delay_ms = 0\n").unwrap();
        assert_eq!(config.line_clear_delay(), Duration::ZERO);
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = EngineConfig::from_toml_str("drop_interval_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "drop_interval_ms = 250\nline_clear_delay_ms = 400").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.drop_interval_ms, 250);
        assert_eq!(config.line_clear_delay_ms, 400);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = EngineConfig::load("/nonexistent/blockfall.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_overrides_apply_over_file_values() {
        let base = EngineConfig::from_toml_str("drop_interval_ms = 250\nseed = 3").unwrap();
        let config = base.with_overrides(|key| match key {
            "BLOCKFALL_CLEAR_DELAY_MS" => Some("100".to_string()),
            "BLOCKFALL_SEED" => Some("not a number".to_string()),
            _ => None,
        });
        assert_eq!(config.drop_interval_ms, 250);
        assert_eq!(config.line_clear_delay_ms, 100);
        assert_eq!(config.seed, Some(3));
    }

    #[test]
    fn test_zero_drop_override_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "seed = 3").unwrap();

        let config = EngineConfig::load(file.path())
            .unwrap()
            .with_overrides(|key| (key == "BLOCKFALL_DROP_MS").then(|| "0".to_string()));
        assert_eq!(config.drop_interval_ms, 0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_seed_or_random_prefers_configured() {
        let config = EngineConfig {
            seed: Some(9),
            ..EngineConfig::default()
        };
        assert_eq!(config.seed_or_random(), 9);
        assert_ne!(EngineConfig::default().seed_or_random(), 0);
    }
}
