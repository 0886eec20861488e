//! Configuration for the analysis engine
//!
//! Loaded from an optional TOML file with two tables:
//!
//! ```toml
//! [analysis]
//! compound_strategy = "averaged"   # or "dominant"
//! peak_count = 5
//! peak_threshold = 0.0
//! divergence_count = 3
//! excerpts_per_minute = 3
//! excerpt_max_chars = 200
//! significance_alpha = 0.05
//! fingerprint_mode = "affect_only" # or "raw"
//! smoothing_window = 1
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every key is optional; missing keys take the built-in defaults. File
//! lookup order is handled by [`filmarc_common::config::resolve_config_path`].

use crate::scoring::CompoundStrategy;
use crate::similarity::FingerprintMode;
use filmarc_common::config::{read_config_file, resolve_config_path};
use filmarc_common::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, Level};

/// Top-level config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analysis parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub compound_strategy: CompoundStrategy,
    /// Peaks per polarity
    pub peak_count: usize,
    pub peak_threshold: f64,
    /// Divergence points per cross-language comparison
    pub divergence_count: usize,
    pub excerpts_per_minute: usize,
    pub excerpt_max_chars: usize,
    pub significance_alpha: f64,
    pub fingerprint_mode: FingerprintMode,
    /// Centered moving-average window for peak detection (1 = off)
    pub smoothing_window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            compound_strategy: CompoundStrategy::Averaged,
            peak_count: 5,
            peak_threshold: 0.0,
            divergence_count: 3,
            excerpts_per_minute: 3,
            excerpt_max_chars: 200,
            significance_alpha: 0.05,
            fingerprint_mode: FingerprintMode::AffectOnly,
            smoothing_window: 1,
        }
    }
}

impl AnalysisConfig {
    /// Reject values no component would accept
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("peak_count", self.peak_count),
            ("divergence_count", self.divergence_count),
            ("excerpts_per_minute", self.excerpts_per_minute),
            ("excerpt_max_chars", self.excerpt_max_chars),
            ("smoothing_window", self.smoothing_window),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(Error::Config(format!("analysis.{} must be >= 1", key)));
            }
        }
        if !(0.0..=1.0).contains(&self.peak_threshold) {
            return Err(Error::Config(format!(
                "analysis.peak_threshold must be within [0, 1], got {}",
                self.peak_threshold
            )));
        }
        if !(self.significance_alpha > 0.0 && self.significance_alpha < 1.0) {
            return Err(Error::Config(format!(
                "analysis.significance_alpha must be in (0, 1), got {}",
                self.significance_alpha
            )));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parsed log level; anything tracing does not recognize is a config error
    pub fn tracing_level(&self) -> Result<Level> {
        self.level.trim().parse::<Level>().map_err(|_| {
            Error::Config(format!(
                "logging.level must be one of trace, debug, info, warn, error; got '{}'",
                self.level
            ))
        })
    }
}

impl TomlConfig {
    /// Parse and validate config text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.analysis.validate()?;
        config.logging.tracing_level()?;
        Ok(config)
    }

    /// Resolve, read and parse the config file, or fall back to defaults
    pub fn load(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg)? {
            Some(path) => {
                let config = Self::from_toml_str(&read_config_file(&path)?)?;
                info!(path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filmarc_common::ErrorKind;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_analysis_table() {
        let config = TomlConfig::from_toml_str(
            r#"
            [analysis]
            compound_strategy = "dominant"
            peak_count = 10
            fingerprint_mode = "raw"
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.compound_strategy, CompoundStrategy::Dominant);
        assert_eq!(config.analysis.peak_count, 10);
        assert_eq!(config.analysis.fingerprint_mode, FingerprintMode::Raw);
        assert_eq!(config.analysis.divergence_count, 3);
    }

    #[test]
    fn test_logging_level_parsed() {
        let config = TomlConfig::from_toml_str("[logging]\nlevel = \"WARN\"").unwrap();
        assert_eq!(config.logging.tracing_level().unwrap(), Level::WARN);
        assert_eq!(LoggingConfig::default().tracing_level().unwrap(), Level::INFO);

        let bad = LoggingConfig {
            level: "loud".to_string(),
        };
        assert_eq!(bad.tracing_level().unwrap_err().kind(), ErrorKind::Config);
    }

    #[test]
    fn test_load_explicit_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

        let config = TomlConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.analysis, AnalysisConfig::default());

        let missing = file.path().with_extension("missing");
        assert_eq!(
            TomlConfig::load(Some(&missing)).unwrap_err().kind(),
            ErrorKind::Config
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        for toml in [
            "[analysis]\npeak_count = 0",
            "[analysis]\npeak_threshold = 1.5",
            "[analysis]\nsignificance_alpha = 0.0",
            "[analysis]\nsmoothing_window = 0",
            "[analysis]\ncompound_strategy = \"median\"",
            "[analysis]\nunknown_key = 1",
            "[logging]\nlevel = \"verbose\"",
        ] {
            let err = TomlConfig::from_toml_str(toml).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config, "{}", toml);
        }
    }
}
