//! Playback configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `TEMPO_*` environment variables (`TEMPO_TICK_INTERVAL_MS=250`,
//! `TEMPO_ALLOWED_SCHEMES=https,file`).

use crate::error::ConfigError;
use crate::types::RepeatMode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const ENV_PREFIX: &str = "TEMPO";

/// Controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial volume (0.0 - 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Start with shuffle enabled
    #[serde(default)]
    pub shuffle: bool,

    /// Initial repeat mode
    #[serde(default)]
    pub repeat: RepeatMode,

    /// Position tick cadence in milliseconds (250 - 1000)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Artwork shown for tracks without their own
    #[serde(default = "default_placeholder_artwork")]
    pub placeholder_artwork: String,

    /// Locator schemes the transport may open
    #[serde(default = "default_allowed_schemes")]
    pub allowed_schemes: Vec<String>,

    /// Fixed shuffle seed for reproducible play orders
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            shuffle: false,
            repeat: RepeatMode::Off,
            tick_interval_ms: default_tick_interval_ms(),
            placeholder_artwork: default_placeholder_artwork(),
            allowed_schemes: default_allowed_schemes(),
            shuffle_seed: None,
        }
    }
}

impl PlaybackConfig {
    /// Load from `path` (if given) and the environment, then validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_layered(path, None)
    }

    /// Like [`PlaybackConfig::load`], with `env` standing in for the process
    /// environment
    fn load_layered(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading playback config file");
            settings = settings.add_source(config::File::from(path));
        }

        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("allowed_schemes")
                .source(env),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.volume.is_finite() || !(0.0..=1.0).contains(&self.volume) {
            return Err(ConfigError::Invalid(format!(
                "volume must be between 0.0 and 1.0, got {}",
                self.volume
            )));
        }

        if !(250..=1000).contains(&self.tick_interval_ms) {
            return Err(ConfigError::Invalid(format!(
                "tick_interval_ms must be between 250 and 1000, got {}",
                self.tick_interval_ms
            )));
        }

        if self.allowed_schemes.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "allowed_schemes must name at least one scheme".to_string(),
            ));
        }

        if self.placeholder_artwork.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "placeholder_artwork must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Tick cadence as a duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

// Default values
fn default_volume() -> f32 {
    1.0
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_placeholder_artwork() -> String {
    "asset://artwork/placeholder.png".to_string()
}

fn default_allowed_schemes() -> Vec<String> {
    vec!["https".to_string(), "http".to_string(), "file".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn defaults() {
        let config = PlaybackConfig::default();
        assert_eq!(config.volume, 1.0);
        assert!(!config.shuffle);
        assert_eq!(config.repeat, RepeatMode::Off);
        assert_eq!(config.tick_interval(), Duration::from_millis(500));
        assert_eq!(config.allowed_schemes, vec!["https", "http", "file"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_sources_yield_defaults() {
        let config = PlaybackConfig::load_layered(None, no_env()).unwrap();
        assert_eq!(config, PlaybackConfig::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let file = toml_file(
            r#"
volume = 0.5
shuffle = true
repeat = "all"
tick_interval_ms = 250
"#,
        );

        let config = PlaybackConfig::load_layered(Some(file.path()), no_env()).unwrap();
        assert_eq!(config.volume, 0.5);
        assert!(config.shuffle);
        assert_eq!(config.repeat, RepeatMode::All);
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.placeholder_artwork, default_placeholder_artwork());
    }

    #[test]
    fn environment_overrides_file() {
        let file = toml_file("repeat = \"all\"\n");
        let env = HashMap::from([
            ("TEMPO_REPEAT".to_string(), "one".to_string()),
            ("TEMPO_TICK_INTERVAL_MS".to_string(), "750".to_string()),
            ("TEMPO_ALLOWED_SCHEMES".to_string(), "https,file".to_string()),
            ("TEMPO_SHUFFLE_SEED".to_string(), "7".to_string()),
        ]);

        let config = PlaybackConfig::load_layered(Some(file.path()), Some(env)).unwrap();
        assert_eq!(config.repeat, RepeatMode::One);
        assert_eq!(config.tick_interval_ms, 750);
        assert_eq!(config.allowed_schemes, vec!["https", "file"]);
        assert_eq!(config.shuffle_seed, Some(7));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let file = toml_file("volume = 1.5\n");
        let err = PlaybackConfig::load_layered(Some(file.path()), no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let config = PlaybackConfig {
            tick_interval_ms: 50,
            ..PlaybackConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PlaybackConfig {
            allowed_schemes: Vec::new(),
            ..PlaybackConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err =
            PlaybackConfig::load_layered(Some(Path::new("/nonexistent/tempo.toml")), no_env())
                .unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
