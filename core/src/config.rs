//! TOML Configuration File Support
//!
//! Configuration for the stage and its surfaces, read from
//! `$XDG_CONFIG_HOME/cozy-gremlin/config.toml`.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables (`GREMLIN_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [typing]
//! base_ms = 22
//! jitter_ms = 18
//! sentence_pause_ms = 90
//! stumble_chance = 0.04
//!
//! [timing]
//! intercept_dwell_ms = 1200
//! aside_dwell_ms = 2600
//! mood_smoothing = 6.0
//!
//! [collect]
//! max_items = 8
//! max_item_chars = 48
//!
//! [script]
//! path = "~/stories/apology.json"
//!
//! [display]
//! fps = 60
//! seed = 7
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stage::StageSettings;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Cli,
    Env,
    File,
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Typing cadence section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingToml {
    pub base_ms: Option<u64>,
    pub jitter_ms: Option<u64>,
    pub sentence_pause_ms: Option<u64>,
    pub pause_jitter_ms: Option<u64>,
    pub stumble_chance: Option<f64>,
    pub stumble_ms: Option<u64>,
    pub max_stumbles: Option<u32>,
    pub erase_ms: Option<u64>,
    pub erase_jitter_ms: Option<u64>,
}

/// Dwell and smoothing section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingToml {
    pub intercept_dwell_ms: Option<u64>,
    pub aside_dwell_ms: Option<u64>,
    pub mood_smoothing: Option<f32>,
}

/// Collect scene limits
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectToml {
    pub max_items: Option<usize>,
    pub max_item_chars: Option<usize>,
}

/// Scene document section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptToml {
    /// Path to a scene document; the embedded story is used when unset
    pub path: Option<String>,
}

/// Surface section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayToml {
    pub fps: Option<u32>,
    /// Fixed seed for typing jitter and confetti
    pub seed: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GremlinToml {
    pub typing: TypingToml,
    pub timing: TimingToml,
    pub collect: CollectToml,
    pub script: ScriptToml,
    pub display: DisplayToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved configuration
#[derive(Clone, Debug)]
pub struct GremlinConfig {
    /// Stage tunables, including the seed
    pub stage: StageSettings,

    /// Scene document to load instead of the embedded one
    pub script_path: Option<PathBuf>,

    /// Target frame rate of the surface
    pub fps: u32,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for GremlinConfig {
    fn default() -> Self {
        Self {
            stage: StageSettings::default(),
            script_path: None,
            fps: 60,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl GremlinConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the highest-priority source that contributed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Frame budget for the surface loop
    #[must_use]
    pub fn frame_duration(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.fps.max(1)))
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cadence = &self.stage.cadence;
        if !(0.0..=1.0).contains(&cadence.stumble_chance) {
            return Err(ConfigError::ValidationError(format!(
                "typing.stumble_chance must be within 0..=1, got {}",
                cadence.stumble_chance
            )));
        }
        if !(1..=240).contains(&self.fps) {
            return Err(ConfigError::ValidationError(format!(
                "display.fps must be within 1..=240, got {}",
                self.fps
            )));
        }
        if self.stage.mood_smoothing.is_nan() || self.stage.mood_smoothing <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "timing.mood_smoothing must be positive, got {}",
                self.stage.mood_smoothing
            )));
        }
        if self.stage.collect_max_items == 0 || self.stage.collect_max_chars == 0 {
            return Err(ConfigError::ValidationError(
                "collect limits must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/cozy-gremlin/config.toml` or
/// `~/.config/cozy-gremlin/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("cozy-gremlin").join("config.toml"))
}

/// Load configuration from the default path and the process environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if a
/// resolved value is out of range. A missing file is not an error.
pub fn load_config() -> Result<GremlinConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path and the process environment
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or fails validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<GremlinConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<GremlinConfig, ConfigError> {
    let mut config = GremlinConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: GremlinToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

fn apply_toml_config(config: &mut GremlinConfig, toml: &GremlinToml) {
    let cadence = &mut config.stage.cadence;
    let typing = &toml.typing;
    if let Some(ms) = typing.base_ms {
        cadence.base = Duration::from_millis(ms);
    }
    if let Some(ms) = typing.jitter_ms {
        cadence.jitter = Duration::from_millis(ms);
    }
    if let Some(ms) = typing.sentence_pause_ms {
        cadence.sentence_pause = Duration::from_millis(ms);
    }
    if let Some(ms) = typing.pause_jitter_ms {
        cadence.pause_jitter = Duration::from_millis(ms);
    }
    if let Some(chance) = typing.stumble_chance {
        cadence.stumble_chance = chance;
    }
    if let Some(ms) = typing.stumble_ms {
        cadence.stumble = Duration::from_millis(ms);
    }
    if let Some(n) = typing.max_stumbles {
        cadence.max_stumbles = n;
    }
    if let Some(ms) = typing.erase_ms {
        cadence.erase_base = Duration::from_millis(ms);
    }
    if let Some(ms) = typing.erase_jitter_ms {
        cadence.erase_jitter = Duration::from_millis(ms);
    }

    if let Some(ms) = toml.timing.intercept_dwell_ms {
        config.stage.intercept_dwell = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.timing.aside_dwell_ms {
        config.stage.aside_dwell = Duration::from_millis(ms);
    }
    if let Some(rate) = toml.timing.mood_smoothing {
        config.stage.mood_smoothing = rate;
    }

    if let Some(n) = toml.collect.max_items {
        config.stage.collect_max_items = n;
    }
    if let Some(n) = toml.collect.max_item_chars {
        config.stage.collect_max_chars = n;
    }

    if let Some(ref path) = toml.script.path {
        config.script_path = Some(expand_home(path));
    }

    if let Some(fps) = toml.display.fps {
        config.fps = fps;
    }
    if toml.display.seed.is_some() {
        config.stage.seed = toml.display.seed;
    }
}

fn apply_env_config(config: &mut GremlinConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(path) = env("GREMLIN_SCRIPT") {
        config.script_path = Some(expand_home(&path));
        config.source = ConfigSource::Env;
    }
    if let Some(seed) = env("GREMLIN_SEED") {
        if let Ok(seed) = seed.parse::<u64>() {
            config.stage.seed = Some(seed);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(fps) = env("GREMLIN_FPS") {
        if let Ok(fps) = fps.parse::<u32>() {
            config.fps = fps;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(ms) = env("GREMLIN_TYPING_BASE_MS") {
        if let Ok(ms) = ms.parse::<u64>() {
            config.stage.cadence.base = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(ms) = env("GREMLIN_INTERCEPT_DWELL_MS") {
        if let Ok(ms) = ms.parse::<u64>() {
            config.stage.intercept_dwell = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map_or_else(|| PathBuf::from(path), |home| home.join(rest)),
        None => PathBuf::from(path),
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub script_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub fps: Option<u32>,
    /// Reveal everything at once (zero typing delays)
    pub instant_text: bool,
}

impl ConfigOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_script_path(mut self, path: PathBuf) -> Self {
        self.script_path = Some(path);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }

    #[must_use]
    pub fn with_instant_text(mut self, instant: bool) -> Self {
        self.instant_text = instant;
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut GremlinConfig) {
        if self.script_path.is_some() || self.seed.is_some() || self.fps.is_some() || self.instant_text {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref path) = self.script_path {
            config.script_path = Some(path.clone());
        }
        if self.seed.is_some() {
            config.stage.seed = self.seed;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if self.instant_text {
            let cadence = &mut config.stage.cadence;
            cadence.base = Duration::ZERO;
            cadence.jitter = Duration::ZERO;
            cadence.sentence_pause = Duration::ZERO;
            cadence.pause_jitter = Duration::ZERO;
            cadence.stumble_chance = 0.0;
            cadence.erase_base = Duration::ZERO;
            cadence.erase_jitter = Duration::ZERO;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = GremlinConfig::default();
        assert_eq!(config.fps, 60);
        assert_eq!(config.stage.intercept_dwell, Duration::from_millis(1200));
        assert_eq!(config.stage.collect_max_items, 8);
        assert!(config.script_path.is_none());
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("cozy-gremlin"));
            assert!(p.to_string_lossy().ends_with("config.toml"));
        }
    }

    #[test]
    fn test_parse_valid_toml() {
        let file = write_toml(
            r#"
[typing]
base_ms = 30
stumble_chance = 0.0

[timing]
intercept_dwell_ms = 800
mood_smoothing = 3.5

[collect]
max_items = 3

[script]
path = "/tmp/story.json"

[display]
fps = 30
seed = 9
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.stage.cadence.base, Duration::from_millis(30));
        assert_eq!(config.stage.cadence.stumble_chance, 0.0);
        assert_eq!(config.stage.intercept_dwell, Duration::from_millis(800));
        assert_eq!(config.stage.mood_smoothing, 3.5);
        assert_eq!(config.stage.collect_max_items, 3);
        assert_eq!(config.script_path, Some(PathBuf::from("/tmp/story.json")));
        assert_eq!(config.fps, 30);
        assert_eq!(config.stage.seed, Some(9));
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path, Some(file.path().to_path_buf()));
    }

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        let file = write_toml("[display]\nfps = 24\n");
        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.fps, 24);
        assert_eq!(config.stage.cadence, crate::typewriter::Cadence::default());
        assert_eq!(config.stage.aside_dwell, Duration::from_millis(2600));
    }

    #[test]
    fn test_missing_file_graceful() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        let config = load_config_with_env(Some(path), no_env).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = write_toml("[display\nfps = \"fast\"\n");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let file = write_toml("[typing]\nstumble_chance = 1.5\n");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));

        let file = write_toml("[display]\nfps = 0\n");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_toml("[display]\nfps = 30\nseed = 1\n");
        let env: HashMap<&str, &str> = [("GREMLIN_FPS", "50"), ("GREMLIN_SEED", "not-a-number")]
            .into_iter()
            .collect();

        let config = load_config_with_env(Some(file.path().to_path_buf()), |key| {
            env.get(key).map(|v| (*v).to_string())
        })
        .unwrap();

        assert_eq!(config.fps, 50);
        assert_eq!(config.stage.seed, Some(1));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_cli_overrides_env() {
        let env: HashMap<&str, &str> = [("GREMLIN_SEED", "5")].into_iter().collect();
        let mut config =
            load_config_with_env(None, |key| env.get(key).map(|v| (*v).to_string())).unwrap();
        assert_eq!(config.stage.seed, Some(5));

        ConfigOverrides::new()
            .with_seed(11)
            .with_script_path(PathBuf::from("story.json"))
            .apply(&mut config);

        assert_eq!(config.stage.seed, Some(11));
        assert_eq!(config.script_path, Some(PathBuf::from("story.json")));
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_empty_overrides_leave_source() {
        let mut config = GremlinConfig::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_instant_text_zeroes_cadence() {
        let mut config = GremlinConfig::default();
        ConfigOverrides::new().with_instant_text(true).apply(&mut config);
        assert_eq!(config.stage.cadence.base, Duration::ZERO);
        assert_eq!(config.stage.cadence.stumble_chance, 0.0);
    }

    #[test]
    fn test_frame_duration() {
        let config = GremlinConfig {
            fps: 50,
            ..GremlinConfig::default()
        };
        assert_eq!(config.frame_duration(), Duration::from_millis(20));
    }
}
