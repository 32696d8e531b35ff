//! TOML-based configuration for the bridge.
//!
//! The file is read from the path given on the command line, or from the
//! platform-appropriate default location:
//! - Windows:  `%APPDATA%\IrisBridge\config.toml`
//! - Linux:    `~/.config/irisbridge/config.toml`
//! - macOS:    `~/Library/Application Support/IrisBridge/config.toml`
//!
//! Example:
//!
//! ```toml
//! [driver]
//! embedded = true
//! columns = 40
//!
//! [internal]
//! path = "/dev/ttyS1"
//!
//! [external]
//! path = "/dev/ttyS0"
//! protocol = "eurobraille"
//!
//! [latch]
//! delay_ms = 1000
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent, so a partial file (or no file at
//! all) still yields a complete configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use iris_core::ExternalProtocol;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A timer period is zero.
    #[error("{field} must be greater than zero")]
    ZeroPeriod { field: &'static str },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level bridge configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub internal: InternalPortConfig,
    /// Only used in embedded mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalPortConfig>,
    #[serde(default)]
    pub latch: LatchConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

/// General driver behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverConfig {
    /// Firmware counterpart (embedded) or a plain host-attached display.
    #[serde(default = "default_true")]
    pub embedded: bool,
    /// Number of text columns on the single-row display.
    #[serde(default = "default_columns")]
    pub columns: u8,
    /// Reported to a Eurobraille peer in the system information reply.
    #[serde(default = "default_serial_number")]
    pub serial_number: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Endpoint towards the onboard controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InternalPortConfig {
    #[serde(default = "default_internal_path")]
    pub path: PathBuf,
    #[serde(default = "default_internal_baud")]
    pub baud: u32,
    /// Bounded wait for the next byte while a frame is in progress.
    #[serde(default = "default_input_timeout_ms")]
    pub input_timeout_ms: u64,
}

/// Endpoint towards the PC or downstream device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalPortConfig {
    #[serde(default = "default_external_path")]
    pub path: PathBuf,
    #[serde(default = "default_input_timeout_ms")]
    pub input_timeout_ms: u64,
    /// Protocol selected at start-up; the line speed follows from it.
    #[serde(default)]
    pub protocol: ExternalProtocol,
}

/// Hardware latch monitoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatchConfig {
    /// Hold time before suspend/resume; `0` disables the monitor.
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default = "default_latch_interval_ms")]
    pub interval_ms: u64,
}

/// Event loop periods.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_external_poll_interval_ms")]
    pub external_poll_interval_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_columns() -> u8 {
    40
}
fn default_serial_number() -> String {
    "0000".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_internal_path() -> PathBuf {
    PathBuf::from("/dev/ttyS1")
}
fn default_external_path() -> PathBuf {
    PathBuf::from("/dev/ttyS0")
}
fn default_internal_baud() -> u32 {
    57600
}
fn default_input_timeout_ms() -> u64 {
    100
}
fn default_latch_interval_ms() -> u64 {
    100
}
fn default_poll_interval_ms() -> u64 {
    40
}
fn default_external_poll_interval_ms() -> u64 {
    10
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            embedded: default_true(),
            columns: default_columns(),
            serial_number: default_serial_number(),
            log_level: default_log_level(),
        }
    }
}

impl Default for InternalPortConfig {
    fn default() -> Self {
        Self {
            path: default_internal_path(),
            baud: default_internal_baud(),
            input_timeout_ms: default_input_timeout_ms(),
        }
    }
}

impl Default for ExternalPortConfig {
    fn default() -> Self {
        Self {
            path: default_external_path(),
            input_timeout_ms: default_input_timeout_ms(),
            protocol: ExternalProtocol::default(),
        }
    }
}

impl Default for LatchConfig {
    fn default() -> Self {
        Self {
            delay_ms: 0,
            interval_ms: default_latch_interval_ms(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            external_poll_interval_ms: default_external_poll_interval_ms(),
        }
    }
}

impl LatchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn external_poll_interval(&self) -> Duration {
        Duration::from_millis(self.external_poll_interval_ms)
    }
}

impl BridgeConfig {
    /// Checks values that deserialise fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroPeriod`] for a zero timer period.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("latch.interval_ms", self.latch.interval_ms),
            ("timing.poll_interval_ms", self.timing.poll_interval_ms),
            ("timing.external_poll_interval_ms", self.timing.external_poll_interval_ms),
        ];
        match periods.iter().find(|(_, value)| *value == 0) {
            Some(&(field, _)) => Err(ConfigError::ZeroPeriod { field }),
            None => Ok(()),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads a [`BridgeConfig`] from `path`, returning the defaults if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::ZeroPeriod`] if a timer period is zero.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let config: BridgeConfig = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => BridgeConfig::default(),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    config.validate()?;
    Ok(config)
}

/// Loads the config from the platform default location.
pub fn load_default_config() -> Result<BridgeConfig, ConfigError> {
    load_config(&config_file_path()?)
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &BridgeConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory including the `IrisBridge` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("IrisBridge"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("irisbridge"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("IrisBridge")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("iris_test_{}_{name}", std::process::id()))
            .join("config.toml")
    }

    #[test]
    fn test_defaults_match_documented_values() {
        // Arrange / Act
        let cfg = BridgeConfig::default();

        // Assert
        assert!(cfg.driver.embedded);
        assert_eq!(cfg.driver.columns, 40);
        assert_eq!(cfg.internal.baud, 57600);
        assert_eq!(cfg.latch.delay_ms, 0);
        assert_eq!(cfg.latch.interval_ms, 100);
        assert_eq!(cfg.timing.poll_interval(), Duration::from_millis(40));
        assert!(cfg.external.is_none());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: BridgeConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, BridgeConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_field_defaults() {
        // Arrange
        let toml_str = r#"
[driver]
columns = 32

[external]
protocol = "native"

[latch]
delay_ms = 1000
"#;

        // Act
        let cfg: BridgeConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.driver.columns, 32);
        assert_eq!(cfg.driver.log_level, "info");
        let external = cfg.external.expect("external section present");
        assert_eq!(external.protocol, ExternalProtocol::Native);
        assert_eq!(external.path, PathBuf::from("/dev/ttyS0"));
        assert_eq!(cfg.latch.delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_unknown_protocol_is_a_parse_error() {
        let result: Result<BridgeConfig, _> = toml::from_str("[external]\nprotocol = \"braille\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/config.toml");
        let cfg = load_config(&path).expect("missing file is not an error");
        assert_eq!(cfg, BridgeConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        // Arrange
        let path = temp_config_path("round_trip");
        let mut cfg = BridgeConfig::default();
        cfg.driver.serial_number = "1234".to_string();
        cfg.external = Some(ExternalPortConfig::default());
        cfg.latch.delay_ms = 750;

        // Act
        save_config(&path, &cfg).expect("save");
        let loaded = load_config(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_load_config_reports_parse_errors() {
        let path = temp_config_path("parse_error");
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).unwrap();
        }
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        let result = load_config(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_zero_timer_periods_are_rejected() {
        let cases = [
            ("[latch]\ndelay_ms = 1000\ninterval_ms = 0", "latch.interval_ms"),
            ("[timing]\npoll_interval_ms = 0", "timing.poll_interval_ms"),
            ("[timing]\nexternal_poll_interval_ms = 0", "timing.external_poll_interval_ms"),
        ];

        for (index, (content, expected)) in cases.iter().enumerate() {
            // Arrange
            let path = temp_config_path(&format!("zero_period_{index}"));
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir).unwrap();
            }
            std::fs::write(&path, content).unwrap();

            // Act
            let result = load_config(&path);

            // Assert
            match result {
                Err(ConfigError::ZeroPeriod { field }) => assert_eq!(field, *expected),
                other => panic!("{content:?} gave {other:?}"),
            }
            if let Some(dir) = path.parent() {
                std::fs::remove_dir_all(dir).ok();
            }
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(BridgeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("config.toml"), "got {path:?}");
        }
    }
}
