//! Configuration loading for motion-agent.
//!
//! Configuration is loaded from a TOML file (default: `motion-agent.toml`).
//! Every section and field is optional.

use motion_client::{ControllerConfig, ShadowCredentials, ShadowEndpoint};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for motion-agent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Control loop timing.
    #[serde(default)]
    pub control: ControlConfig,
    /// Motion sensor line.
    #[serde(default)]
    pub sensor: SensorConfig,
    /// Device shadow endpoint and credentials.
    #[serde(default)]
    pub shadow: ShadowConfig,
    /// Recording pipeline hooks.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Control loop timing.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlConfig {
    /// Milliseconds between sensor samples (default: 1000).
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Milliseconds to wait after each shadow write (default: 1000).
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

/// Motion sensor configuration.
///
/// `gpio_pin` is the BCM line number. Kernels from 6.6 on register the
/// Raspberry Pi header chip at a sysfs base of 512 rather than 0, so on those
/// set `gpio_base = 512` (see `/sys/class/gpio/gpiochip*/base`).
#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    /// BCM line of the motion sensor (default: 18).
    #[serde(default = "default_gpio_pin")]
    pub gpio_pin: u32,
    /// sysfs number of the chip's first line (default: 0).
    #[serde(default)]
    pub gpio_base: u32,
    /// sysfs GPIO root (default: /sys/class/gpio).
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
}

/// Device shadow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ShadowConfig {
    /// Data endpoint host name.
    #[serde(default = "default_host")]
    pub host: String,
    /// HTTPS port (default: 8443).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Thing name whose shadow is used.
    #[serde(default = "default_thing_name")]
    pub thing_name: String,
    /// Root CA certificate (default: root-CA.crt).
    #[serde(default = "default_root_cert")]
    pub root_cert: PathBuf,
    /// Device certificate (default: device.pem.crt).
    #[serde(default = "default_certificate")]
    pub certificate: PathBuf,
    /// Device private key (default: device.pem.key).
    #[serde(default = "default_private_key")]
    pub private_key: PathBuf,
}

/// Recording pipeline hooks. Unset hooks only track state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    /// Shell command run when recording starts.
    pub start_command: Option<String>,
    /// Shell command run when recording pauses.
    pub pause_command: Option<String>,
}

// Default value functions
fn default_tick_ms() -> u64 {
    1000
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_gpio_pin() -> u32 {
    18
}

fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/sys/class/gpio")
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8443
}

fn default_thing_name() -> String {
    "motion-camera".to_string()
}

fn default_root_cert() -> PathBuf {
    PathBuf::from("root-CA.crt")
}

fn default_certificate() -> PathBuf {
    PathBuf::from("device.pem.crt")
}

fn default_private_key() -> PathBuf {
    PathBuf::from("device.pem.key")
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            gpio_pin: default_gpio_pin(),
            gpio_base: 0,
            sysfs_root: default_sysfs_root(),
        }
    }
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            thing_name: default_thing_name(),
            root_cert: default_root_cert(),
            certificate: default_certificate(),
            private_key: default_private_key(),
        }
    }
}

impl ControlConfig {
    /// Controller timing for these settings.
    pub fn controller(&self) -> ControllerConfig {
        ControllerConfig {
            tick_period: Duration::from_millis(self.tick_ms),
            settle_delay: Duration::from_millis(self.settle_ms),
        }
    }
}

impl SensorConfig {
    /// sysfs line number of the sensor pin.
    pub fn sysfs_line(&self) -> u32 {
        self.gpio_base + self.gpio_pin
    }
}

impl ShadowConfig {
    /// Endpoint part of the shadow settings.
    pub fn endpoint(&self) -> ShadowEndpoint {
        ShadowEndpoint {
            host: self.host.clone(),
            port: self.port,
            thing_name: self.thing_name.clone(),
        }
    }

    /// Credential part of the shadow settings.
    pub fn credentials(&self) -> ShadowCredentials {
        ShadowCredentials {
            root_cert: self.root_cert.clone(),
            certificate: self.certificate.clone(),
            private_key: self.private_key.clone(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
