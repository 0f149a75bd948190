//! Motion sensor input.
//!
//! The sensor is a single active-high digital line sampled once per tick.

mod scripted;
mod sysfs;

pub use scripted::ScriptedSensor;
pub use sysfs::SysfsSensor;

use async_trait::async_trait;
use motion_kvs_types::SensorLevel;
use thiserror::Error;

/// Sensor errors.
///
/// The controller treats any read fault as "no change" for that tick.
#[derive(Debug, Error)]
pub enum SensorError {
    /// The line could not be read.
    #[error("failed to read sensor: {0}")]
    Io(#[from] std::io::Error),

    /// The line reported something other than 0 or 1.
    #[error("unexpected sensor value: {0:?}")]
    InvalidValue(String),
}

/// A digital input line.
#[async_trait]
pub trait MotionSensor: Send + Sync {
    /// Sample the line.
    async fn read(&self) -> Result<SensorLevel, SensorError>;
}
