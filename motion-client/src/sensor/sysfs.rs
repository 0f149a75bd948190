//! GPIO line read through the sysfs interface.

use super::{MotionSensor, SensorError};
use async_trait::async_trait;
use motion_kvs_types::SensorLevel;
use std::path::{Path, PathBuf};

/// Sensor on a sysfs GPIO line (`{root}/gpio{pin}/value`).
///
/// `pin` is the sysfs line number, which is the chip base plus the BCM
/// number. The base is 0 on older Raspberry Pi kernels and 512 from 6.6 on.
#[derive(Debug, Clone)]
pub struct SysfsSensor {
    root: PathBuf,
    pin: u32,
}

impl SysfsSensor {
    /// Sensor for `pin` under the given sysfs GPIO root (usually `/sys/class/gpio`).
    pub fn new(root: impl Into<PathBuf>, pin: u32) -> Self {
        Self {
            root: root.into(),
            pin,
        }
    }

    /// Path of the line's value file.
    pub fn value_path(&self) -> PathBuf {
        self.pin_dir().join("value")
    }

    fn pin_dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.pin))
    }

    /// Export the pin and configure it as an input, unless already exported.
    pub async fn prepare(&self) -> Result<(), SensorError> {
        if !Path::new(&self.value_path()).exists() {
            tracing::info!("Exporting GPIO {}", self.pin);
            tokio::fs::write(self.root.join("export"), self.pin.to_string()).await?;
        }
        tokio::fs::write(self.pin_dir().join("direction"), "in").await?;
        Ok(())
    }
}

#[async_trait]
impl MotionSensor for SysfsSensor {
    async fn read(&self) -> Result<SensorLevel, SensorError> {
        let raw = tokio::fs::read_to_string(self.value_path()).await?;
        match raw.trim() {
            "0" => Ok(SensorLevel::Inactive),
            "1" => Ok(SensorLevel::Active),
            other => Err(SensorError::InvalidValue(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_line(root: &Path, pin: u32, value: &str) {
        let dir = root.join(format!("gpio{}", pin));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("value"), value).unwrap();
    }

    #[tokio::test]
    async fn reads_line_level() {
        let root = tempfile::tempdir().unwrap();
        let sensor = SysfsSensor::new(root.path(), 18);

        fake_line(root.path(), 18, "1\n");
        assert_eq!(sensor.read().await.unwrap(), SensorLevel::Active);

        fake_line(root.path(), 18, "0\n");
        assert_eq!(sensor.read().await.unwrap(), SensorLevel::Inactive);
    }

    #[tokio::test]
    async fn garbage_value_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        fake_line(root.path(), 4, "high");
        let sensor = SysfsSensor::new(root.path(), 4);

        assert!(matches!(
            sensor.read().await,
            Err(SensorError::InvalidValue(v)) if v == "high"
        ));
    }

    #[tokio::test]
    async fn missing_line_is_an_io_error() {
        let root = tempfile::tempdir().unwrap();
        let sensor = SysfsSensor::new(root.path(), 18);
        assert!(matches!(sensor.read().await, Err(SensorError::Io(_))));
    }

    #[tokio::test]
    async fn prepare_sets_direction_on_exported_pin() {
        let root = tempfile::tempdir().unwrap();
        fake_line(root.path(), 18, "0");
        let sensor = SysfsSensor::new(root.path(), 18);

        sensor.prepare().await.unwrap();

        let direction = std::fs::read_to_string(root.path().join("gpio18/direction")).unwrap();
        assert_eq!(direction, "in");
        assert!(!root.path().join("export").exists());
    }
}
