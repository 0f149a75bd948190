//! Scripted sensor for tests and bench runs.

use super::{MotionSensor, SensorError};
use async_trait::async_trait;
use motion_kvs_types::SensorLevel;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Sensor that replays queued levels, then holds the last one.
///
/// Clones share the queue.
#[derive(Debug, Default)]
pub struct ScriptedSensor {
    inner: Arc<Mutex<ScriptedSensorInner>>,
}

#[derive(Debug, Default)]
struct ScriptedSensorInner {
    queue: VecDeque<SensorLevel>,
    last: SensorLevel,
    fail_next: Option<String>,
}

impl ScriptedSensor {
    /// A sensor that replays `levels` in order.
    pub fn new(levels: impl IntoIterator<Item = SensorLevel>) -> Self {
        let sensor = Self::default();
        for level in levels {
            sensor.push(level);
        }
        sensor
    }

    /// A sensor that always reads inactive.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Queue another level.
    pub fn push(&self, level: SensorLevel) {
        let mut inner = self.inner.lock().unwrap();
        inner.queue.push_back(level);
    }

    /// Cause the next read() to fail with the given error.
    pub fn fail_next(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next = Some(error.to_string());
    }
}

impl Clone for ScriptedSensor {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl MotionSensor for ScriptedSensor {
    async fn read(&self) -> Result<SensorLevel, SensorError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(error) = inner.fail_next.take() {
            return Err(SensorError::InvalidValue(error));
        }

        if let Some(level) = inner.queue.pop_front() {
            inner.last = level;
        }
        Ok(inner.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SensorLevel::{Active, Inactive};

    #[tokio::test]
    async fn replays_then_holds_last() {
        let sensor = ScriptedSensor::new([Inactive, Active]);

        assert_eq!(sensor.read().await.unwrap(), Inactive);
        assert_eq!(sensor.read().await.unwrap(), Active);
        assert_eq!(sensor.read().await.unwrap(), Active);
    }

    #[tokio::test]
    async fn idle_reads_inactive() {
        let sensor = ScriptedSensor::idle();
        assert_eq!(sensor.read().await.unwrap(), Inactive);
    }

    #[tokio::test]
    async fn forced_failure_does_not_consume_queue() {
        let sensor = ScriptedSensor::new([Active]);
        sensor.fail_next("line fault");

        assert!(sensor.read().await.is_err());
        assert_eq!(sensor.read().await.unwrap(), Active);
    }
}
