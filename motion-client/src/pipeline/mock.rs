//! Mock pipeline for testing.

use super::{PipelineError, RecordingPipeline};
use async_trait::async_trait;
use motion_kvs_types::RecordingState;
use std::sync::{Arc, Mutex};

/// Mock pipeline that records every real state change.
///
/// Starts paused. Clones share state.
#[derive(Debug, Default)]
pub struct MockPipeline {
    inner: Arc<Mutex<MockPipelineInner>>,
}

#[derive(Debug, Default)]
struct MockPipelineInner {
    state: RecordingState,
    transitions: Vec<RecordingState>,
    commands: usize,
    fail_next: Option<String>,
}

impl MockPipeline {
    /// Create a new paused mock pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// States entered so far, one entry per actual change.
    pub fn transitions(&self) -> Vec<RecordingState> {
        let inner = self.inner.lock().unwrap();
        inner.transitions.clone()
    }

    /// Number of start/pause calls, including no-ops.
    pub fn commands(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.commands
    }

    /// Current state without going through the trait.
    pub fn current(&self) -> RecordingState {
        let inner = self.inner.lock().unwrap();
        inner.state
    }

    /// Cause the next start() or pause() to fail with the given error.
    pub fn fail_next(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next = Some(error.to_string());
    }

    fn set(&self, target: RecordingState) -> Result<(), PipelineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.commands += 1;

        if let Some(error) = inner.fail_next.take() {
            return Err(PipelineError::Rejected(error));
        }

        if inner.state != target {
            inner.state = target;
            inner.transitions.push(target);
        }
        Ok(())
    }
}

impl Clone for MockPipeline {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl RecordingPipeline for MockPipeline {
    async fn start(&self) -> Result<(), PipelineError> {
        self.set(RecordingState::Recording)
    }

    async fn pause(&self) -> Result<(), PipelineError> {
        self.set(RecordingState::Idle)
    }

    async fn state(&self) -> RecordingState {
        self.current()
    }
}
