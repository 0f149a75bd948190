//! Pipeline driven by external shell commands.
//!
//! The capture chain runs as its own process (a `gst-launch-1.0` line, a
//! systemd unit, ...). Start and pause are mapped onto user-supplied
//! commands that run through `sh -c` only when the state actually changes.

use super::{PipelineError, RecordingPipeline};
use async_trait::async_trait;
use motion_kvs_types::RecordingState;
use tokio::process::Command;
use tokio::sync::Mutex;

/// Pipeline whose state changes run configured commands.
///
/// The state lock is held while a command runs, so concurrent callers are
/// serialised and each real change runs its command exactly once.
#[derive(Debug)]
pub struct HookPipeline {
    start_command: Option<String>,
    pause_command: Option<String>,
    state: Mutex<RecordingState>,
}

impl HookPipeline {
    /// Create a paused pipeline. A `None` command makes that change a pure
    /// bookkeeping step.
    pub fn new(start_command: Option<String>, pause_command: Option<String>) -> Self {
        Self {
            start_command,
            pause_command,
            state: Mutex::new(RecordingState::Idle),
        }
    }

    async fn transition(&self, target: RecordingState) -> Result<(), PipelineError> {
        let mut state = self.state.lock().await;
        if *state == target {
            return Ok(());
        }

        let command = match target {
            RecordingState::Recording => self.start_command.as_deref(),
            RecordingState::Idle => self.pause_command.as_deref(),
        };
        if let Some(command) = command {
            run(command).await?;
        }

        *state = target;
        tracing::info!("Pipeline is now {}", target);
        Ok(())
    }
}

async fn run(command: &str) -> Result<(), PipelineError> {
    tracing::debug!("Running pipeline hook: {}", command);
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .status()
        .await
        .map_err(|source| PipelineError::Spawn {
            command: command.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(PipelineError::CommandFailed {
            command: command.to_string(),
            status: status.to_string(),
        })
    }
}

#[async_trait]
impl RecordingPipeline for HookPipeline {
    async fn start(&self) -> Result<(), PipelineError> {
        self.transition(RecordingState::Recording).await
    }

    async fn pause(&self) -> Result<(), PipelineError> {
        self.transition(RecordingState::Idle).await
    }

    async fn state(&self) -> RecordingState {
        *self.state.lock().await
    }
}
