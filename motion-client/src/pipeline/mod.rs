//! Recording pipeline abstraction.
//!
//! The media chain itself (capture, encode, stream) is built elsewhere. The
//! controller only needs two idempotent commands: `start()` moves the
//! pipeline to producing output, `pause()` halts output without releasing
//! resources. Calling either twice in a row changes state at most once.
//!
//! Implementations must tolerate concurrent callers.

mod hook;
mod mock;

pub use hook::HookPipeline;
pub use mock::MockPipeline;

use async_trait::async_trait;
use motion_kvs_types::RecordingState;
use thiserror::Error;

/// Pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A state-change command could not be spawned.
    #[error("failed to run {command:?}: {source}")]
    Spawn {
        /// The command line.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A state-change command exited unsuccessfully.
    #[error("{command:?} exited with {status}")]
    CommandFailed {
        /// The command line.
        command: String,
        /// Exit status rendering.
        status: String,
    },

    /// The pipeline refused the state change.
    #[error("state change rejected: {0}")]
    Rejected(String),
}

/// A media pipeline that can be started and paused.
#[async_trait]
pub trait RecordingPipeline: Send + Sync {
    /// Start producing output. No-op if already recording.
    async fn start(&self) -> Result<(), PipelineError>;

    /// Halt output. No-op if already paused.
    async fn pause(&self) -> Result<(), PipelineError>;

    /// Current state.
    async fn state(&self) -> RecordingState;
}
