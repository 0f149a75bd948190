//! Error types for motion-agent.

use std::path::PathBuf;

/// Main error type for motion-agent startup and operation.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// A device credential file does not exist.
    #[error("credential file not found: {}", path.display())]
    MissingCredential {
        /// The missing file.
        path: PathBuf,
    },

    /// The shadow store could not be set up.
    #[error("store error: {0}")]
    Store(#[from] motion_client::StoreError),

    /// The sensor line could not be prepared.
    #[error("sensor error: {0}")]
    Sensor(#[from] motion_client::SensorError),

    /// The control loop stopped on a fatal error.
    #[error("controller error: {0}")]
    Controller(#[from] motion_client::ControllerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_names_the_file() {
        let err = AgentError::MissingCredential {
            path: PathBuf::from("/etc/motion/root-CA.crt"),
        };
        assert_eq!(
            err.to_string(),
            "credential file not found: /etc/motion/root-CA.crt"
        );
    }

    #[test]
    fn controller_error_converts() {
        let inner = motion_client::ControllerError::Pipeline(
            motion_client::PipelineError::Rejected("busy".into()),
        );
        let err: AgentError = inner.into();
        assert!(err.to_string().starts_with("controller error"));
    }
}
