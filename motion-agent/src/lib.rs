//! # motion-agent
//!
//! Motion-triggered camera streaming agent.
//!
//! This crate wires the control actor from motion-client to the real device:
//! the sysfs motion sensor, the device shadow over mutual TLS and the
//! recording pipeline hooks.
//!
//! ## Modules
//!
//! - `config`: TOML configuration loading
//! - `error`: Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;

pub use config::{Config, ConfigError};
pub use error::AgentError;

use motion_client::{
    Controller, HookPipeline, HttpShadowStore, MockStore, ScriptedSensor, ShadowCredentials,
    SysfsSensor,
};
use std::future::Future;

/// Fail with [`AgentError::MissingCredential`] unless all three credential files exist.
pub fn check_credentials(credentials: &ShadowCredentials) -> Result<(), AgentError> {
    for path in credentials.paths() {
        if !path.exists() {
            return Err(AgentError::MissingCredential {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Validate credentials and build the shadow client without starting anything.
pub fn check(config: &Config) -> Result<(), AgentError> {
    let credentials = config.shadow.credentials();
    check_credentials(&credentials)?;
    HttpShadowStore::new(&config.shadow.endpoint(), &credentials)?;
    Ok(())
}

/// Build the pipeline described by the `[pipeline]` section.
pub fn pipeline(config: &Config) -> HookPipeline {
    HookPipeline::new(
        config.pipeline.start_command.clone(),
        config.pipeline.pause_command.clone(),
    )
}

/// Run against the device until `shutdown` resolves.
pub async fn run<F>(config: &Config, shutdown: F) -> Result<(), AgentError>
where
    F: Future,
{
    let credentials = config.shadow.credentials();
    check_credentials(&credentials)?;

    let endpoint = config.shadow.endpoint();
    let store = HttpShadowStore::new(&endpoint, &credentials)?;
    tracing::info!("Using shadow {}", endpoint.url());

    let sensor = SysfsSensor::new(&config.sensor.sysfs_root, config.sensor.sysfs_line());
    sensor.prepare().await?;
    tracing::info!("Watching motion on {}", sensor.value_path().display());

    let controller = Controller::new(
        config.control.controller(),
        store,
        pipeline(config),
        sensor,
    );
    controller.run(shutdown).await?;
    Ok(())
}

/// Run with an in-memory shadow and an idle sensor until `shutdown` resolves.
///
/// Pipeline hooks from the configuration still run.
pub async fn run_mock<F>(config: &Config, shutdown: F) -> Result<(), AgentError>
where
    F: Future,
{
    tracing::info!("Using in-memory shadow and idle sensor");
    let controller = Controller::new(
        config.control.controller(),
        MockStore::new(),
        pipeline(config),
        ScriptedSensor::idle(),
    );
    controller.run(shutdown).await?;
    Ok(())
}
