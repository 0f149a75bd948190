//! # motion-client
//!
//! Control actor and I/O seams for the motion camera agent.
//!
//! ## Features
//!
//! - **Single Control Actor**: sensor ticks and shadow deltas are serialised
//!   through one [`Controller`], so the poll path and the delta path never race
//! - **Store Abstraction**: pluggable shadow access (REST over mutual TLS, mock)
//! - **Pipeline Abstraction**: idempotent start/pause (command hooks, mock)
//! - **Sensor Abstraction**: sysfs GPIO line or a scripted sequence
//! - **Pure State Machine**: uses motion-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use motion_client::{Controller, ControllerConfig, MockPipeline, MockStore, ScriptedSensor};
//!
//! let controller = Controller::new(
//!     ControllerConfig::default(),
//!     MockStore::new(),
//!     MockPipeline::new(),
//!     ScriptedSensor::idle(),
//! );
//! controller.run(tokio::signal::ctrl_c()).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod pipeline;
pub mod sensor;
pub mod store;

pub use controller::{Controller, ControllerConfig, ControllerError};
pub use pipeline::{HookPipeline, MockPipeline, PipelineError, RecordingPipeline};
pub use sensor::{MotionSensor, ScriptedSensor, SensorError, SysfsSensor};
pub use store::{
    DeltaHandler, HttpShadowStore, MockStore, ShadowCredentials, ShadowEndpoint, StateStore,
    StoreCall, StoreError,
};
