//! # motion-types
//!
//! Shadow document types for the motion-triggered camera agent.
//!
//! This crate provides the foundational types used across all motion-kvs crates:
//! - [`SensorLevel`] - The sampled level of the motion sensor line
//! - [`RecordingState`] - Whether the recording pipeline should be producing output
//! - [`StateDocument`] - The `{Camera, Motion}` document exchanged with the device shadow
//! - [`StateDelta`] - An asynchronous change notification for the desired document
//! - [`DecodeError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod document;
mod error;
mod level;

pub use document::{StateDelta, StateDocument, DELTA_START_THRESHOLD};
pub use error::DecodeError;
pub use level::{RecordingState, SensorLevel};
