//! # motion-core
//!
//! Pure reconciliation logic for the motion camera agent (no I/O, instant tests).
//!
//! This crate implements the edge detector and the reconciliation state
//! machine without any sensor, network or pipeline I/O.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async, no sleeping)
//! - Deterministic behavior (same event sequence → same actions)
//! - Easy reasoning about the watchdog and poll cadence
//!
//! The actual I/O (reading the sensor, talking to the shadow, commanding the
//! pipeline) is performed by `motion-client`, which interprets the actions
//! produced by the state machine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod edge;
pub mod state;

pub use edge::EdgeDetector;
pub use state::{
    Action, ControlState, Event, Reconciler, INITIAL_POLL_COUNTDOWN, POLL_CADENCE, POLL_GATE,
    WATCHDOG_LIMIT,
};
