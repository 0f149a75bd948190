//! Reconciliation state machine for the camera agent.
//!
//! This module merges three signal sources into one recording decision:
//! rising edges on the motion sensor, periodic polls of the desired shadow
//! document, and asynchronous deltas pushed by the shadow. It takes events
//! as input and produces a list of actions to execute.
//!
//! The actual I/O (fetching and writing shadow documents, starting and
//! pausing the pipeline, sleeping between writes) is performed by
//! motion-client, not by this module.
//!
//! # Cadence
//!
//! One [`Event::SensorTick`] arrives per tick (nominally one second). The
//! shadow is polled when the countdown drops below [`POLL_GATE`], which
//! happens on the first tick, roughly every [`POLL_CADENCE`] ticks after
//! that, and on the tick of every motion edge.
//!
//! # Watchdog
//!
//! Every full poll that finds the camera on counts towards the watchdog.
//! Once more than [`WATCHDOG_LIMIT`] consecutive polls have seen the camera
//! on, the machine desires and reports the camera off and pauses the
//! pipeline itself. With a one-second tick that bounds unattended recording
//! to about two minutes even if the remote side never turns it off.

use motion_kvs_types::{RecordingState, SensorLevel, StateDelta, StateDocument};

use crate::edge::EdgeDetector;

/// Ticks between mandatory polls of the shadow once a poll has completed.
pub const POLL_CADENCE: u32 = 30;

/// The shadow is polled when the countdown, after decrementing, is below this.
pub const POLL_GATE: u32 = 2;

/// Consecutive camera-on polls tolerated before the watchdog forces a stop.
pub const WATCHDOG_LIMIT: u32 = 3;

/// Countdown value that makes the very next tick poll the shadow.
pub const INITIAL_POLL_COUNTDOWN: u32 = 1;

/// The loop's own state. Volatile: a restart begins from [`ControlState::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    /// Ticks left until the next mandatory poll.
    pub poll_countdown: u32,
    /// Last camera state commanded to the pipeline.
    pub previous_camera: RecordingState,
    /// Edge detector holding the previous sensor level.
    pub edge: EdgeDetector,
    /// A motion edge occurred and has not been reported upstream yet.
    pub motion_pending: bool,
    /// Consecutive polls that have seen the camera on.
    pub active_duration: u32,
    /// Level sampled on the most recent tick.
    pub last_level: SensorLevel,
}

impl ControlState {
    /// Fresh state: poll on the first tick, everything else off.
    pub fn new() -> Self {
        Self {
            poll_countdown: INITIAL_POLL_COUNTDOWN,
            previous_camera: RecordingState::Idle,
            edge: EdgeDetector::new(),
            motion_pending: false,
            active_duration: 0,
            last_level: SensorLevel::Inactive,
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events fed into the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The sensor was sampled for this tick.
    SensorTick {
        /// The freshly sampled level.
        level: SensorLevel,
    },
    /// The desired document requested by [`Action::FetchDesired`] arrived.
    DesiredFetched {
        /// Decoded desired document.
        desired: StateDocument,
    },
    /// The shadow pushed a change to the desired document.
    DeltaReceived {
        /// The decoded delta.
        delta: StateDelta,
    },
}

/// Actions to be executed by motion-client, in order.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Fetch the desired document and feed it back as [`Event::DesiredFetched`].
    FetchDesired,
    /// Write the reported document.
    Report(StateDocument),
    /// Write the desired document.
    Desire(StateDocument),
    /// Pause briefly so the shadow can settle after a write.
    Settle,
    /// Command the pipeline to start producing output.
    StartPipeline,
    /// Command the pipeline to pause.
    PausePipeline,
}

/// The reconciliation state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    state: ControlState,
}

impl Reconciler {
    /// Create a reconciler with fresh [`ControlState`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions that announce the paused startup state to the shadow.
    ///
    /// Run once before the first tick so the remote view matches a pipeline
    /// that always starts paused.
    pub fn boot(&self) -> Vec<Action> {
        vec![
            Action::Desire(StateDocument::idle()),
            Action::Settle,
            Action::Report(StateDocument::idle()),
            Action::Settle,
        ]
    }

    /// Process an event and return the actions to execute.
    pub fn on_event(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::SensorTick { level } => self.on_tick(level),
            Event::DesiredFetched { desired } => self.on_desired(desired),
            Event::DeltaReceived { delta } => self.on_delta(delta),
        }
    }

    /// Current control state.
    pub fn control_state(&self) -> &ControlState {
        &self.state
    }

    /// Recording state last commanded to the pipeline.
    pub fn recording_state(&self) -> RecordingState {
        self.state.previous_camera
    }

    fn on_tick(&mut self, level: SensorLevel) -> Vec<Action> {
        self.state.last_level = level;

        if self.state.edge.detect(level) {
            self.state.motion_pending = true;
            self.state.poll_countdown = INITIAL_POLL_COUNTDOWN;
            self.state.active_duration = 0;
        }

        self.state.poll_countdown = self.state.poll_countdown.saturating_sub(1);
        if self.state.poll_countdown < POLL_GATE {
            vec![Action::FetchDesired]
        } else {
            vec![]
        }
    }

    fn on_desired(&mut self, desired: StateDocument) -> Vec<Action> {
        let mut actions = Vec::new();
        self.state.poll_countdown = POLL_CADENCE;

        // Motion wins over a stale "off" read within the same tick.
        let mut target = desired.recording_state();
        if self.state.motion_pending {
            actions.push(Action::Report(StateDocument::motion_detected()));
            actions.push(Action::Settle);
            self.state.motion_pending = false;
            target = RecordingState::Recording;
        }

        if target != self.state.previous_camera {
            actions.push(self.set_recording(target));
        }

        if target.is_recording() {
            self.state.active_duration += 1;
            if self.state.active_duration > WATCHDOG_LIMIT {
                actions.extend([
                    Action::Desire(StateDocument::idle()),
                    Action::Settle,
                    Action::Report(StateDocument::watchdog_reset(self.state.last_level)),
                    Action::Settle,
                ]);
                actions.push(self.set_recording(RecordingState::Idle));
            }
        }

        actions
    }

    fn on_delta(&mut self, delta: StateDelta) -> Vec<Action> {
        match delta.target() {
            Some(target) => vec![
                self.set_recording(target),
                Action::Report(StateDocument::confirmed(target)),
            ],
            None => vec![],
        }
    }

    /// Shared by the poll and delta paths: command the pipeline, record the
    /// new camera state and restart the watchdog window.
    fn set_recording(&mut self, target: RecordingState) -> Action {
        if self.state.previous_camera.is_recording() && !target.is_recording() {
            self.state.edge.reset();
        }
        self.state.previous_camera = target;
        self.state.active_duration = 0;

        match target {
            RecordingState::Recording => Action::StartPipeline,
            RecordingState::Idle => Action::PausePipeline,
        }
    }
}
