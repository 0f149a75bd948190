//! Controller - the single control actor of the motion agent.
//!
//! The controller owns the [`Reconciler`] and interprets its actions against
//! the store, the pipeline and the sensor. Sensor ticks and shadow deltas are
//! both funnelled through [`Controller::run`], so the two paths never touch the
//! control state at the same time.
//!
//! ```text
//! interval tick ─┐
//!                ├→ Controller → Reconciler (motion-core)
//! delta channel ─┘       ↓
//!               StateStore / RecordingPipeline
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use motion_kvs_core::{Action, Event, Reconciler};
use motion_kvs_types::{DecodeError, SensorLevel, StateDelta, StateDocument};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::pipeline::{PipelineError, RecordingPipeline};
use crate::sensor::MotionSensor;
use crate::store::{StateStore, StoreError};

/// Controller errors. All of them stop the control loop.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Pipeline error.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// A shadow document or delta could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Controller timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Period between sensor samples.
    pub tick_period: Duration,
    /// Pause after each shadow write.
    pub settle_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            settle_delay: Duration::from_secs(1),
        }
    }
}

impl ControllerConfig {
    /// Config with no settle pause, for tests and simulations.
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// One unit of work for the run loop.
enum Step {
    Tick,
    Delta(Value),
}

/// The control actor.
pub struct Controller<S, P, M> {
    config: ControllerConfig,
    reconciler: Reconciler,
    store: S,
    pipeline: P,
    sensor: M,
    deltas: mpsc::UnboundedReceiver<Value>,
}

impl<S, P, M> Controller<S, P, M>
where
    S: StateStore,
    P: RecordingPipeline,
    M: MotionSensor,
{
    /// Create a controller and subscribe it to the store's deltas.
    ///
    /// Deltas that arrive before [`run`](Self::run) starts are queued.
    pub fn new(config: ControllerConfig, store: S, pipeline: P, sensor: M) -> Self {
        let (tx, deltas) = mpsc::unbounded_channel();
        store.on_delta(Box::new(move |delta| {
            if tx.send(delta).is_err() {
                tracing::debug!("Delta dropped, controller has stopped");
            }
        }));

        Self {
            config,
            reconciler: Reconciler::new(),
            store,
            pipeline,
            sensor,
            deltas,
        }
    }

    /// Get the reconciler.
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Get the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the pipeline.
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Announce the paused startup state to the shadow.
    pub async fn boot(&mut self) -> Result<(), ControllerError> {
        tracing::info!("Announcing idle startup state");
        for action in self.reconciler.boot() {
            self.execute(action).await?;
        }
        Ok(())
    }

    /// Sample the sensor once and run the poll path.
    ///
    /// A sensor fault counts as "no change" for this tick.
    pub async fn tick(&mut self) -> Result<(), ControllerError> {
        let level = match self.sensor.read().await {
            Ok(level) => level,
            Err(e) => {
                let previous = self.previous_level();
                tracing::warn!("Sensor read failed, assuming {:?}: {}", previous, e);
                previous
            }
        };
        self.handle(Event::SensorTick { level }).await
    }

    /// Apply a raw delta payload from the store.
    pub async fn handle_delta(&mut self, delta: Value) -> Result<(), ControllerError> {
        let delta = StateDelta::from_value(&delta)?;
        tracing::debug!("Delta received: {:?}", delta);
        self.handle(Event::DeltaReceived { delta }).await
    }

    /// Boot, then serve ticks and deltas until `shutdown` resolves or an
    /// error occurs.
    ///
    /// Shutdown also interrupts work in progress (a store call, a settle
    /// pause, a pipeline hook), so cancellation never waits on the network.
    pub async fn run<F>(mut self, shutdown: F) -> Result<(), ControllerError>
    where
        F: Future,
    {
        tokio::pin!(shutdown);

        tokio::select! {
            biased;

            _ = &mut shutdown => {
                tracing::info!("Controller shutting down during boot");
                return Ok(());
            }
            result = self.boot() => result?,
        }

        let mut ticker = tokio::time::interval(self.config.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Controller running, tick every {:?}", self.config.tick_period);
        loop {
            let step = tokio::select! {
                biased;

                _ = &mut shutdown => None,
                Some(delta) = self.deltas.recv() => Some(Step::Delta(delta)),
                _ = ticker.tick() => Some(Step::Tick),
            };
            let Some(step) = step else {
                tracing::info!("Controller shutting down");
                return Ok(());
            };

            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::info!("Controller shutting down, abandoning current step");
                    return Ok(());
                }
                result = self.step(step) => result?,
            }
        }
    }

    async fn step(&mut self, step: Step) -> Result<(), ControllerError> {
        match step {
            Step::Tick => self.tick().await,
            Step::Delta(delta) => self.handle_delta(delta).await,
        }
    }

    fn previous_level(&self) -> SensorLevel {
        self.reconciler.control_state().edge.previous()
    }

    /// Feed an event to the reconciler and execute what it asks for, feeding
    /// fetched documents back in before the remaining actions.
    async fn handle(&mut self, event: Event) -> Result<(), ControllerError> {
        let mut pending: VecDeque<Action> = self.reconciler.on_event(event).into();

        while let Some(action) = pending.pop_front() {
            if let Some(follow_up) = self.execute(action).await? {
                for action in self.reconciler.on_event(follow_up).into_iter().rev() {
                    pending.push_front(action);
                }
            }
        }
        Ok(())
    }

    async fn execute(&mut self, action: Action) -> Result<Option<Event>, ControllerError> {
        match action {
            Action::FetchDesired => {
                let raw = self.store.get_desired().await?;
                let desired = StateDocument::from_desired(&raw)?;
                tracing::debug!("Desired state: {:?}", desired);
                return Ok(Some(Event::DesiredFetched { desired }));
            }
            Action::Report(doc) => {
                tracing::debug!("Reporting {:?}", doc);
                self.store.report(&doc).await?;
            }
            Action::Desire(doc) => {
                tracing::debug!("Desiring {:?}", doc);
                self.store.desire(&doc).await?;
            }
            Action::Settle => {
                if !self.config.settle_delay.is_zero() {
                    tokio::time::sleep(self.config.settle_delay).await;
                }
            }
            Action::StartPipeline => {
                tracing::info!("Starting recording");
                self.pipeline.start().await?;
            }
            Action::PausePipeline => {
                tracing::info!("Pausing recording");
                self.pipeline.pause().await?;
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::MockPipeline;
    use crate::sensor::ScriptedSensor;
    use crate::store::{MockStore, StoreCall};
    use motion_kvs_core::POLL_CADENCE;
    use motion_kvs_types::RecordingState;
    use serde_json::json;
    use SensorLevel::{Active, Inactive};

    type TestController = Controller<MockStore, MockPipeline, ScriptedSensor>;

    fn controller(store: &MockStore, sensor: ScriptedSensor) -> (TestController, MockPipeline) {
        let pipeline = MockPipeline::new();
        let controller = Controller::new(
            ControllerConfig::immediate(),
            store.clone(),
            pipeline.clone(),
            sensor,
        );
        (controller, pipeline)
    }

    /// Tick until the store has seen `polls` fetches.
    async fn tick_until_polls(c: &mut TestController, store: &MockStore, polls: usize) {
        for _ in 0..(polls * (POLL_CADENCE as usize + 1)) {
            if store.polls() >= polls {
                return;
            }
            c.tick().await.unwrap();
        }
        assert_eq!(store.polls(), polls);
    }

    // ===========================================
    // Boot
    // ===========================================

    #[tokio::test]
    async fn boot_announces_idle() {
        let store = MockStore::new();
        let (mut c, pipeline) = controller(&store, ScriptedSensor::idle());

        c.boot().await.unwrap();

        assert_eq!(
            store.calls(),
            vec![
                StoreCall::Desire(StateDocument::idle()),
                StoreCall::Report(StateDocument::idle()),
            ]
        );
        assert!(pipeline.transitions().is_empty());
    }

    #[tokio::test]
    async fn new_registers_delta_handler() {
        let store = MockStore::new();
        let (_c, _pipeline) = controller(&store, ScriptedSensor::idle());
        assert_eq!(store.handler_count(), 1);
    }

    // ===========================================
    // Poll path
    // ===========================================

    #[tokio::test]
    async fn first_tick_polls_and_starts_on_desired_camera() {
        let store = MockStore::with_desired(StateDocument::recording());
        let (mut c, pipeline) = controller(&store, ScriptedSensor::idle());

        c.tick().await.unwrap();

        assert_eq!(store.polls(), 1);
        assert_eq!(pipeline.transitions(), vec![RecordingState::Recording]);
        assert_eq!(c.reconciler().recording_state(), RecordingState::Recording);
    }

    #[tokio::test]
    async fn positive_camera_count_starts_recording() {
        let store = MockStore::new();
        store.set_desired(json!({"Camera": 2}));
        let (mut c, pipeline) = controller(&store, ScriptedSensor::idle());

        c.tick().await.unwrap();

        assert_eq!(pipeline.transitions(), vec![RecordingState::Recording]);
    }

    #[tokio::test]
    async fn quiet_ticks_between_polls_touch_nothing() {
        let store = MockStore::with_desired(StateDocument::idle());
        let (mut c, pipeline) = controller(&store, ScriptedSensor::idle());

        c.tick().await.unwrap();
        for _ in 0..10 {
            c.tick().await.unwrap();
        }

        assert_eq!(store.polls(), 1);
        assert_eq!(pipeline.commands(), 0);
    }

    #[tokio::test]
    async fn motion_edge_reports_and_starts() {
        let store = MockStore::with_desired(StateDocument::idle());
        let sensor = ScriptedSensor::new([Inactive, Inactive, Active]);
        let (mut c, pipeline) = controller(&store, sensor);

        c.tick().await.unwrap(); // initial poll
        c.tick().await.unwrap();
        c.tick().await.unwrap(); // edge forces a poll on this tick

        assert_eq!(store.polls(), 2);
        assert_eq!(store.reports(), vec![StateDocument::motion_detected()]);
        assert_eq!(pipeline.transitions(), vec![RecordingState::Recording]);
    }

    #[tokio::test]
    async fn watchdog_stops_recording_end_to_end() {
        let store = MockStore::with_desired(StateDocument::recording());
        let (mut c, pipeline) = controller(&store, ScriptedSensor::idle());

        tick_until_polls(&mut c, &store, 4).await;

        assert_eq!(
            pipeline.transitions(),
            vec![RecordingState::Recording, RecordingState::Idle]
        );
        assert_eq!(store.desired(), StateDocument::idle().to_value());
        assert_eq!(
            store.reported(),
            Some(StateDocument::watchdog_reset(Inactive))
        );
    }

    #[tokio::test]
    async fn sensor_fault_is_no_change() {
        let store = MockStore::with_desired(StateDocument::idle());
        let sensor = ScriptedSensor::new([Inactive, Inactive]);
        let (mut c, pipeline) = controller(&store, sensor.clone());

        c.tick().await.unwrap();
        sensor.fail_next("line fault");
        c.tick().await.unwrap();

        assert_eq!(store.polls(), 1);
        assert!(store.reports().is_empty());
        assert!(pipeline.transitions().is_empty());
    }

    #[tokio::test]
    async fn malformed_desired_is_fatal() {
        let store = MockStore::new();
        store.set_desired(json!({"Camera": "on"}));
        let (mut c, _pipeline) = controller(&store, ScriptedSensor::idle());

        let result = c.tick().await;

        assert!(matches!(result, Err(ControllerError::Decode(_))));
    }

    #[tokio::test]
    async fn store_failure_is_fatal() {
        let store = MockStore::new();
        store.fail_next_get("connection reset");
        let (mut c, _pipeline) = controller(&store, ScriptedSensor::idle());

        let result = c.tick().await;

        assert!(matches!(result, Err(ControllerError::Store(_))));
    }

    #[tokio::test]
    async fn pipeline_failure_is_fatal() {
        let store = MockStore::with_desired(StateDocument::recording());
        let (mut c, pipeline) = controller(&store, ScriptedSensor::idle());
        pipeline.fail_next("device busy");

        let result = c.tick().await;

        assert!(matches!(result, Err(ControllerError::Pipeline(_))));
    }

    // ===========================================
    // Delta path
    // ===========================================

    #[tokio::test]
    async fn delta_starts_and_confirms() {
        let store = MockStore::new();
        let (mut c, pipeline) = controller(&store, ScriptedSensor::idle());

        c.handle_delta(json!({"Camera": 1})).await.unwrap();

        assert_eq!(pipeline.transitions(), vec![RecordingState::Recording]);
        assert_eq!(
            store.reports(),
            vec![StateDocument::confirmed(RecordingState::Recording)]
        );
    }

    #[tokio::test]
    async fn delta_without_camera_is_ignored() {
        let store = MockStore::new();
        let (mut c, pipeline) = controller(&store, ScriptedSensor::idle());

        c.handle_delta(json!({"Motion": 1})).await.unwrap();

        assert!(store.calls().is_empty());
        assert_eq!(pipeline.commands(), 0);
    }

    #[tokio::test]
    async fn rest_store_delta_reaches_controller() {
        let store = crate::store::fixture_store();
        let mut c = Controller::new(
            ControllerConfig::immediate(),
            store.clone(),
            MockPipeline::new(),
            ScriptedSensor::idle(),
        );

        store
            .absorb(json!({
                "state": {
                    "desired": {"Camera": 1, "Motion": 0},
                    "reported": {"Camera": 0, "Motion": 0},
                    "delta": {"Camera": 1}
                }
            }))
            .unwrap();

        let queued = c.deltas.try_recv().unwrap();
        let delta = StateDelta::from_value(&queued).unwrap();
        assert_eq!(delta.target(), Some(RecordingState::Recording));
        assert!(c.deltas.try_recv().is_err());
    }

    #[tokio::test]
    async fn malformed_delta_is_fatal() {
        let store = MockStore::new();
        let (mut c, _pipeline) = controller(&store, ScriptedSensor::idle());

        let result = c.handle_delta(json!([1])).await;

        assert!(matches!(result, Err(ControllerError::Decode(_))));
    }

    // ===========================================
    // Run loop
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn run_serves_deltas_until_shutdown() {
        let store = MockStore::new();
        let (c, pipeline) = controller(&store, ScriptedSensor::idle());
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(c.run(async move {
            let _ = stop_rx.await;
        }));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        store.push_delta(json!({"Camera": 1}));
        tokio::time::sleep(Duration::from_millis(100)).await;

        stop_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();

        assert_eq!(pipeline.transitions(), vec![RecordingState::Recording]);
        assert_eq!(
            store.reported(),
            Some(StateDocument::confirmed(RecordingState::Recording))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_on_fatal_error() {
        let store = MockStore::new();
        let (c, _pipeline) = controller(&store, ScriptedSensor::idle());
        store.fail_next_get("connection reset");

        let result = c.run(std::future::pending::<()>()).await;

        assert!(matches!(result, Err(ControllerError::Store(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_settle_pause() {
        let store = MockStore::new();
        let config = ControllerConfig {
            tick_period: Duration::from_secs(1),
            settle_delay: Duration::from_secs(3600),
        };
        let c = Controller::new(
            config,
            store.clone(),
            MockPipeline::new(),
            ScriptedSensor::idle(),
        );
        let started = tokio::time::Instant::now();

        c.run(tokio::time::sleep(Duration::from_secs(5)))
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(60));
        assert_eq!(store.desires(), vec![StateDocument::idle()]);
        assert!(store.reports().is_empty());
    }

    #[tokio::test]
    async fn resolved_shutdown_skips_boot() {
        let store = MockStore::new();
        let (c, _pipeline) = controller(&store, ScriptedSensor::idle());

        c.run(async {}).await.unwrap();

        assert!(store.calls().is_empty());
    }
}
