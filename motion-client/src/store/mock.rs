//! Mock store for testing.
//!
//! Holds the desired/reported pair in memory, records every call and lets
//! tests push deltas the way another writer would.

use super::{DeltaHandler, StateStore, StoreError};
use async_trait::async_trait;
use motion_kvs_types::StateDocument;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

/// A call made against the mock store, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCall {
    /// `get_desired()`.
    GetDesired,
    /// `report(doc)`.
    Report(StateDocument),
    /// `desire(doc)`.
    Desire(StateDocument),
}

/// Mock store for testing.
///
/// Clones share state, so a test can keep a handle while the controller
/// owns another.
#[derive(Default)]
pub struct MockStore {
    inner: Arc<Mutex<MockStoreInner>>,
}

#[derive(Default)]
struct MockStoreInner {
    desired: Value,
    reported: Option<StateDocument>,
    calls: Vec<StoreCall>,
    handlers: Vec<Arc<dyn Fn(Value) + Send + Sync>>,
    fail_next_get: Option<String>,
    fail_next_report: Option<String>,
    fail_next_desire: Option<String>,
}

impl MockStore {
    /// Create a new mock store with no desired section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store whose desired section is `doc`.
    pub fn with_desired(doc: StateDocument) -> Self {
        let store = Self::new();
        store.set_desired(doc.to_value());
        store
    }

    /// Replace the desired section without notifying handlers.
    pub fn set_desired(&self, desired: Value) {
        let mut inner = self.inner.lock().unwrap();
        inner.desired = desired;
    }

    /// Current desired section.
    pub fn desired(&self) -> Value {
        let inner = self.inner.lock().unwrap();
        inner.desired.clone()
    }

    /// Last reported document.
    pub fn reported(&self) -> Option<StateDocument> {
        let inner = self.inner.lock().unwrap();
        inner.reported
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<StoreCall> {
        let inner = self.inner.lock().unwrap();
        inner.calls.clone()
    }

    /// Documents passed to `report()`, in order.
    pub fn reports(&self) -> Vec<StateDocument> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Report(doc) => Some(doc),
                _ => None,
            })
            .collect()
    }

    /// Documents passed to `desire()`, in order.
    pub fn desires(&self) -> Vec<StateDocument> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Desire(doc) => Some(doc),
                _ => None,
            })
            .collect()
    }

    /// Number of `get_desired()` calls so far.
    pub fn polls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StoreCall::GetDesired))
            .count()
    }

    /// Merge `delta` into the desired section and notify every handler.
    ///
    /// Handlers run on the caller's thread, outside the store lock.
    pub fn push_delta(&self, delta: Value) {
        let handlers = {
            let mut inner = self.inner.lock().unwrap();
            if let Value::Object(changes) = &delta {
                if !inner.desired.is_object() {
                    inner.desired = Value::Object(Map::new());
                }
                if let Value::Object(desired) = &mut inner.desired {
                    for (key, value) in changes {
                        desired.insert(key.clone(), value.clone());
                    }
                }
            }
            inner.handlers.clone()
        };

        for handler in handlers {
            handler(delta.clone());
        }
    }

    /// Number of registered delta handlers.
    pub fn handler_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.handlers.len()
    }

    /// Cause the next get_desired() to fail with the given error.
    pub fn fail_next_get(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_get = Some(error.to_string());
    }

    /// Cause the next report() to fail with the given error.
    pub fn fail_next_report(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_report = Some(error.to_string());
    }

    /// Cause the next desire() to fail with the given error.
    pub fn fail_next_desire(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_desire = Some(error.to_string());
    }
}

impl Clone for MockStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("MockStore")
            .field("desired", &inner.desired)
            .field("reported", &inner.reported)
            .field("calls", &inner.calls.len())
            .field("handlers", &inner.handlers.len())
            .finish()
    }
}

#[async_trait]
impl StateStore for MockStore {
    async fn get_desired(&self) -> Result<Value, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        // Check for forced failure
        if let Some(error) = inner.fail_next_get.take() {
            return Err(StoreError::RequestFailed(error));
        }

        inner.calls.push(StoreCall::GetDesired);
        Ok(inner.desired.clone())
    }

    async fn report(&self, doc: &StateDocument) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(error) = inner.fail_next_report.take() {
            return Err(StoreError::RequestFailed(error));
        }

        inner.calls.push(StoreCall::Report(*doc));
        inner.reported = Some(*doc);
        Ok(())
    }

    async fn desire(&self, doc: &StateDocument) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(error) = inner.fail_next_desire.take() {
            return Err(StoreError::RequestFailed(error));
        }

        inner.calls.push(StoreCall::Desire(*doc));
        inner.desired = doc.to_value();
        Ok(())
    }

    fn on_delta(&self, handler: DeltaHandler) {
        let mut inner = self.inner.lock().unwrap();
        inner.handlers.push(Arc::from(handler));
    }
}
