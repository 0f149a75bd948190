//! Synchronized state store abstraction.
//!
//! The store holds the desired/reported document pair. This module keeps the
//! transport behind a trait so the controller never sees connection, TLS or
//! retry details.
//!
//! # Design
//!
//! - `get_desired()` fetches the full desired section on demand
//! - `report()` / `desire()` replace the reported or desired document
//! - `on_delta()` registers a handler for pushed changes to the desired document
//!
//! Writes are fire-and-forget: a successful call means the store accepted the
//! document, not that other parties have observed it. Any error is fatal to
//! the control loop; reconnection belongs to the store implementation.

mod http;
mod mock;

pub use http::{HttpShadowStore, ShadowCredentials, ShadowEndpoint};
#[cfg(test)]
pub(crate) use http::fixture_store;
pub use mock::{MockStore, StoreCall};

use async_trait::async_trait;
use motion_kvs_types::StateDocument;
use serde_json::Value;
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request could not be sent or no response arrived.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The store answered with an error status.
    #[error("rejected with status {status}: {body}")]
    Rejected {
        /// HTTP-style status code.
        status: u16,
        /// Response body, for the diagnostic.
        body: String,
    },

    /// The response was not a shadow document.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The device credentials could not be loaded.
    #[error("credential error: {0}")]
    Credentials(String),
}

/// Handler invoked with the raw delta payload whenever the desired document changes.
pub type DeltaHandler = Box<dyn Fn(Value) + Send + Sync>;

/// Access to the remote desired/reported document pair.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Fetch the current desired section (`null` if the shadow has none).
    async fn get_desired(&self) -> Result<Value, StoreError>;

    /// Replace the reported document.
    async fn report(&self, doc: &StateDocument) -> Result<(), StoreError>;

    /// Replace the desired document.
    async fn desire(&self, doc: &StateDocument) -> Result<(), StoreError>;

    /// Register a handler for delta notifications.
    ///
    /// Handlers may be invoked from any task, at any time, including
    /// concurrently with the other methods.
    fn on_delta(&self, handler: DeltaHandler);
}
