//! Device shadow access over the REST endpoint.
//!
//! Talks to `https://{host}:{port}/things/{thing}/shadow` with mutual TLS,
//! using the device's root CA, certificate and private key files.
//!
//! The REST endpoint has no push channel. Deltas are taken from the
//! `state.delta` section of each fetched shadow instead: every new delta is
//! handed to the registered handlers once, the way the shadow's delta topic
//! would publish it.

use super::{DeltaHandler, StateStore, StoreError};
use async_trait::async_trait;
use motion_kvs_types::StateDocument;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Per-request timeout for shadow calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the shadow lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowEndpoint {
    /// Data endpoint host name.
    pub host: String,
    /// HTTPS port (8443 for mutual-TLS device access).
    pub port: u16,
    /// Thing whose classic shadow is used.
    pub thing_name: String,
}

impl ShadowEndpoint {
    /// URL of the thing's shadow document.
    pub fn url(&self) -> String {
        format!(
            "https://{}:{}/things/{}/shadow",
            self.host, self.port, self.thing_name
        )
    }
}

/// Paths of the three device credential files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowCredentials {
    /// Root CA certificate (PEM).
    pub root_cert: PathBuf,
    /// Device certificate (PEM).
    pub certificate: PathBuf,
    /// Device private key (PEM).
    pub private_key: PathBuf,
}

impl ShadowCredentials {
    /// All three paths, in the order they are loaded.
    pub fn paths(&self) -> [&Path; 3] {
        [&self.root_cert, &self.certificate, &self.private_key]
    }
}

/// Shadow store backed by the REST endpoint.
///
/// Clones share the delta handlers.
#[derive(Clone)]
pub struct HttpShadowStore {
    client: reqwest::Client,
    url: String,
    deltas: Arc<Mutex<DeltaFeed>>,
}

/// Registered handlers and the delta they were last given.
#[derive(Default)]
struct DeltaFeed {
    handlers: Vec<Arc<dyn Fn(Value) + Send + Sync>>,
    last: Option<Value>,
}

impl std::fmt::Debug for HttpShadowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpShadowStore")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl HttpShadowStore {
    /// Build a client that authenticates with the device credentials.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Credentials`] if a file cannot be read or is not
    /// valid PEM.
    pub fn new(endpoint: &ShadowEndpoint, credentials: &ShadowCredentials) -> Result<Self, StoreError> {
        let root_cert = read_pem(&credentials.root_cert)?;
        let mut identity = read_pem(&credentials.certificate)?;
        identity.push(b'\n');
        identity.extend(read_pem(&credentials.private_key)?);

        let root_cert = reqwest::Certificate::from_pem(&root_cert)
            .map_err(|e| StoreError::Credentials(format!("root certificate: {}", e)))?;
        let identity = reqwest::Identity::from_pem(&identity)
            .map_err(|e| StoreError::Credentials(format!("device identity: {}", e)))?;

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .add_root_certificate(root_cert)
            .identity(identity)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Credentials(e.to_string()))?;

        Ok(Self {
            client,
            url: endpoint.url(),
            deltas: Arc::default(),
        })
    }

    /// Take the desired section out of a fetched shadow and pass a new
    /// `state.delta` on to the handlers.
    pub(crate) fn absorb(&self, shadow: Value) -> Result<Value, StoreError> {
        let (desired, delta) = split_shadow(shadow)?;
        self.observe_delta(delta);
        Ok(desired)
    }

    fn observe_delta(&self, delta: Value) {
        let handlers = {
            let mut feed = self.deltas.lock().unwrap_or_else(|e| e.into_inner());
            let pending = delta.as_object().is_some_and(|changes| !changes.is_empty());
            if !pending {
                feed.last = None;
                return;
            }
            if feed.last.as_ref() == Some(&delta) {
                return;
            }
            feed.last = Some(delta.clone());
            feed.handlers.clone()
        };

        tracing::debug!("shadow delta: {}", delta);
        for handler in handlers {
            handler(delta.clone());
        }
    }

    async fn update(&self, section: &str, doc: &StateDocument) -> Result<(), StoreError> {
        let mut state = Map::new();
        state.insert(section.to_string(), doc.to_value());
        let body = json!({ "state": state });
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
        check_status(response).await?;
        tracing::debug!("shadow {} updated: {:?}", section, doc);
        Ok(())
    }
}

#[async_trait]
impl StateStore for HttpShadowStore {
    async fn get_desired(&self) -> Result<Value, StoreError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
        let response = check_status(response).await?;
        let shadow: Value = response
            .json()
            .await
            .map_err(|e| StoreError::MalformedResponse(e.to_string()))?;
        self.absorb(shadow)
    }

    async fn report(&self, doc: &StateDocument) -> Result<(), StoreError> {
        self.update("reported", doc).await
    }

    async fn desire(&self, doc: &StateDocument) -> Result<(), StoreError> {
        self.update("desired", doc).await
    }

    fn on_delta(&self, handler: DeltaHandler) {
        let mut feed = self.deltas.lock().unwrap_or_else(|e| e.into_inner());
        feed.handlers.push(Arc::from(handler));
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, StoreError> {
    std::fs::read(path).map_err(|e| StoreError::Credentials(format!("{}: {}", path.display(), e)))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Rejected {
        status: status.as_u16(),
        body,
    })
}

/// Split a full shadow document into its `state.desired` and `state.delta`
/// sections. Missing sections are `null`.
fn split_shadow(shadow: Value) -> Result<(Value, Value), StoreError> {
    match shadow {
        Value::Object(mut root) => match root.remove("state") {
            Some(Value::Object(mut state)) => Ok((
                state.remove("desired").unwrap_or(Value::Null),
                state.remove("delta").unwrap_or(Value::Null),
            )),
            None | Some(Value::Null) => Ok((Value::Null, Value::Null)),
            Some(other) => Err(StoreError::MalformedResponse(format!(
                "state is not an object: {}",
                other
            ))),
        },
        other => Err(StoreError::MalformedResponse(format!(
            "shadow is not an object: {}",
            other
        ))),
    }
}

/// Store built from the throwaway credentials in `src/store/testdata`.
#[cfg(test)]
pub(crate) fn fixture_store() -> HttpShadowStore {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/store/testdata");
    let endpoint = ShadowEndpoint {
        host: "localhost".into(),
        port: 8443,
        thing_name: "test".into(),
    };
    let credentials = ShadowCredentials {
        root_cert: dir.join("root-CA.crt"),
        certificate: dir.join("device.pem.crt"),
        private_key: dir.join("device.pem.key"),
    };
    HttpShadowStore::new(&endpoint, &credentials).unwrap()
}
