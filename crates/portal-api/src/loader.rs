// Generic remote data loader
//
// Fetches one JSON document from a configured endpoint, validates it, and
// keeps the last valid result as an atomically swapped snapshot. Each
// payload type (environment, content, event, user) instantiates the same
// loader and adds typed accessors in its own module.

use std::sync::{Arc, RwLock};

use arc_swap::ArcSwapOption;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, FailureKind, NotLoaded};
use crate::validate::{FieldKind, Shape, check_field};

/// A server payload with a declared shape.
///
/// Every portal response carries a top-level `success: boolean`, which is
/// checked before the shape; implementors only declare the remaining fields.
pub trait Payload: DeserializeOwned + Send + Sync + 'static {
    /// Name used in diagnostics and [`NotLoaded`] errors.
    const TYPE_NAME: &'static str;

    fn shape() -> Shape;
}

/// A payload that carries a marker identifying the data revision.
pub trait Versioned {
    fn version(&self) -> &str;
}

/// Lifecycle of a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    Failed(FailureKind),
}

/// Fetches, validates and caches one server-provided payload.
///
/// Loads on one instance are serialized: a second `load()` waits for the
/// first to finish. A failed load leaves the previous snapshot in place.
pub struct RemoteDataLoader<T: Payload> {
    http: reqwest::Client,
    endpoint: Url,
    snapshot: ArcSwapOption<T>,
    state: RwLock<LoadState>,
    in_flight: Mutex<()>,
}

impl<T: Payload> RemoteDataLoader<T> {
    pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
        Self {
            http,
            endpoint,
            snapshot: ArcSwapOption::empty(),
            state: RwLock::new(LoadState::Unloaded),
            in_flight: Mutex::new(()),
        }
    }

    /// The endpoint this loader reads from.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Load without query parameters.
    pub async fn initialize(&self) -> bool {
        self.load(&[]).await
    }

    /// Load with the given query parameters. Failures are logged and
    /// reported as `false`; use [`last_failure`](Self::last_failure) to
    /// tell them apart.
    pub async fn load(&self, query: &[(&str, &str)]) -> bool {
        self.fetch(query).await.is_ok()
    }

    /// Load and return the new snapshot, or the typed failure.
    pub async fn fetch(&self, query: &[(&str, &str)]) -> Result<Arc<T>, Error> {
        let _guard = self.in_flight.lock().await;
        self.set_state(LoadState::Loading);

        let result = match get_body(&self.http, &self.endpoint, query).await {
            Ok(body) => decode_payload::<T>(&body),
            Err(e) => Err(e),
        };

        match result {
            Ok(payload) => {
                let payload = Arc::new(payload);
                self.snapshot.store(Some(Arc::clone(&payload)));
                self.set_state(LoadState::Loaded);
                debug!(payload = T::TYPE_NAME, "snapshot replaced");
                Ok(payload)
            }
            Err(e) => {
                report_failure(T::TYPE_NAME, &e);
                self.set_state(LoadState::Failed(e.kind()));
                Err(e)
            }
        }
    }

    pub fn state(&self) -> LoadState {
        *self.state.read().expect("load state lock poisoned")
    }

    /// Failure category of the most recent attempt, if it failed.
    pub fn last_failure(&self) -> Option<FailureKind> {
        match self.state() {
            LoadState::Failed(kind) => Some(kind),
            _ => None,
        }
    }

    /// Whether the most recent attempt was refused by the server
    /// (as opposed to a device or server failure).
    pub fn is_user_error(&self) -> bool {
        self.last_failure().is_some_and(FailureKind::is_user_error)
    }

    /// Whether a snapshot is available.
    pub fn is_loaded(&self) -> bool {
        self.snapshot.load().is_some()
    }

    /// The current snapshot.
    pub fn data(&self) -> Result<Arc<T>, NotLoaded> {
        self.snapshot.load_full().ok_or(NotLoaded {
            type_name: T::TYPE_NAME,
        })
    }

    /// Project a value out of the current snapshot.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, NotLoaded> {
        let data = self.data()?;
        Ok(f(&data))
    }

    fn set_state(&self, state: LoadState) {
        *self.state.write().expect("load state lock poisoned") = state;
    }
}

// ── Pipeline helpers (shared with login and upload) ─────────────────

/// Send a GET and return the body of a 2xx response.
async fn get_body(
    http: &reqwest::Client,
    endpoint: &Url,
    query: &[(&str, &str)],
) -> Result<String, Error> {
    debug!("GET {}", endpoint);
    let resp = http.get(endpoint.clone()).query(query).send().await?;
    read_body(resp, endpoint).await
}

/// Return the body of a 2xx response, or an [`Error::HttpStatus`].
///
/// The error carries `endpoint` rather than the request URL so query
/// parameters (auth tokens) never end up in diagnostics. Transport
/// errors get the same treatment in `From<reqwest::Error>`.
pub(crate) async fn read_body(resp: reqwest::Response, endpoint: &Url) -> Result<String, Error> {
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            url: endpoint.to_string(),
        });
    }
    Ok(resp.text().await?)
}

/// JSON → `success` sentinel → shape → typed struct.
pub(crate) fn decode_payload<T: Payload>(body: &str) -> Result<T, Error> {
    let value: Value = serde_json::from_str(body).map_err(|e| Error::NotJson {
        message: e.to_string(),
    })?;

    let success = check_field(Some(&value), T::TYPE_NAME, "success", FieldKind::Boolean)?;
    if success == &Value::Bool(false) {
        let message = value
            .get("error")
            .or_else(|| value.get("message"))
            .and_then(Value::as_str)
            .map(String::from);
        return Err(Error::Rejected { message });
    }

    T::shape().check(&value)?;

    serde_json::from_value(value).map_err(|e| Error::Deserialization {
        message: e.to_string(),
    })
}

/// Emit exactly one diagnostic for a failed request.
pub(crate) fn report_failure(type_name: &str, err: &Error) {
    match err {
        Error::Validation(e) => e.report(),
        other => warn!(payload = type_name, "Unable to load {type_name}: {other}"),
    }
}
