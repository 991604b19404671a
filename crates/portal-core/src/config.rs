// ── Runtime portal configuration ──
//
// Where each endpoint lives and how requests are tuned. Built by the CLI
// (or a test) and handed to `Portal`; core never reads config files.

use std::path::PathBuf;
use std::time::Duration;

use portal_api::TransportConfig;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use url::Url;

use crate::error::CoreError;

/// Logical endpoints the portal talks to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, AsRefStr, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Endpoint {
    Environment,
    Content,
    Event,
    Login,
    Upload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoints {
    environment: Url,
    content: Url,
    event: Url,
    login: Url,
    upload: Url,
}

/// Endpoint map plus request tuning.
///
/// Each instance owns its endpoints: overriding one on a clone or on a
/// separately built configuration never leaks into another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    endpoints: Endpoints,
    /// Request timeout applied by the shared HTTP client.
    pub timeout: Duration,
    /// Interval between update checks.
    pub poll_interval: Duration,
    /// Extra PEM root certificate.
    pub ca_cert: Option<PathBuf>,
}

impl Configuration {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10 * 60);

    /// Derive every endpoint as `<base_url>/<name>`.
    pub fn new(base_url: &Url) -> Result<Self, CoreError> {
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let join = |endpoint: Endpoint| {
            base.join(endpoint.as_ref()).map_err(|e| CoreError::Config {
                message: format!("cannot derive {endpoint} endpoint from {base_url}: {e}"),
            })
        };

        Ok(Self {
            endpoints: Endpoints {
                environment: join(Endpoint::Environment)?,
                content: join(Endpoint::Content)?,
                event: join(Endpoint::Event)?,
                login: join(Endpoint::Login)?,
                upload: join(Endpoint::Upload)?,
            },
            timeout: Self::DEFAULT_TIMEOUT,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            ca_cert: None,
        })
    }

    pub fn endpoint(&self, endpoint: Endpoint) -> &Url {
        match endpoint {
            Endpoint::Environment => &self.endpoints.environment,
            Endpoint::Content => &self.endpoints.content,
            Endpoint::Event => &self.endpoints.event,
            Endpoint::Login => &self.endpoints.login,
            Endpoint::Upload => &self.endpoints.upload,
        }
    }

    /// All endpoints in declaration order.
    pub fn endpoints(&self) -> impl Iterator<Item = (Endpoint, &Url)> {
        Endpoint::iter().map(|e| (e, self.endpoint(e)))
    }

    pub fn set_endpoint(&mut self, endpoint: Endpoint, url: Url) {
        let slot = match endpoint {
            Endpoint::Environment => &mut self.endpoints.environment,
            Endpoint::Content => &mut self.endpoints.content,
            Endpoint::Event => &mut self.endpoints.event,
            Endpoint::Login => &mut self.endpoints.login,
            Endpoint::Upload => &mut self.endpoints.upload,
        };
        *slot = url;
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint, url: Url) -> Self {
        self.set_endpoint(endpoint, url);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
            ca_cert: self.ca_cert.clone(),
        }
    }
}
