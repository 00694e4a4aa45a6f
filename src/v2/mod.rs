//! Client for the Docker Registry API v2.
//!
//! A [`Client`] is bound to one registry and one repository scope. It pings
//! the registry lazily on first use, then authenticates every request
//! according to the challenge seen during the ping.
//!
//! ```rust,no_run
//! # use std::str::FromStr;
//! # async fn run() -> dkregistry_auth::errors::Result<()> {
//! use dkregistry_auth::reference::Reference;
//! use dkregistry_auth::v2::Client;
//!
//! let image = Reference::from_str("docker.io/library/busybox:latest")?;
//! let client = Client::configure().build(&image, false)?;
//! let manifest = client.get_manifest(&image.version(), None).await?;
//! println!("{:?}", manifest.media_type);
//! # Ok(())
//! # }
//! ```

use crate::credentials::Credentials;
use crate::errors::{Error, Result};
use crate::mediatypes::{API_VERSION_HEADER, API_VERSION_VALUE};
use reqwest::header::{HeaderMap, USER_AGENT};
use reqwest::{Method, Response, StatusCode};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use url::Url;

mod config;
pub use self::config::Config;

pub mod transport;
pub use self::transport::{CertificateVerification, TransportBuilder};

pub mod challenge;
pub use self::challenge::Challenge;

mod token;
pub use self::token::{BearerToken, MINIMUM_TOKEN_LIFETIME_SECONDS};

mod auth;
pub use self::auth::AuthScheme;

mod ping;

mod manifest;
pub use self::manifest::ManifestResponse;

mod blobs;

mod tags;

/// URL scheme used to reach a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Scheme {
    Https,
    Http,
}

/// Repository and actions a bearer token is requested for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthScope {
    remote_name: String,
    actions: String,
}

impl AuthScope {
    /// `actions` is a comma-separated list without spaces, e.g. `pull,push`.
    pub fn new(remote_name: &str, actions: &str) -> Self {
        Self {
            remote_name: remote_name.to_string(),
            actions: actions.replace(' ', ""),
        }
    }

    pub fn remote_name(&self) -> &str {
        &self.remote_name
    }

    pub fn actions(&self) -> &str {
        &self.actions
    }
}

impl fmt::Display for AuthScope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "repository:{}:{}", self.remote_name, self.actions)
    }
}

/// Outcome of the protocol detection.
#[derive(Clone, Debug)]
enum Detection {
    Pending,
    Detected {
        scheme: Scheme,
        challenges: Vec<Challenge>,
    },
}

impl Default for Detection {
    fn default() -> Self {
        Detection::Pending
    }
}

/// Per-client state filled in lazily by probing and token exchange.
#[derive(Debug, Default)]
struct AuthState {
    detection: Detection,
    token: Option<BearerToken>,
}

/// A Client to make outgoing API requests to a registry.
#[derive(Debug)]
pub struct Client {
    registry: String,
    credentials: Credentials,
    client: reqwest::Client,
    token_client: reqwest::Client,
    user_agent: Option<String>,
    insecure_registry: bool,
    disable_v1_ping: bool,
    signature_base: Option<Url>,
    scope: AuthScope,
    state: Mutex<AuthState>,
}

impl Client {
    pub fn configure() -> Config {
        Config::default()
    }

    /// Registry API host, e.g. `registry-1.docker.io`.
    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn scope(&self) -> &AuthScope {
        &self.scope
    }

    /// Resolved signature storage location for this client's reference, if any.
    pub fn signature_base(&self) -> Option<&Url> {
        self.signature_base.as_ref()
    }

    /// Scheme detected by a successful ping.
    pub fn scheme(&self) -> Option<Scheme> {
        match self.state().detection {
            Detection::Detected { scheme, .. } => Some(scheme),
            Detection::Pending => None,
        }
    }

    /// Challenges returned by the ping, in header order.
    pub fn challenges(&self) -> Vec<Challenge> {
        match &self.state().detection {
            Detection::Detected { challenges, .. } => challenges.clone(),
            Detection::Pending => vec![],
        }
    }

    /// Currently cached bearer token.
    pub fn token(&self) -> Option<BearerToken> {
        self.state().token.clone()
    }

    fn state(&self) -> MutexGuard<'_, AuthState> {
        // State is replaced wholesale, so a poisoned lock still holds consistent data.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Issue an authenticated request for `path`, relative to the `/v2/` API root.
    ///
    /// The registry is pinged first if that has not happened yet.
    pub async fn make_request(
        &self,
        method: Method,
        path: &str,
        headers: Option<HeaderMap>,
        body: Option<reqwest::Body>,
    ) -> Result<Response> {
        let scheme = self.detect_scheme().await?;
        let url = Url::parse(&format!("{}://{}/v2/{}", scheme, self.registry, path))?;
        self.make_request_to_resolved_url(method, url, headers.unwrap_or_default(), body, true)
            .await
    }

    /// Issue a request to an absolute `url`, adding protocol headers and,
    /// if `send_auth` is set, credentials.
    ///
    /// `make_request` should generally be preferred.
    pub async fn make_request_to_resolved_url(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Option<reqwest::Body>,
        send_auth: bool,
    ) -> Result<Response> {
        let mut req = self
            .client
            .request(method.clone(), url.clone())
            .header(API_VERSION_HEADER, API_VERSION_VALUE)
            .headers(headers);
        if let Some(ua) = &self.user_agent {
            req = req.header(USER_AGENT, ua.as_str());
        }
        if let Some(b) = body {
            req = req.body(b);
        }
        if send_auth {
            req = self.setup_request_auth(req).await?;
        }
        debug!("{} {}", method, url);
        Ok(req.send().await?)
    }
}

/// Map a non-success status to an error.
pub(crate) fn check_status(status: StatusCode) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else if status.is_client_error() {
        Err(Error::Client { status })
    } else if status.is_server_error() {
        Err(Error::Server { status })
    } else {
        error!("Received unexpected HTTP status '{}'", status);
        Err(Error::UnexpectedHttpStatus(status))
    }
}
