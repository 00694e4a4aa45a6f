use crate::credentials::{self, Credentials};
use crate::errors::Result;
use crate::lookaside::{self, SYSTEM_REGISTRIES_DIR};
use crate::reference::Reference;
use crate::v2::*;
use crate::{DOCKER_HOSTNAME, DOCKER_REGISTRY};
use std::path::PathBuf;

/// Configuration for a `Client`.
#[derive(Debug, Default)]
pub struct Config {
    username: Option<String>,
    password: Option<String>,
    cert_dir: Option<PathBuf>,
    insecure_registry: bool,
    user_agent: Option<String>,
    disable_v1_ping: bool,
    home_dir: Option<PathBuf>,
    registries_dir: Option<PathBuf>,
}

impl Config {
    /// Set the username to be used for registry authentication.
    ///
    /// Setting a username or password bypasses the Docker configuration files.
    pub fn username(mut self, user: Option<String>) -> Self {
        self.username = user;
        self
    }

    /// Set the password to be used for registry authentication.
    pub fn password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    /// Directory with `*.crt` CA certificates and `*.cert`/`*.key` client pairs.
    pub fn cert_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.cert_dir = dir;
        self
    }

    /// Skip TLS verification, and allow falling back to plain HTTP when probing.
    pub fn insecure_registry(mut self, insecure: bool) -> Self {
        self.insecure_registry = insecure;
        self
    }

    /// Set the user-agent sent with every registry request.
    pub fn user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Do not try `/v1/_ping` when `/v2/` is unreachable.
    pub fn disable_v1_ping(mut self, disable: bool) -> Self {
        self.disable_v1_ping = disable;
        self
    }

    /// Home directory holding `.docker/config.json` (defaults to the user's).
    pub fn home_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.home_dir = dir;
        self
    }

    /// Directory with signature storage configuration (defaults to `/etc/containers/registries.d`).
    pub fn registries_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.registries_dir = dir;
        self
    }

    /// Return a `Client` for the registry and repository of `reference`.
    ///
    /// `write` requests push access and selects staging signature storage.
    pub fn build(self, reference: &Reference, write: bool) -> Result<Client> {
        let registry = match reference.domain() {
            d if d == DOCKER_HOSTNAME => DOCKER_REGISTRY.to_string(),
            d => d.to_string(),
        };

        let creds_override = match (self.username, self.password) {
            (None, None) => None,
            (u, p) => Some(Credentials::new(u.unwrap_or_default(), p.unwrap_or_default())),
        };
        let home = self.home_dir.or_else(dirs::home_dir);
        let credentials =
            credentials::resolve(creds_override.as_ref(), home.as_deref(), reference.domain())?;

        let verification = if self.insecure_registry {
            CertificateVerification::Disabled
        } else {
            CertificateVerification::Enabled
        };
        let client = TransportBuilder::new()
            .cert_dir(self.cert_dir)
            .verification(verification)
            .build()?;
        let token_client = TransportBuilder::token_service().build()?;

        let registries_dir = self
            .registries_dir
            .unwrap_or_else(|| PathBuf::from(SYSTEM_REGISTRIES_DIR));
        let signature_base = lookaside::storage_base(&registries_dir, reference, write)?;

        let actions = if write { "pull,push" } else { "pull" };
        trace!(
            "Built client for {:?}: user {:?}, scope {}",
            registry,
            credentials.username,
            actions
        );
        Ok(Client {
            registry,
            credentials,
            client,
            token_client,
            user_agent: self.user_agent,
            insecure_registry: self.insecure_registry,
            disable_v1_ping: self.disable_v1_ping,
            signature_base,
            scope: AuthScope::new(reference.path(), actions),
            state: Mutex::new(AuthState::default()),
        })
    }
}
