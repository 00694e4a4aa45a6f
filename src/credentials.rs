//! Registry credentials from the per-user Docker configuration.
//!
//! Two on-disk shapes carry the same data: the current `~/.docker/config.json`
//! (entries nested under `auths`) and the legacy flat `~/.dockercfg`. Both are
//! folded into a single `AuthEntries` map right after parsing.

use crate::errors::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

const DOCKER_CFG_DIR: &str = ".docker";
const DOCKER_CFG_FILE: &str = "config.json";
const DOCKER_CFG_LEGACY: &str = ".dockercfg";

/// Key under which Docker Hub credentials are normalized.
const DOCKER_AUTH_HOSTNAME: &str = "index.docker.io";

/// Username and password for a registry; both empty means anonymous.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct DockerAuthConfig {
    #[serde(default)]
    auth: String,
}

#[derive(Debug, Default, Deserialize)]
struct DockerConfigFile {
    #[serde(default)]
    auths: Option<HashMap<String, DockerAuthConfig>>,
}

type AuthEntries = HashMap<String, DockerAuthConfig>;

/// Resolve credentials for `registry`.
///
/// An explicit `override_creds` wins. Otherwise the Docker configuration
/// below `home` is consulted; missing files mean anonymous access.
pub fn resolve(
    override_creds: Option<&Credentials>,
    home: Option<&Path>,
    registry: &str,
) -> Result<Credentials> {
    if let Some(creds) = override_creds {
        return Ok(creds.clone());
    }
    let home = match home {
        Some(h) => h,
        None => {
            debug!("No home directory, using anonymous access to {}", registry);
            return Ok(Credentials::anonymous());
        }
    };
    match load_auth_entries(home)? {
        Some(entries) => lookup(&entries, registry),
        None => {
            trace!("No docker configuration found in {:?}", home);
            Ok(Credentials::anonymous())
        }
    }
}

/// Parse credentials for `registry` out of a `config.json`-shaped reader.
pub fn from_reader<R: io::Read>(reader: R, registry: &str) -> Result<Credentials> {
    let cfg: DockerConfigFile = serde_json::from_reader(reader)?;
    lookup(&cfg.auths.unwrap_or_default(), registry)
}

/// Read the current configuration file, falling back to the legacy one.
fn load_auth_entries(home: &Path) -> Result<Option<AuthEntries>> {
    let current = home.join(DOCKER_CFG_DIR).join(DOCKER_CFG_FILE);
    if let Some(data) = read_if_exists(&current)? {
        let cfg: DockerConfigFile = serde_json::from_slice(&data).map_err(|source| {
            Error::CredentialFormat {
                path: current.clone(),
                source,
            }
        })?;
        return Ok(Some(cfg.auths.unwrap_or_default()));
    }

    let legacy = home.join(DOCKER_CFG_LEGACY);
    match read_if_exists(&legacy)? {
        Some(data) => {
            let entries: Option<AuthEntries> = serde_json::from_slice(&data)
                .map_err(|source| Error::CredentialFormat {
                    path: legacy.clone(),
                    source,
                })?;
            Ok(Some(entries.unwrap_or_default()))
        }
        None => Ok(None),
    }
}

fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::CredentialFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn lookup(entries: &AuthEntries, registry: &str) -> Result<Credentials> {
    if let Some(c) = entries.get(registry) {
        return decode_auth(&c.auth);
    }

    // Keys are tried in sorted order so duplicates after normalization
    // resolve the same way on every run.
    let wanted = normalize_registry(registry);
    let mut keys: Vec<&String> = entries.keys().collect();
    keys.sort();
    let hit = keys
        .into_iter()
        .find(|k| normalize_registry(k) == wanted)
        .and_then(|k| entries.get(k));
    match hit {
        Some(c) => decode_auth(&c.auth),
        None => {
            trace!("No credentials stored for {}", registry);
            Ok(Credentials::anonymous())
        }
    }
}

/// Decode a base64 `user:password` blob.
///
/// A blob without a `:` separator is ignored, the way Docker does.
pub fn decode_auth(blob: &str) -> Result<Credentials> {
    let decoded = base64::decode(blob)?;
    let sep = match decoded.iter().position(|b| *b == b':') {
        Some(i) => i,
        None => return Ok(Credentials::anonymous()),
    };
    let user = String::from_utf8_lossy(&decoded[..sep]);
    let password = String::from_utf8_lossy(&decoded[sep + 1..]);
    trace!("Found credentials for user={:?}", user);
    Ok(Credentials::new(user, password.trim_matches('\0')))
}

/// Reduce a registry URL to its hostname.
fn convert_to_hostname(url: &str) -> &str {
    let stripped = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .unwrap_or(url);
    stripped.split('/').next().unwrap_or(stripped)
}

/// Canonical hostname under which credentials for `registry` are compared.
pub fn normalize_registry(registry: &str) -> String {
    match convert_to_hostname(registry) {
        "registry-1.docker.io" | "docker.io" => DOCKER_AUTH_HOSTNAME.to_string(),
        other => other.to_string(),
    }
}
