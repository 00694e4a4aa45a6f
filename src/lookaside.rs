//! Signature storage ("lookaside") locations.
//!
//! Locations are configured by YAML files in a `registries.d` directory:
//!
//! ```yaml
//! default-docker:
//!   sigstore: file:///var/lib/atomic/sigstore
//! docker:
//!   registry.example.com/team:
//!     sigstore: https://sigstore.example.com
//!     sigstore-staging: file:///srv/sigstore-staging
//! ```

use crate::errors::{Error, Result};
use crate::reference::Reference;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// Directory consulted when no other is configured.
pub static SYSTEM_REGISTRIES_DIR: &str = "/etc/containers/registries.d";

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
struct RegistryNamespace {
    #[serde(default)]
    sigstore: String,
    #[serde(default, rename = "sigstore-staging")]
    sigstore_staging: String,
}

impl RegistryNamespace {
    fn top_level(&self, write: bool) -> Option<&str> {
        if write && !self.sigstore_staging.is_empty() {
            return Some(&self.sigstore_staging);
        }
        if !self.sigstore.is_empty() {
            return Some(&self.sigstore);
        }
        None
    }
}

#[derive(Debug, Default, Deserialize)]
struct RegistryConfiguration {
    #[serde(default, rename = "default-docker")]
    default_docker: Option<RegistryNamespace>,
    #[serde(default)]
    docker: Option<HashMap<String, RegistryNamespace>>,
}

/// All `*.yaml` files of a registries.d directory, merged.
#[derive(Debug, Default)]
pub struct SignatureConfig {
    default_docker: Option<RegistryNamespace>,
    docker: HashMap<String, RegistryNamespace>,
}

impl SignatureConfig {
    /// Load and merge every `*.yaml` file in `dir`; a missing directory yields an empty config.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut merged = SignatureConfig::default();
        let mut default_from: Option<PathBuf> = None;
        let mut ns_from: HashMap<String, PathBuf> = HashMap::new();

        let mut paths: Vec<PathBuf> = match fs::read_dir(dir) {
            Ok(rd) => rd
                .map(|e| e.map(|e| e.path()))
                .collect::<io::Result<Vec<_>>>()?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!("No signature storage configuration in {:?}", dir);
                return Ok(merged);
            }
            Err(e) => return Err(e.into()),
        };
        paths.retain(|p| p.extension().map_or(false, |ext| ext == "yaml"));
        paths.sort();

        for path in paths {
            let data = fs::read(&path)?;
            let cfg: RegistryConfiguration =
                serde_yaml::from_slice(&data).map_err(|source| Error::SignatureConfigFormat {
                    path: path.clone(),
                    source,
                })?;

            if let Some(dd) = cfg.default_docker {
                if let Some(prev) = &default_from {
                    return Err(Error::SignatureConfig(format!(
                        "\"default-docker\" defined both in {:?} and {:?}",
                        prev, path
                    )));
                }
                merged.default_docker = Some(dd);
                default_from = Some(path.clone());
            }
            for (ns, ns_cfg) in cfg.docker.unwrap_or_default() {
                if let Some(prev) = ns_from.get(&ns) {
                    return Err(Error::SignatureConfig(format!(
                        "\"docker\" namespace {:?} defined both in {:?} and {:?}",
                        ns, prev, path
                    )));
                }
                ns_from.insert(ns.clone(), path.clone());
                merged.docker.insert(ns, ns_cfg);
            }
        }
        Ok(merged)
    }

    /// Most specific configured top-level URL for `reference`.
    fn top_level(&self, reference: &Reference, write: bool) -> Option<&str> {
        let identity = reference.policy_identity();
        let found = std::iter::once(identity)
            .chain(reference.policy_namespaces())
            .filter_map(|name| self.docker.get(&name))
            .find_map(|ns| ns.top_level(write));
        if found.is_some() {
            return found;
        }
        let res = self.default_docker.as_ref().and_then(|ns| ns.top_level(write));
        if res.is_none() {
            debug!(
                "No signature storage configuration found for {}",
                reference.policy_identity()
            );
        }
        res
    }

    /// Signature storage base URL for `reference`, if one is configured.
    ///
    /// `write` selects the staging location when there is one.
    pub fn storage_base(&self, reference: &Reference, write: bool) -> Result<Option<Url>> {
        let top = match self.top_level(reference, write) {
            Some(t) => t,
            None => return Ok(None),
        };
        let mut url = Url::parse(top).map_err(|e| {
            Error::SignatureConfig(format!("invalid signature storage URL {}: {}", top, e))
        })?;

        let repo = reference.path();
        if repo.split('/').any(|c| c.is_empty() || c == "." || c == "..") {
            return Err(Error::SignatureConfig(format!(
                "unexpected path elements in docker reference {} for signature storage",
                reference
            )));
        }
        let path = format!("{}/{}", url.path().trim_end_matches('/'), repo);
        url.set_path(&path);
        Ok(Some(url))
    }
}

/// Resolve the signature storage location for `reference` from `registries_dir`.
pub fn storage_base(registries_dir: &Path, reference: &Reference, write: bool) -> Result<Option<Url>> {
    SignatureConfig::load(registries_dir)?.storage_base(reference, write)
}
