//! Parser for `docker://` URLs.
//!
//! This module provides support for parsing image references.
//!
//! ## Example
//!
//! ```rust
//! # fn run() -> dkregistry_auth::errors::Result<()> {
//! use std::str::FromStr;
//! use dkregistry_auth::reference::Reference;
//!
//! // Parse an image reference
//! let dkref = Reference::from_str("docker://busybox")?;
//! assert_eq!(dkref.domain(), "docker.io");
//! assert_eq!(dkref.path(), "library/busybox");
//! assert_eq!(dkref.version(), "latest");
//! assert_eq!(dkref.policy_identity(), "docker.io/library/busybox:latest");
//! #
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```

// The `docker://` schema is not officially documented, but has a reference implementation:
// https://github.com/docker/distribution/blob/v2.6.1/reference/reference.go

use crate::errors::Error;
use crate::DOCKER_HOSTNAME;
use std::{fmt, str};

const MAX_NAME_LEN: usize = 255;
const MAX_TAG_LEN: usize = 128;

/// Image version, either a tag or a digest.
#[derive(Clone, PartialEq, Eq)]
pub enum Version {
    Tag(String),
    Digest(String, String),
}

impl str::FromStr for Version {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = match s.chars().next() {
            Some(':') => {
                let tag = &s[1..];
                if !is_valid_tag(tag) {
                    return Err(invalid(s, "invalid tag format"));
                }
                Version::Tag(tag.to_string())
            }
            Some('@') => {
                let r: Vec<&str> = s[1..].splitn(2, ':').collect();
                match (r.first(), r.get(1)) {
                    (Some(alg), Some(hex)) if !alg.is_empty() && is_hex(hex) => {
                        Version::Digest(alg.to_string(), hex.to_string())
                    }
                    _ => return Err(invalid(s, "wrong digest format")),
                }
            }
            Some(_) => return Err(invalid(s, "unknown prefix")),
            None => return Err(invalid(s, "too short")),
        };
        Ok(v)
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::Tag("latest".to_string())
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Version::Tag(s) => write!(f, ":{}", s),
            Version::Digest(t, d) => write!(f, "@{}:{}", t, d),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Version::Tag(s) => write!(f, "{}", s),
            Version::Digest(t, d) => write!(f, "{}:{}", t, d),
        }
    }
}

/// A registry image reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    has_schema: bool,
    raw_input: String,
    domain: String,
    path: String,
    version: Version,
}

impl Reference {
    pub fn new(domain: Option<String>, path: String, version: Option<Version>) -> Self {
        Self {
            has_schema: false,
            raw_input: "".into(),
            domain: domain.unwrap_or_else(|| DOCKER_HOSTNAME.to_string()),
            path,
            version: version.unwrap_or_default(),
        }
    }

    /// Registry domain as written in the reference (not canonicalized to an API host).
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Repository path, without domain, tag or digest.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Tag or digest, as used in the `manifests/<ref>` endpoint.
    pub fn version(&self) -> String {
        self.version.to_string()
    }

    pub fn has_schema(&self) -> bool {
        self.has_schema
    }

    pub fn to_raw_string(&self) -> String {
        self.raw_input.clone()
    }

    /// Fully-qualified repository name, e.g. `docker.io/library/busybox`.
    pub fn name(&self) -> String {
        format!("{}/{}", self.domain, self.path)
    }

    /// The most specific identity of this reference, used for configuration lookups.
    pub fn policy_identity(&self) -> String {
        format!("{}{:?}", self.name(), self.version)
    }

    /// Namespaces containing this reference, from most to least specific.
    ///
    /// For `docker.io/library/busybox:latest` these are
    /// `docker.io/library/busybox`, `docker.io/library` and `docker.io`.
    pub fn policy_namespaces(&self) -> Vec<String> {
        let mut name = self.name();
        let mut res = vec![name.clone()];
        while let Some(i) = name.rfind('/') {
            name.truncate(i);
            res.push(name.clone());
        }
        res
    }

    pub fn to_url(&self) -> String {
        format!("docker://{}", self)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}{:?}", self.domain, self.path, self.version)
    }
}

impl str::FromStr for Reference {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_url(s)
    }
}

fn parse_url(input: &str) -> Result<Reference, Error> {
    let has_schema = input.starts_with("docker://");
    let rest = input.trim_start_matches("docker://");

    let (rest, digest) = match rest.find('@') {
        Some(i) => {
            let (name, d) = rest.split_at(i);
            (name, Some(d.parse::<Version>()?))
        }
        None => (rest, None),
    };
    let last_slash = rest.rfind('/').map(|i| i + 1).unwrap_or(0);
    let (name, tag) = match rest[last_slash..].rfind(':') {
        Some(i) => {
            let (name, t) = rest.split_at(last_slash + i);
            (name, Some(t.parse::<Version>()?))
        }
        None => (rest, None),
    };
    let version = match (tag, digest) {
        (Some(_), Some(_)) => {
            return Err(invalid(
                input,
                "references with both a tag and digest are not supported",
            ))
        }
        (Some(v), None) | (None, Some(v)) => v,
        (None, None) => Version::default(),
    };

    if name.is_empty() {
        return Err(invalid(input, "name too short"));
    }
    let (domain, path) = split_domain(name);
    if domain.len() + 1 + path.len() > MAX_NAME_LEN {
        return Err(invalid(input, "name too long"));
    }
    if !path.split('/').all(is_valid_component) {
        return Err(invalid(input, "invalid repository name"));
    }

    Ok(Reference {
        has_schema,
        raw_input: input.to_string(),
        domain,
        path,
        version,
    })
}

/// Split a name into registry domain and repository path, applying Docker Hub defaults.
fn split_domain(name: &str) -> (String, String) {
    let (domain, path) = match name.split_once('/') {
        Some((first, rest))
            if first.contains('.') || first.contains(':') || first == "localhost" =>
        {
            (first.to_string(), rest.to_string())
        }
        _ => (DOCKER_HOSTNAME.to_string(), name.to_string()),
    };
    if domain == DOCKER_HOSTNAME && !path.contains('/') {
        return (domain, format!("library/{}", path));
    }
    (domain, path)
}

/// Path components are lowercase alphanumerics, joined by `.`, `_`, `__` or runs of `-`.
fn is_valid_component(c: &str) -> bool {
    let bytes = c.as_bytes();
    let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) if alnum(first) && alnum(last) => {}
        _ => return false,
    }
    for part in c.split(|ch: char| ch == '.' || ch == '_' || ch == '-') {
        if !part.bytes().all(|b| alnum(&b)) {
            return false;
        }
    }
    !(c.contains("..") || c.contains("___") || c.contains("._") || c.contains("_.")
        || c.contains(".-") || c.contains("-.") || c.contains("_-") || c.contains("-_"))
}

fn is_valid_tag(t: &str) -> bool {
    let mut chars = t.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => {}
        _ => return false,
    }
    t.len() <= MAX_TAG_LEN && chars.all(|c| c.is_ascii_alphanumeric() || "_.-".contains(c))
}

fn is_hex(s: &str) -> bool {
    s.len() >= 32 && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn invalid(reference: &str, reason: &str) -> Error {
    Error::InvalidReference {
        reference: reference.to_string(),
        reason: reason.to_string(),
    }
}
