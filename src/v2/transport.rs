//! HTTP transports for registry and token-service connections.

use crate::errors::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(feature = "reqwest-default-tls")]
use pkcs8::der::asn1::{AnyRef, Null};
#[cfg(feature = "reqwest-default-tls")]
use pkcs8::der::pem::{self, LineEnding};
#[cfg(feature = "reqwest-default-tls")]
use pkcs8::der::Encode;
#[cfg(feature = "reqwest-default-tls")]
use pkcs8::spki::AlgorithmIdentifierRef;
#[cfg(feature = "reqwest-default-tls")]
use pkcs8::{ObjectIdentifier, PrivateKeyInfo};
#[cfg(feature = "reqwest-default-tls")]
use rustls_pemfile::Item;
#[cfg(feature = "reqwest-default-tls")]
use std::convert::TryFrom;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

/// Whether the server certificate chain is verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CertificateVerification {
    Enabled,
    /// Accept any certificate and hostname.
    Disabled,
}

impl Default for CertificateVerification {
    fn default() -> Self {
        CertificateVerification::Enabled
    }
}

/// Builder for the `reqwest::Client` behind a registry connection.
///
/// Every transport reads proxies from the environment, uses a 30s
/// connect timeout with 30s TCP keep-alive and opens a fresh connection
/// per request (no idle pooling).
#[derive(Clone, Debug, Default)]
pub struct TransportBuilder {
    cert_dir: Option<PathBuf>,
    verification: CertificateVerification,
}

impl TransportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport for bearer token services.
    ///
    /// Token services are a separate trust domain from the registry and are
    /// contacted without certificate verification.
    pub fn token_service() -> Self {
        Self::new().verification(CertificateVerification::Disabled)
    }

    /// Load CA certificates (`*.crt`) and client identities (`*.cert` + `*.key`) from `dir`.
    pub fn cert_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.cert_dir = dir;
        self
    }

    pub fn verification(mut self, verification: CertificateVerification) -> Self {
        self.verification = verification;
        self
    }

    pub fn build(self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .tcp_keepalive(TCP_KEEPALIVE)
            .pool_max_idle_per_host(0)
            // Hardened floor, also applied with custom certificates.
            .min_tls_version(reqwest::tls::Version::TLS_1_0);

        if let Some(dir) = &self.cert_dir {
            let certs = CertDir::load(dir)?;
            for ca in certs.roots {
                builder = builder.add_root_certificate(ca);
            }
            if let Some(identity) = certs.identity {
                builder = builder.identity(identity);
            }
        }
        if self.verification == CertificateVerification::Disabled {
            builder = skip_verification(builder);
        }
        Ok(builder.build()?)
    }
}

#[cfg(feature = "reqwest-default-tls")]
fn skip_verification(builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
    builder
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
}

// rustls skips hostname checks along with the certificate chain.
#[cfg(all(feature = "reqwest-rustls", not(feature = "reqwest-default-tls")))]
fn skip_verification(builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
    builder.danger_accept_invalid_certs(true)
}

/// Certificates found in a certificate directory.
struct CertDir {
    roots: Vec<reqwest::Certificate>,
    identity: Option<reqwest::Identity>,
}

impl CertDir {
    fn load(dir: &Path) -> Result<Self> {
        let mut res = CertDir {
            roots: vec![],
            identity: None,
        };
        let names = match list_files(dir) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!("Certificate directory {:?} does not exist", dir);
                return Ok(res);
            }
            Err(e) => return Err(e.into()),
        };
        check_pairs(&names)?;

        for name in &names {
            let full = dir.join(name);
            if name.ends_with(".crt") {
                let bundle = reqwest::Certificate::from_pem_bundle(&fs::read(&full)?)?;
                debug!("crt: {:?} ({} certificates)", full, bundle.len());
                res.roots.extend(bundle);
            }
            if let Some(stem) = name.strip_suffix(".cert") {
                debug!("cert: {:?}", full);
                let cert = fs::read(&full)?;
                let key = fs::read(dir.join(format!("{}.key", stem)))?;
                if res.identity.is_some() {
                    warn!("Multiple client certificates in {:?}, using {:?}", dir, full);
                }
                res.identity = Some(load_identity(&cert, &key)?);
            }
        }
        Ok(res)
    }
}

fn list_files(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = vec![];
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Every `.cert` needs a `.key` with the same stem, and vice versa.
fn check_pairs(names: &[String]) -> Result<()> {
    let has = |n: &str| names.iter().any(|x| x == n);
    for name in names {
        if let Some(stem) = name.strip_suffix(".cert") {
            let key = format!("{}.key", stem);
            if !has(&key) {
                return Err(Error::TlsConfig(format!(
                    "missing key {} for client certificate {}. Note that CA certificates should use the extension .crt",
                    key, name
                )));
            }
        }
        if let Some(stem) = name.strip_suffix(".key") {
            let cert = format!("{}.cert", stem);
            if !has(&cert) {
                return Err(Error::TlsConfig(format!(
                    "missing client certificate {} for key {}",
                    cert, name
                )));
            }
        }
    }
    Ok(())
}

#[cfg(feature = "reqwest-default-tls")]
fn load_identity(cert: &[u8], key: &[u8]) -> Result<reqwest::Identity> {
    let key = pkcs8_key_pem(key)?;
    Ok(reqwest::Identity::from_pkcs8_pem(cert, key.as_bytes())?)
}

#[cfg(feature = "reqwest-default-tls")]
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
#[cfg(feature = "reqwest-default-tls")]
const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// Re-encode the first private key in `key` as a PKCS#8 PEM document.
///
/// native-tls only takes PKCS#8, while certificate directories routinely
/// hold PKCS#1 (`RSA PRIVATE KEY`) and SEC1 (`EC PRIVATE KEY`) keys.
#[cfg(feature = "reqwest-default-tls")]
fn pkcs8_key_pem(key: &[u8]) -> Result<String> {
    let mut reader = key;
    loop {
        let item = rustls_pemfile::read_one(&mut reader)
            .map_err(|e| Error::TlsConfig(format!("invalid PEM private key: {}", e)))?;
        match item {
            Some(Item::Pkcs8Key(k)) => return encode_pem(k.secret_pkcs8_der()),
            Some(Item::Pkcs1Key(k)) => {
                trace!("Converting PKCS#1 RSA key to PKCS#8");
                let null = AnyRef::from(Null);
                return encode_pkcs8(RSA_ENCRYPTION, Some(null), k.secret_pkcs1_der());
            }
            Some(Item::Sec1Key(k)) => {
                trace!("Converting SEC1 EC key to PKCS#8");
                let der = k.secret_sec1_der();
                let ec = sec1::EcPrivateKey::try_from(der)
                    .map_err(|e| Error::TlsConfig(format!("invalid EC private key: {}", e)))?;
                let curve = ec
                    .parameters
                    .and_then(|p| p.named_curve())
                    .ok_or_else(|| {
                        Error::TlsConfig("EC private key without a named curve".to_string())
                    })?;
                return encode_pkcs8(EC_PUBLIC_KEY, Some(AnyRef::from(&curve)), der);
            }
            // Certificates and `EC PARAMETERS` blocks may precede the key.
            Some(_) => continue,
            None => return Err(Error::TlsConfig("no private key found".to_string())),
        }
    }
}

#[cfg(feature = "reqwest-default-tls")]
fn encode_pkcs8(
    oid: ObjectIdentifier,
    parameters: Option<AnyRef<'_>>,
    private_key: &[u8],
) -> Result<String> {
    let info = PrivateKeyInfo {
        algorithm: AlgorithmIdentifierRef { oid, parameters },
        private_key,
        public_key: None,
    };
    let der = info
        .to_der()
        .map_err(|e| Error::TlsConfig(format!("encoding PKCS#8 key: {}", e)))?;
    encode_pem(&der)
}

#[cfg(feature = "reqwest-default-tls")]
fn encode_pem(der: &[u8]) -> Result<String> {
    pem::encode_string("PRIVATE KEY", LineEnding::LF, der)
        .map_err(|e| Error::TlsConfig(format!("encoding PKCS#8 key: {}", e)))
}

#[cfg(all(feature = "reqwest-rustls", not(feature = "reqwest-default-tls")))]
fn load_identity(cert: &[u8], key: &[u8]) -> Result<reqwest::Identity> {
    let mut pem = cert.to_vec();
    pem.push(b'\n');
    pem.extend_from_slice(key);
    Ok(reqwest::Identity::from_pem(&pem)?)
}
