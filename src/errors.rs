//! Error handling

use std::path::PathBuf;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("base64 decode error")]
    Base64Decode(#[from] base64::DecodeError),
    #[error("header parse error")]
    HeaderParse(#[from] reqwest::header::ToStrError),
    #[error("invalid header value")]
    HeaderValue(#[from] reqwest::header::InvalidHeaderValue),
    #[error("json error")]
    Json(#[from] serde_json::Error),
    #[error("yaml error")]
    Yaml(#[from] serde_yaml::Error),
    #[error("http transport error")]
    Reqwest(#[from] reqwest::Error),
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error("URI parse error")]
    Uri(#[from] url::ParseError),
    #[error("strum error")]
    StrumParse(#[from] strum::ParseError),

    #[error("reading credentials from {path:?}")]
    CredentialFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing credentials from {path:?}")]
    CredentialFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid TLS configuration: {0}")]
    TlsConfig(String),

    #[error("missing realm in bearer auth challenge")]
    MissingRealm,
    #[error("no handler for {0} authentication")]
    UnsupportedAuthScheme(String),
    #[error("unable to retrieve auth token: 401 unauthorized")]
    TokenUnauthorized,
    #[error("unexpected http code: {status}, URL: {url}")]
    TokenStatus {
        status: reqwest::StatusCode,
        url: url::Url,
    },

    #[error("error pinging repository, response code {0}")]
    UnexpectedPingStatus(reqwest::StatusCode),
    #[error("pinging docker registry returned: {0}")]
    Ping(#[source] Box<Error>),
    #[error("can't talk to a V1 docker registry")]
    V1NotSupported,

    #[error("invalid image reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },
    #[error("invalid signature storage configuration: {0}")]
    SignatureConfig(String),
    #[error("error parsing {path:?}")]
    SignatureConfigFormat {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("missing header {0}")]
    MissingHeader(&'static str),
    #[error("mime parse error")]
    MimeParse(#[from] mime::FromStrError),
    #[error("client error (status {status})")]
    Client { status: reqwest::StatusCode },
    #[error("server error (status {status})")]
    Server { status: reqwest::StatusCode },
    #[error("unexpected HTTP status {0}")]
    UnexpectedHttpStatus(reqwest::StatusCode),
}

impl Error {
    /// Whether the registry turned out to speak only the legacy V1 API.
    pub fn is_v1_registry(&self) -> bool {
        matches!(self, Error::V1NotSupported)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
