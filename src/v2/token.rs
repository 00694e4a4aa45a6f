//! Bearer token exchange with a registry token service.

use crate::credentials::Credentials;
use crate::errors::{Error, Result};
use chrono::{DateTime, Datelike, Duration, Utc};
use reqwest::StatusCode;
use std::collections::HashSet;

/// Shortest lifetime accepted from a token service, in seconds.
pub const MINIMUM_TOKEN_LIFETIME_SECONDS: i64 = 60;

/// A token issued by a token service, normalized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BearerToken {
    token: String,
    expires_in: i64,
    issued_at: DateTime<Utc>,
}

/// Token service response as found on the wire.
#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: String,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    issued_at: Option<DateTime<Utc>>,
}

impl BearerToken {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Lifetime in seconds, never below `MINIMUM_TOKEN_LIFETIME_SECONDS`.
    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Absolute expiration, `issued_at + expires_in`.
    pub fn expiration(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(self.expires_in)
    }

    /// Decode a token service response body, clamping the lifetime and
    /// defaulting the issuance time to `now`.
    pub fn from_response(body: &[u8], now: DateTime<Utc>) -> Result<Self> {
        let mut unknown = HashSet::new();
        let raw: TokenResponse = serde_ignored::deserialize(
            &mut serde_json::Deserializer::from_slice(body),
            |path| {
                unknown.insert(path.to_string());
            },
        )?;
        if !unknown.is_empty() {
            trace!("Ignored token response fields: {:?}", unknown);
        }
        Ok(Self::normalize(raw, now))
    }

    fn normalize(raw: TokenResponse, now: DateTime<Utc>) -> Self {
        let token = match (raw.token.is_empty(), raw.access_token) {
            (true, Some(at)) => at,
            (_, _) => raw.token,
        };
        let mut expires_in = raw.expires_in;
        if expires_in < MINIMUM_TOKEN_LIFETIME_SECONDS {
            expires_in = MINIMUM_TOKEN_LIFETIME_SECONDS;
            debug!("Increasing token expiration to: {} seconds", expires_in);
        }
        // Zero timestamps (year 1) count as missing.
        let issued_at = raw
            .issued_at
            .filter(|t| t.year() > 1)
            .unwrap_or(now);
        BearerToken {
            token,
            expires_in,
            issued_at,
        }
    }
}

/// Request a token for `scope` from the service at `realm`.
///
/// `http` must be a token-service transport (see `TransportBuilder::token_service`).
pub(crate) async fn get_bearer_token(
    http: &reqwest::Client,
    credentials: &Credentials,
    realm: &str,
    service: &str,
    scope: &str,
) -> Result<BearerToken> {
    let mut url = url::Url::parse(realm)?;
    {
        let mut query = url.query_pairs_mut();
        if !service.is_empty() {
            query.append_pair("service", service);
        }
        if !scope.is_empty() {
            query.append_pair("scope", scope);
        }
    }
    // `query_pairs_mut` leaves an empty `?` behind when nothing was added.
    if url.query() == Some("") {
        url.set_query(None);
    }
    trace!("Token endpoint: {}", url);

    let mut req = http.get(url.clone());
    if !credentials.username.is_empty() && !credentials.password.is_empty() {
        req = req.basic_auth(&credentials.username, Some(&credentials.password));
    }
    let res = req.send().await?;
    trace!("Got status {}", res.status());
    match res.status() {
        StatusCode::OK => {}
        StatusCode::UNAUTHORIZED => return Err(Error::TokenUnauthorized),
        status => return Err(Error::TokenStatus { status, url }),
    }

    let body = res.bytes().await?;
    BearerToken::from_response(&body, Utc::now())
}
