use crate::errors::{Error, Result};
use crate::v2::token::get_bearer_token;
use crate::v2::*;
use chrono::Utc;
use reqwest::RequestBuilder;

/// Authentication schemes this client can answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AuthScheme {
    Basic,
    Bearer,
}

impl Client {
    /// Add credentials to `req` according to the challenge seen when probing.
    ///
    /// Challenges come from the `/v2/` ping rather than from the request's own
    /// response: some registries answer 401 without a `WWW-Authenticate`
    /// header on API endpoints. Only the first challenge is honored.
    pub(crate) async fn setup_request_auth(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let challenge = match self.challenges().into_iter().next() {
            Some(c) => c,
            None => return Ok(req),
        };
        let scheme: AuthScheme = challenge
            .scheme
            .parse()
            .map_err(|_| Error::UnsupportedAuthScheme(challenge.scheme.clone()))?;

        match scheme {
            AuthScheme::Basic => Ok(req.basic_auth(
                &self.credentials.username,
                Some(&self.credentials.password),
            )),
            AuthScheme::Bearer => {
                let token = self.bearer_token(&challenge).await?;
                Ok(req.bearer_auth(token))
            }
        }
    }

    /// Cached token if still valid, otherwise a freshly exchanged one.
    async fn bearer_token(&self, challenge: &Challenge) -> Result<String> {
        let cached = {
            let state = self.state();
            state
                .token
                .as_ref()
                .filter(|t| Utc::now() <= t.expiration())
                .map(|t| t.token().to_string())
        };
        if let Some(t) = cached {
            return Ok(t);
        }

        let realm = challenge.parameter("realm").ok_or(Error::MissingRealm)?;
        let service = challenge.parameter("service").unwrap_or_default();
        let scope = self.scope.to_string();
        trace!("Requesting token for scope {}", scope);

        let token =
            get_bearer_token(&self.token_client, &self.credentials, realm, service, &scope).await?;
        trace!("Got token, expiring at {}", token.expiration());
        let value = token.token().to_string();
        self.state().token = Some(token);
        Ok(value)
    }
}
