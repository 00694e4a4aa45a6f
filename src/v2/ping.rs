use crate::errors::{Error, Result};
use crate::v2::challenge::parse_auth_headers;
use crate::v2::*;

impl Client {
    /// Scheme of this registry, probing it on first use.
    ///
    /// A successful ping is cached for the lifetime of the client.
    pub async fn detect_scheme(&self) -> Result<Scheme> {
        if let Some(scheme) = self.scheme() {
            return Ok(scheme);
        }
        self.ping().await
    }

    /// Ping `/v2/` over https, then over http if the registry is insecure.
    ///
    /// When both fail, `/v1/_ping` is tried to tell a legacy registry apart
    /// from an unreachable one.
    async fn ping(&self) -> Result<Scheme> {
        let mut res = self.ping_v2(Scheme::Https).await;
        if res.is_err() && self.insecure_registry {
            res = self.ping_v2(Scheme::Http).await;
        }
        let err = match res {
            Ok(scheme) => return Ok(scheme),
            Err(e) => Error::Ping(Box::new(e)),
        };
        if self.disable_v1_ping {
            return Err(err);
        }

        let mut is_v1 = self.ping_v1(Scheme::Https).await;
        if !is_v1 && self.insecure_registry {
            is_v1 = self.ping_v1(Scheme::Http).await;
        }
        if is_v1 {
            return Err(Error::V1NotSupported);
        }
        Err(err)
    }

    async fn ping_v2(&self, scheme: Scheme) -> Result<Scheme> {
        let url = Url::parse(&format!("{}://{}/v2/", scheme, self.registry))?;
        let res = self
            .make_request_to_resolved_url(Method::GET, url.clone(), HeaderMap::new(), None, false)
            .await;
        let res = match res {
            Ok(r) => r,
            Err(e) => {
                debug!("Ping {} err {}", url, e);
                return Err(e);
            }
        };
        debug!("Ping {} status {}", url, res.status());
        match res.status() {
            StatusCode::OK | StatusCode::UNAUTHORIZED => {}
            status => return Err(Error::UnexpectedPingStatus(status)),
        }

        let challenges = parse_auth_headers(res.headers());
        trace!("Registry {} challenges: {:?}", self.registry, challenges);
        self.state().detection = Detection::Detected { scheme, challenges };
        Ok(scheme)
    }

    async fn ping_v1(&self, scheme: Scheme) -> bool {
        let url = match Url::parse(&format!("{}://{}/v1/_ping", scheme, self.registry)) {
            Ok(u) => u,
            Err(_) => return false,
        };
        let res = self
            .make_request_to_resolved_url(Method::GET, url.clone(), HeaderMap::new(), None, false)
            .await;
        match res {
            Ok(r) => {
                debug!("Ping {} status {}", url, r.status());
                matches!(r.status(), StatusCode::OK | StatusCode::UNAUTHORIZED)
            }
            Err(e) => {
                debug!("Ping {} err {}", url, e);
                false
            }
        }
    }
}
