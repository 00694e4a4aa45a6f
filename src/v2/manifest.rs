use crate::errors::{Error, Result};
use crate::mediatypes::DEFAULT_MANIFEST_TYPES;
use crate::v2::*;
use bytes::Bytes;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};

/// Raw manifest bytes as served by the registry.
#[derive(Debug, Clone)]
pub struct ManifestResponse {
    pub body: Bytes,
    /// Media type from `Content-Type`, if the registry sent one.
    pub media_type: Option<mime::Mime>,
    /// Value of `Docker-Content-Digest`, if present.
    pub digest: Option<String>,
}

impl Client {
    /// Fetch an image manifest.
    ///
    /// The reference may be either a tag or digest. `mediatypes` defaults to
    /// every known manifest type.
    pub async fn get_manifest(
        &self,
        reference: &str,
        mediatypes: Option<&[&str]>,
    ) -> Result<ManifestResponse> {
        let path = format!("{}/manifests/{}", self.scope.remote_name(), reference);
        let res = self
            .make_request(Method::GET, &path, Some(accept_headers(mediatypes)?), None)
            .await?;

        let status = res.status();
        trace!("GET {} status: {}", res.url(), status);
        check_status(status)?;

        let media_type = match res.headers().get(CONTENT_TYPE) {
            Some(v) => Some(v.to_str()?.parse::<mime::Mime>()?),
            None => None,
        };
        let digest = match res.headers().get("Docker-Content-Digest") {
            Some(v) => Some(v.to_str()?.to_string()),
            None => None,
        };
        let body = res.bytes().await?;
        Ok(ManifestResponse {
            body,
            media_type,
            digest,
        })
    }

    /// Check if an image manifest exists.
    pub async fn has_manifest(&self, reference: &str, mediatypes: Option<&[&str]>) -> Result<bool> {
        let path = format!("{}/manifests/{}", self.scope.remote_name(), reference);
        let res = self
            .make_request(Method::HEAD, &path, Some(accept_headers(mediatypes)?), None)
            .await?;

        trace!("HEAD {} status: {}", res.url(), res.status());
        match res.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(Error::UnexpectedHttpStatus(status)),
        }
    }
}

fn accept_headers(mediatypes: Option<&[&str]>) -> Result<HeaderMap> {
    let accept = mediatypes.unwrap_or(DEFAULT_MANIFEST_TYPES).join(", ");
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_str(&accept)?);
    Ok(headers)
}
