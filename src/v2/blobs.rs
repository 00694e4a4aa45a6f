use crate::errors::{Error, Result};
use crate::v2::*;
use bytes::Bytes;
use futures::stream::{Stream, TryStreamExt};
use reqwest::header::LOCATION;

impl Client {
    /// Check if a blob exists.
    pub async fn has_blob(&self, digest: &str) -> Result<bool> {
        let path = format!("{}/blobs/{}", self.scope.remote_name(), digest);
        let res = self.make_request(Method::HEAD, &path, None, None).await?;

        trace!("Blob HEAD status: {:?}", res.status());

        match res.status() {
            StatusCode::OK => Ok(true),
            _ => Ok(false),
        }
    }

    async fn get_blob_response(&self, digest: &str) -> Result<Response> {
        let path = format!("{}/blobs/{}", self.scope.remote_name(), digest);
        let res = self.make_request(Method::GET, &path, None, None).await?;

        trace!("GET {} status: {}", res.url(), res.status());
        check_status(res.status())?;
        if let Some(len) = res.content_length() {
            trace!("Receiving a blob with {} bytes", len);
        }
        Ok(res)
    }

    /// Retrieve a blob.
    pub async fn get_blob(&self, digest: &str) -> Result<Bytes> {
        Ok(self.get_blob_response(digest).await?.bytes().await?)
    }

    /// Retrieve a blob as a stream of chunks.
    pub async fn get_blob_stream(&self, digest: &str) -> Result<impl Stream<Item = Result<Bytes>>> {
        let res = self.get_blob_response(digest).await?;
        Ok(res.bytes_stream().map_err(Error::from))
    }

    /// Start a blob upload and return the absolute upload location.
    pub async fn start_blob_upload(&self) -> Result<Url> {
        let path = format!("{}/blobs/uploads/", self.scope.remote_name());
        let res = self.make_request(Method::POST, &path, None, None).await?;

        trace!("POST {} status: {}", res.url(), res.status());
        match res.status() {
            StatusCode::ACCEPTED => {}
            status => {
                check_status(status)?;
                return Err(Error::UnexpectedHttpStatus(status));
            }
        }
        let location = res
            .headers()
            .get(LOCATION)
            .ok_or(Error::MissingHeader("Location"))?
            .to_str()?;
        Ok(res.url().join(location)?)
    }
}
