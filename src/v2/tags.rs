use crate::errors::Result;
use crate::v2::*;
use async_stream::try_stream;
use futures::stream::Stream;
use reqwest::header::LINK;

#[derive(Debug, Default, Deserialize)]
struct TagsChunk {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

impl Client {
    /// List existing tags for the client's repository.
    ///
    /// With `paginate`, tags are fetched `n` at a time following `Link` headers.
    pub fn get_tags(&self, paginate: Option<u32>) -> impl Stream<Item = Result<String>> + '_ {
        try_stream! {
            let mut path = format!("{}/tags/list", self.scope.remote_name());
            if let Some(n) = paginate {
                path = format!("{}?n={}", path, n);
            }
            let mut res = self.make_request(Method::GET, &path, None, None).await?;
            loop {
                trace!("GET {} status: {}", res.url(), res.status());
                check_status(res.status())?;

                let next = match res.headers().get(LINK) {
                    Some(v) => parse_next_link(v.to_str()?)
                        .map(|l| res.url().join(l))
                        .transpose()?,
                    None => None,
                };
                let chunk: TagsChunk = res.json().await?;
                for tag in chunk.tags.unwrap_or_default() {
                    yield tag;
                }

                match next {
                    Some(url) => {
                        res = self
                            .make_request_to_resolved_url(Method::GET, url, HeaderMap::new(), None, true)
                            .await?;
                    }
                    None => break,
                }
            }
        }
    }
}

/// Target of a `Link: <...>; rel="next"` header.
fn parse_next_link(header: &str) -> Option<&str> {
    header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|p| {
            let p = p.trim();
            p == r#"rel="next""# || p == "rel=next"
        });
        if !is_next {
            return None;
        }
        target.strip_prefix('<')?.strip_suffix('>')
    })
}
