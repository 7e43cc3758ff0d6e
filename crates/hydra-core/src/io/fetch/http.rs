//! HTTP(S) backend streaming response bodies.

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::{Client, StatusCode};
use tokio_util::io::StreamReader;

use super::{ByteStream, FetchError, Retriever, join_url};
use crate::config::FetchConfig;

/// Streams files from `http://` and `https://` roots.
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: Client,
}

impl HttpRetriever {
    /// Build a retriever whose client enforces the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the TLS backend cannot be initialized.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Use an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn open(&self, root: &str, name: &str) -> Result<ByteStream, FetchError> {
        let url = join_url(root, name);
        tracing::debug!("GET {url}");

        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => return Err(FetchError::NotFound(url)),
            status if !status.is_success() => {
                return Err(FetchError::Transport {
                    location: url,
                    reason: format!("HTTP {status}"),
                });
            }
            _ => {}
        }

        let stream = Box::pin(response.bytes_stream().map_err(std::io::Error::other));
        Ok(Box::new(StreamReader::new(stream)))
    }
}
