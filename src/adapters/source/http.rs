//! HTTP(S) source fetcher
//!
//! Streams the response body to the staging path chunk by chunk; source
//! files are modest today but nothing here requires them to fit in
//! memory.

use crate::adapters::source::SourceFetcher;
use crate::config::HttpConfig;
use crate::domain::errors::SourceError;
use crate::domain::result::Result;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, ClientBuilder};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

/// HTTP implementation of [`SourceFetcher`] backed by reqwest
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a new fetcher from HTTP settings
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be constructed.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()
            .map_err(|e| SourceError::ConnectionFailed(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    fn map_request_error(err: reqwest::Error, url: &Url) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout(url.to_string())
        } else if err.is_connect() {
            SourceError::ConnectionFailed(format!("{url}: {err}"))
        } else {
            SourceError::ConnectionFailed(err.to_string())
        }
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<u64> {
        tracing::debug!(url = %url, dest = %dest.display(), "Fetching source file");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Self::map_request_error(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into());
        }

        let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
            SourceError::StagingWrite(format!("{}: {e}", dest.display()))
        })?;

        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Self::map_request_error(e, url))?;
            file.write_all(&chunk).await.map_err(|e| {
                SourceError::StagingWrite(format!("{}: {e}", dest.display()))
            })?;
            bytes_written += chunk.len() as u64;
        }

        file.flush().await.map_err(|e| {
            SourceError::StagingWrite(format!("{}: {e}", dest.display()))
        })?;

        tracing::info!(
            url = %url,
            dest = %dest.display(),
            bytes = bytes_written,
            "Source file staged"
        );

        Ok(bytes_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::PipelineError;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&HttpConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_writes_body_to_dest() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/customers.csv")
            .with_status(200)
            .with_body("customer_id,customer_name,email,city\n1,A,a@x,NY\n")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("customers.csv");
        let url = Url::parse(&format!("{}/customers.csv", server.url())).unwrap();

        let bytes = fetcher().fetch(&url, &dest).await.unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, 48);
        let contents = std::fs::read_to_string(&dest).unwrap();
        assert!(contents.starts_with("customer_id,"));
    }

    #[tokio::test]
    async fn test_fetch_maps_http_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/orders.csv")
            .with_status(503)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("orders.csv");
        let url = Url::parse(&format!("{}/orders.csv", server.url())).unwrap();

        let err = fetcher().fetch(&url, &dest).await.unwrap_err();
        match err {
            PipelineError::Source(SourceError::HttpStatus { status, .. }) => {
                assert_eq!(status, 503);
            }
            other => panic!("expected HttpStatus, got {other}"),
        }
        // No partial file left behind on a status error.
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_fails_when_dest_dir_missing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/customers.csv")
            .with_status(200)
            .with_body("header\n")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/customers.csv", server.url())).unwrap();
        let dest = Path::new("/nonexistent-cartage-dir/customers.csv");

        let err = fetcher().fetch(&url, dest).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Source(SourceError::StagingWrite(_))
        ));
    }
}
