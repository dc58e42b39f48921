//! Where snapshots come from.

use std::future::Future;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, Url};

use crate::verdict::ApiResponse;
use crate::{Error, Result};

/// A remote endpoint that produces classification snapshots.
pub trait SnapshotSource: Send + Sync {
    /// Fetch the current snapshot body.
    fn fetch(&self) -> impl Future<Output = Result<ApiResponse>> + Send;
}

/// HTTP client for `GET /api/emails`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    url: Url,
    http_client: Client,
}

impl ApiClient {
    /// Creates a client for the given endpoint.
    ///
    /// The timeout bounds the whole request, including reading the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is invalid and [`Error::Http`] if
    /// the HTTP client cannot be built.
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::Config(format!("invalid API URL {url}: {e}")))?;
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self { url, http_client })
    }

    /// The endpoint this client talks to.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

impl SnapshotSource for ApiClient {
    async fn fetch(&self) -> Result<ApiResponse> {
        let response = self
            .http_client
            .get(self.url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.text().await?;
        ApiResponse::from_body(&body)
    }
}
