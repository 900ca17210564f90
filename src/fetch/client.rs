use anyhow::{anyhow, Context, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

const MAX_RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Network side of report retrieval. The pipeline and locator are generic
/// over this so they can run against canned documents.
#[allow(async_fn_in_trait)]
pub trait ReportFetcher {
    /// Body of a single report.
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>>;

    /// Whether `url` is published. `Ok(false)` only for a definite "not there".
    async fn exists(&self, url: &Url) -> Result<bool>;

    /// Raw ZIP bytes of the yearly archive.
    async fn fetch_archive(&self, year: i32) -> Result<Vec<u8>>;
}

/// `reqwest`-backed fetcher for the DOC report endpoints.
pub struct HttpFetcher {
    client: Client,
    archive_url: Url,
}

impl HttpFetcher {
    pub fn new(client: Client, archive_url: Url) -> Self {
        Self {
            client,
            archive_url,
        }
    }

    pub fn archive_url_for(&self, year: i32) -> Result<Url> {
        self.archive_url
            .join(&format!("{year}.zip"))
            .with_context(|| format!("building archive URL for {year}"))
    }

    /// GET with retries on transport errors. HTTP error statuses fail at once.
    async fn get_with_retry(&self, url: &Url) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url.clone()).send().await {
                Ok(resp) if resp.status().is_success() => match resp.bytes().await {
                    Ok(bytes) => return Ok(bytes.to_vec()),
                    Err(e) if attempt < MAX_RETRIES => {
                        warn!(%url, attempt, error = %e, "body read failed; retrying");
                        sleep(RETRY_DELAY).await;
                    }
                    Err(e) => {
                        return Err(e).with_context(|| format!("reading body from {url}"))
                    }
                },
                Ok(resp) => return Err(anyhow!("HTTP error {} for {}", resp.status(), url)),
                Err(e) if attempt < MAX_RETRIES => {
                    warn!(%url, attempt, error = %e, "request failed; retrying");
                    sleep(RETRY_DELAY).await;
                }
                Err(e) => return Err(e).with_context(|| format!("GET {url}")),
            }
        }
    }
}

/// Outcome of a HEAD probe: 2xx is present, 404 absent, anything else an error.
fn availability(status: StatusCode, url: &Url) -> Result<bool> {
    match status {
        s if s.is_success() => Ok(true),
        StatusCode::NOT_FOUND => Ok(false),
        s => Err(anyhow!("HTTP error {s} probing {url}")),
    }
}

impl ReportFetcher for HttpFetcher {
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        let bytes = self.get_with_retry(url).await?;
        debug!(%url, size = bytes.len(), "fetched report");
        Ok(bytes)
    }

    async fn exists(&self, url: &Url) -> Result<bool> {
        let resp = self
            .client
            .head(url.clone())
            .send()
            .await
            .with_context(|| format!("HEAD {url}"))?;
        availability(resp.status(), url)
    }

    async fn fetch_archive(&self, year: i32) -> Result<Vec<u8>> {
        let url = self.archive_url_for(year)?;
        let bytes = self.get_with_retry(&url).await?;
        debug!(%url, size = bytes.len(), "fetched archive");
        Ok(bytes)
    }
}
