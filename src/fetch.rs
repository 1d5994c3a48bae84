use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::CrawlConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Network seam for the pipeline. Implementations return raw response bodies;
/// all interpretation happens in the caller. Tests swap in a stub.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    /// GET an arbitrary URL (sitemap) and return the body.
    async fn fetch_url(&self, url: &str) -> Result<String>;

    /// GET the per-scheme API endpoint for one slug and return the raw body.
    async fn fetch_scheme(&self, slug: &str) -> Result<String>;
}

/// Direct HTTP client carrying the API headers on every request.
pub struct HttpFetcher {
    client: reqwest::Client,
    api_base: String,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.request_headers {
            let header_name: HeaderName = name
                .parse()
                .with_context(|| format!("Invalid header name {name}"))?;
            let header_value: HeaderValue = value
                .parse()
                .with_context(|| format!("Invalid value for header {name}"))?;
            headers.insert(header_name, header_value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
        })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch_url(&self, url: &str) -> Result<String> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;
        Ok(body)
    }

    async fn fetch_scheme(&self, slug: &str) -> Result<String> {
        let url = format!("{}?slug={}&lang=en", self.api_base, slug);
        self.fetch_url(&url).await
    }
}
