//! Plain HTTP fetcher.
//!
//! Honours timeout, user agent, locale (`Accept-Language`), extra headers,
//! basic-auth credentials and certificate leniency. It cannot run user
//! scripts or take screenshots; both are logged and skipped.

use std::time::Instant;

use reqwest::{Client, header};

use super::{FetchError, FetchRequest, FetchedPage, PageFetcher, millis};

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// User agent used when the request does not set one (default: "pagefront/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: u64,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("pagefront/", env!("CARGO_PKG_VERSION")).to_string(),
            max_bytes: 5 * 1024 * 1024,
            max_redirects: 5,
        }
    }
}

/// `PageFetcher` backed by reqwest.
///
/// A client is built per request since certificate handling and timeouts
/// are request parameters.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    config: HttpFetcherConfig,
}

impl HttpFetcher {
    pub fn new(config: HttpFetcherConfig) -> Self {
        Self { config }
    }

    fn client(&self, request: &FetchRequest) -> Result<Client, FetchError> {
        Client::builder()
            .user_agent(request.user_agent.as_deref().unwrap_or(&self.config.user_agent))
            .timeout(request.timeout)
            .redirect(reqwest::redirect::Policy::limited(self.config.max_redirects))
            .danger_accept_invalid_certs(request.ignore_https_errors)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| FetchError::Launch(format!("failed to build HTTP client: {e}")))
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        let start = Instant::now();

        if !request.user_scripts.is_empty() {
            tracing::warn!(count = request.user_scripts.len(), "http fetcher cannot run user scripts, skipping");
        }
        if request.screenshot {
            tracing::warn!("http fetcher cannot take screenshots, skipping");
        }

        let client = self.client(request)?;
        let mut builder = client
            .get(&request.url)
            .header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8");

        if let Some(locale) = &request.locale {
            builder = builder.header(header::ACCEPT_LANGUAGE, locale);
        }
        for (name, value) in &request.extra_headers {
            builder = builder.header(name, value);
        }
        if let Some((user, pass)) = &request.http_credentials {
            builder = builder.basic_auth(user, Some(pass));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(millis(request.timeout))
            } else {
                FetchError::Navigation(format!("network error: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(len) = response.content_length()
            && len > self.config.max_bytes
        {
            return Err(FetchError::TooLarge(len, self.config.max_bytes));
        }

        let final_url = response.url().to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Content(format!("failed to read response: {e}")))?;

        if bytes.len() as u64 > self.config.max_bytes {
            return Err(FetchError::TooLarge(bytes.len() as u64, self.config.max_bytes));
        }

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            request.url,
            final_url,
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(FetchedPage { final_url, html: String::from_utf8_lossy(&bytes).into_owned(), screenshot: None })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
