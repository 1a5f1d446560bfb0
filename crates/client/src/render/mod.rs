//! Headless browser fetcher for JS-heavy pages.
//!
//! Launches one Chromium instance per request via chromiumoxide so every
//! request gets a clean profile, then closes it once the page is captured.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::fetch::{
    AuthChallengeResponse, AuthChallengeResponseResponse, ContinueRequestParams, ContinueWithAuthParams,
    EnableParams, EventAuthRequired, EventRequestPaused,
};
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, NavigateParams};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures_util::StreamExt;
use pagefront_core::WaitUntil;
use tokio::task::JoinHandle;
use url::{Origin, Url};

use crate::fetch::{FetchError, FetchRequest, FetchedPage, PageFetcher};

/// Viewport used when only screen dimensions are requested.
const FALLBACK_VIEWPORT: (u32, u32) = (1280, 720);
/// Settle delay after scrolling.
const SCROLL_SETTLE: Duration = Duration::from_millis(500);
/// Quiet period approximating `networkidle` once the document is complete.
const NETWORK_IDLE_QUIET: Duration = Duration::from_millis(500);
const READY_STATE_POLL: Duration = Duration::from_millis(100);

/// Launch options that do not vary per request.
#[derive(Debug, Clone, Default)]
pub struct BrowserFetcherConfig {
    /// Chrome/Chromium binary; auto-detected when `None`.
    pub chrome_executable: Option<PathBuf>,
    /// Pass `--no-sandbox` (needed in most containers).
    pub no_sandbox: bool,
}

/// `PageFetcher` backed by headless Chromium.
#[derive(Debug, Clone, Default)]
pub struct BrowserFetcher {
    config: BrowserFetcherConfig,
}

impl BrowserFetcher {
    pub fn new(config: BrowserFetcherConfig) -> Self {
        Self { config }
    }

    fn browser_config(&self, request: &FetchRequest) -> Result<BrowserConfig, FetchError> {
        let mut builder = BrowserConfig::builder().request_timeout(request.timeout);

        if let Some(bin) = &self.config.chrome_executable {
            builder = builder.chrome_executable(bin);
        }
        if self.config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if request.incognito {
            builder = builder.incognito();
        }
        if !request.ignore_https_errors {
            builder = builder.respect_https_errors();
        }
        if let Some(locale) = &request.locale {
            builder = builder.arg(format!("--lang={locale}"));
        }
        if let Some((width, height)) = request.viewport {
            builder = builder.window_size(width, height);
        }

        builder.build().map_err(FetchError::Launch)
    }

    /// Launch the browser and drive its CDP event loop on a background task.
    async fn launch(&self, request: &FetchRequest) -> Result<(Browser, JoinHandle<()>), FetchError> {
        let (browser, mut handler) = Browser::launch(self.browser_config(request)?)
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        let task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                    break;
                }
            }
        });

        Ok((browser, task))
    }
}

#[async_trait::async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        let start = Instant::now();
        let (mut browser, handler) = self.launch(request).await?;

        let result = capture(&browser, request).await;

        if let Err(e) = browser.close().await {
            tracing::debug!("browser close failed: {e}");
        }
        handler.abort();

        if let Ok(page) = &result {
            tracing::debug!(
                "rendered {} -> {} in {}ms ({} bytes)",
                request.url,
                page.final_url,
                start.elapsed().as_millis(),
                page.html.len()
            );
        }
        result
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}

async fn capture(browser: &Browser, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| FetchError::Launch(e.to_string()))?;

    prepare(&page, request).await?;
    let _auth = answer_auth_challenges(&page, request).await?;
    navigate(&page, request).await?;

    if !request.sleep.is_zero() {
        tokio::time::sleep(request.sleep).await;
    }

    for script in &request.user_scripts {
        page.evaluate(script.source.as_str())
            .await
            .map_err(|e| FetchError::Script { name: script.name.clone(), message: e.to_string() })?;
        tracing::debug!(script = %script.name, "user script evaluated");
    }
    if !request.user_scripts.is_empty() && !request.user_scripts_timeout.is_zero() {
        tokio::time::sleep(request.user_scripts_timeout).await;
    }

    if request.scroll_down > 0 {
        page.evaluate(format!("window.scrollBy(0, {})", request.scroll_down))
            .await
            .map_err(|e| FetchError::Content(format!("scroll failed: {e}")))?;
        tokio::time::sleep(SCROLL_SETTLE).await;
    }

    let html = page.content().await.map_err(|e| FetchError::Content(e.to_string()))?;
    let final_url = page
        .url()
        .await
        .map_err(|e| FetchError::Content(e.to_string()))?
        .unwrap_or_else(|| request.url.clone());

    let screenshot = if request.screenshot {
        let params = ScreenshotParams::builder().format(CaptureScreenshotFormat::Png).full_page(true).build();
        let png = page
            .screenshot(params)
            .await
            .map_err(|e| FetchError::Content(format!("screenshot failed: {e}")))?;
        Some(Bytes::from(png))
    } else {
        None
    };

    page.close().await.ok();
    Ok(FetchedPage { final_url, html, screenshot })
}

/// Apply per-request emulation before navigating.
async fn prepare(page: &Page, request: &FetchRequest) -> Result<(), FetchError> {
    let setup = |e: chromiumoxide::error::CdpError| FetchError::Launch(format!("page setup failed: {e}"));

    if let Some(ua) = &request.user_agent {
        page.set_user_agent(SetUserAgentOverrideParams::new(ua.clone())).await.map_err(setup)?;
    }

    if request.viewport.is_some() || request.screen.is_some() {
        let (width, height) = request.viewport.unwrap_or(FALLBACK_VIEWPORT);
        let mut metrics = SetDeviceMetricsOverrideParams::new(i64::from(width), i64::from(height), 1.0, false);
        if let Some((screen_width, screen_height)) = request.screen {
            metrics.screen_width = Some(i64::from(screen_width));
            metrics.screen_height = Some(i64::from(screen_height));
        }
        page.execute(metrics).await.map_err(setup)?;
    }

    if let Some(tz) = &request.timezone {
        page.execute(SetTimezoneOverrideParams::new(tz.clone())).await.map_err(setup)?;
    }
    if let Some(locale) = &request.locale {
        page.execute(SetLocaleOverrideParams { locale: Some(locale.clone()) }).await.map_err(setup)?;
    }

    if !request.extra_headers.is_empty() {
        let value = serde_json::to_value(&request.extra_headers).map_err(|e| FetchError::Launch(e.to_string()))?;
        page.execute(SetExtraHttpHeadersParams::new(Headers::new(value))).await.map_err(setup)?;
    }

    Ok(())
}

/// Background tasks answering the page's auth challenges; aborted on drop.
struct AuthResponder(Vec<JoinHandle<()>>);

impl Drop for AuthResponder {
    fn drop(&mut self) {
        self.0.iter().for_each(JoinHandle::abort);
    }
}

/// Reply to HTTP auth challenges with the request credentials.
///
/// Only challenges from the target URL's origin receive them; every other
/// challenger gets the browser's default handling. Intercepting auth also
/// pauses each request, so paused requests are continued unchanged.
async fn answer_auth_challenges(page: &Page, request: &FetchRequest) -> Result<Option<AuthResponder>, FetchError> {
    let Some(credentials) = request.http_credentials.clone() else {
        return Ok(None);
    };
    let setup = |e: chromiumoxide::error::CdpError| FetchError::Launch(format!("auth setup failed: {e}"));
    let target = Url::parse(&request.url).map(|u| u.origin()).map_err(|e| FetchError::Launch(e.to_string()))?;

    let mut paused = page.event_listener::<EventRequestPaused>().await.map_err(setup)?;
    let mut challenges = page.event_listener::<EventAuthRequired>().await.map_err(setup)?;
    page.execute(EnableParams { patterns: None, handle_auth_requests: Some(true) }).await.map_err(setup)?;

    let continuer = {
        let page = page.clone();
        tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                if let Err(e) = page.execute(ContinueRequestParams::new(event.request_id.clone())).await {
                    tracing::debug!("continue paused request failed: {e}");
                }
            }
        })
    };
    let responder = {
        let page = page.clone();
        tokio::spawn(async move {
            while let Some(event) = challenges.next().await {
                let response = challenge_response(&target, &event.auth_challenge.origin, &credentials);
                let params = ContinueWithAuthParams::new(event.request_id.clone(), response);
                if let Err(e) = page.execute(params).await {
                    tracing::debug!("auth challenge reply failed: {e}");
                }
            }
        })
    };

    Ok(Some(AuthResponder(vec![continuer, responder])))
}

fn challenge_response(target: &Origin, challenger: &str, (user, pass): &(String, String)) -> AuthChallengeResponse {
    let same_origin = Url::parse(challenger).is_ok_and(|u| u.origin() == *target);
    if same_origin {
        AuthChallengeResponse {
            response: AuthChallengeResponseResponse::ProvideCredentials,
            username: Some(user.clone()),
            password: Some(pass.clone()),
        }
    } else {
        tracing::debug!(challenger, "auth challenge from another origin left unanswered");
        AuthChallengeResponse { response: AuthChallengeResponseResponse::Default, username: None, password: None }
    }
}

async fn navigate(page: &Page, request: &FetchRequest) -> Result<(), FetchError> {
    match request.wait_until {
        WaitUntil::Load | WaitUntil::NetworkIdle => {
            page.goto(request.url.as_str()).await.map_err(|e| FetchError::Navigation(e.to_string()))?;
            if request.wait_until == WaitUntil::NetworkIdle {
                tokio::time::sleep(NETWORK_IDLE_QUIET).await;
            }
        }
        WaitUntil::DomContentLoaded | WaitUntil::Commit => {
            let response = page
                .execute(NavigateParams::new(request.url.clone()))
                .await
                .map_err(|e| FetchError::Navigation(e.to_string()))?;
            if let Some(error) = &response.result.error_text {
                return Err(FetchError::Navigation(error.clone()));
            }
            if request.wait_until == WaitUntil::DomContentLoaded {
                wait_for_ready_state(page, &["interactive", "complete"]).await?;
            }
        }
    }
    Ok(())
}

/// Poll `document.readyState` until it reaches one of `states`.
///
/// Bounded by the caller's timeout.
async fn wait_for_ready_state(page: &Page, states: &[&str]) -> Result<(), FetchError> {
    loop {
        let state: String = page
            .evaluate("document.readyState")
            .await
            .map_err(|e| FetchError::Navigation(e.to_string()))?
            .into_value()
            .map_err(|e| FetchError::Content(e.to_string()))?;
        if states.contains(&state.as_str()) {
            return Ok(());
        }
        tokio::time::sleep(READY_STATE_POLL).await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::fetch::UserScript;

    fn request(pairs: &[(&str, &str)]) -> FetchRequest {
        let raw = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let params = pagefront_core::normalize(&raw, &BTreeMap::new()).unwrap();
        FetchRequest::from_params(&params, vec![])
    }

    fn credentials() -> (String, String) {
        ("user".into(), "pass".into())
    }

    #[test]
    fn test_challenge_from_target_origin_gets_credentials() {
        let target = Url::parse("https://example.com/private/page").unwrap().origin();
        let response = challenge_response(&target, "https://example.com", &credentials());
        assert!(matches!(response.response, AuthChallengeResponseResponse::ProvideCredentials));
        assert_eq!(response.username.as_deref(), Some("user"));
        assert_eq!(response.password.as_deref(), Some("pass"));
    }

    #[test]
    fn test_challenge_from_other_origin_gets_nothing() {
        let target = Url::parse("https://example.com/").unwrap().origin();
        for challenger in ["https://cdn.example.net", "http://example.com", "https://example.com:8443", "not a url"] {
            let response = challenge_response(&target, challenger, &credentials());
            assert!(matches!(response.response, AuthChallengeResponseResponse::Default), "{challenger}");
            assert!(response.username.is_none());
            assert!(response.password.is_none());
        }
    }

    #[test]
    fn test_credentials_stay_out_of_extra_headers() {
        let req = request(&[
            ("url", "https://example.com"),
            ("http-credentials", "user:pass"),
            ("extra-http-headers", "X-A:1"),
        ]);
        assert_eq!(req.extra_headers, BTreeMap::from([("x-a".to_string(), "1".to_string())]));
        assert_eq!(req.http_credentials, Some(credentials()));
    }

    #[test]
    fn test_browser_config_builds() {
        let fetcher = BrowserFetcher::new(BrowserFetcherConfig { no_sandbox: true, ..Default::default() });
        let req = request(&[("url", "https://example.com"), ("viewport-width", "800"), ("viewport-height", "600")]);
        assert!(fetcher.browser_config(&req).is_ok());
    }

    #[tokio::test]
    #[ignore = "requires network and Chrome/Chromium"]
    async fn test_fetch_simple_page() {
        let fetcher = BrowserFetcher::new(BrowserFetcherConfig { no_sandbox: true, ..Default::default() });
        let page = fetcher.fetch(&request(&[("url", "https://example.com")])).await.unwrap();
        assert!(page.html.contains("<html"));
        assert_eq!(page.final_url, "https://example.com/");
        assert!(page.screenshot.is_none());
    }

    #[tokio::test]
    #[ignore = "requires network and Chrome/Chromium"]
    async fn test_fetch_with_script_and_screenshot() {
        let fetcher = BrowserFetcher::new(BrowserFetcherConfig { no_sandbox: true, ..Default::default() });
        let mut req = request(&[("url", "https://example.com"), ("screenshot", "true"), ("wait-until", "load")]);
        req.user_scripts = vec![UserScript {
            name: "mark.js".into(),
            source: "document.body.setAttribute('data-mark', 'yes')".into(),
        }];

        let page = fetcher.fetch(&req).await.unwrap();
        assert!(page.html.contains("data-mark=\"yes\""));
        assert!(page.screenshot.is_some_and(|png| png.starts_with(b"\x89PNG")));
    }

    #[tokio::test]
    #[ignore = "requires Chrome/Chromium"]
    async fn test_failing_script_is_script_error() {
        let fetcher = BrowserFetcher::new(BrowserFetcherConfig { no_sandbox: true, ..Default::default() });
        let mut req = request(&[("url", "https://example.com")]);
        req.url = "about:blank".into();
        req.user_scripts = vec![UserScript { name: "bad.js".into(), source: "throw new Error('boom')".into() }];

        let result = fetcher.fetch(&req).await;
        assert!(matches!(result, Err(FetchError::Script { name, .. }) if name == "bad.js"));
    }
}
