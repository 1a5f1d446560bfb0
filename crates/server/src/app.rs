//! Router construction.

use axum::Router;
use axum::routing::get;
use pagefront_client::ArticleService;
use tower_http::trace::TraceLayer;

use crate::routes;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: ArticleService,
}

impl AppState {
    pub fn new(service: ArticleService) -> Self {
        Self { service }
    }
}

/// Build the HTTP surface: `/`, `/health` and `/api/article`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::root::index))
        .route("/health", get(routes::health::health))
        .route("/api/article", get(routes::article::get_article))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, Response};
    use pagefront_client::{FetchError, FetchRequest, FetchedPage, PageFetcher, ServiceOptions};
    use pagefront_core::CacheStore;
    use tower::ServiceExt;

    use super::*;

    pub const PAGE: &str = r#"<html><head><title>Routed</title>
        <meta property="og:title" content="Routed OG"></head>
        <body><main><p>Routed body.</p></main></body></html>"#;

    /// Fetcher serving [`PAGE`] for every URL.
    #[derive(Debug, Default)]
    pub struct StubFetcher {
        pub calls: AtomicUsize,
    }

    impl StubFetcher {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchedPage { final_url: request.url.clone(), html: PAGE.to_string(), screenshot: None })
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    pub struct TestApp {
        pub dir: tempfile::TempDir,
        pub router: Router,
        pub fetcher: Arc<StubFetcher>,
    }

    pub async fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path().join("cache")).await.unwrap();
        let fetcher = Arc::new(StubFetcher::default());
        let options = ServiceOptions {
            env_defaults: BTreeMap::new(),
            user_scripts_dir: dir.path().join("user_scripts"),
            screenshots_dir: dir.path().join("screenshots"),
        };
        let service = ArticleService::new(store, fetcher.clone(), options);
        TestApp { dir, router: build_router(AppState::new(service)), fetcher }
    }

    pub async fn get(router: &Router, uri: &str) -> (Response<Body>, serde_json::Value) {
        let response =
            router.clone().oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (Response::from_parts(parts, Body::empty()), json)
    }
}
