//! `GET /api/article`.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};

use crate::app::AppState;
use crate::error::ApiError;

pub const CACHE_HEADER: &str = "x-cache";
pub const CACHE_WARNING_HEADER: &str = "x-cache-warning";

/// Fetch (or serve from cache) the article for the query parameters.
///
/// `X-Cache` reports `HIT` or `MISS`; `X-Cache-Warning` is set when the
/// result could not be persisted.
pub async fn get_article(
    State(state): State<AppState>, Query(raw): Query<BTreeMap<String, String>>,
) -> Result<Response, ApiError> {
    let outcome = state.service.get_article(&raw).await?;
    tracing::info!(
        url = %outcome.article.url,
        id = %outcome.article.id,
        cache = %outcome.cache,
        "article served"
    );

    let mut response = Json(outcome.article).into_response();
    let headers = response.headers_mut();
    headers.insert(CACHE_HEADER, HeaderValue::from_static(outcome.cache.as_str()));
    if let Some(warning) = outcome.warning
        && let Ok(value) = HeaderValue::from_str(&warning)
    {
        headers.insert(CACHE_WARNING_HEADER, value);
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::app::test_support::{get, test_app};

    #[tokio::test]
    async fn test_article_miss_then_hit() {
        let app = test_app().await;

        let (first, first_body) = get(&app.router, "/api/article?url=https://example.com&cache=true").await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()[CACHE_HEADER], "MISS");
        assert_eq!(first_body["title"], "Routed");
        assert_eq!(first_body["meta"]["og_title"], "Routed OG");
        assert_eq!(first_body["textContent"], "Routed body.");
        assert_eq!(first_body["query"]["cache"], "true");

        let (second, second_body) = get(&app.router, "/api/article?cache=1&url=https://example.com").await;
        assert_eq!(second.headers()[CACHE_HEADER], "HIT");
        assert_eq!(second_body["id"], first_body["id"]);
        assert_eq!(app.fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_article_response_fields() {
        let app = test_app().await;
        let (_, body) = get(&app.router, "/api/article?url=example.com").await;

        for field in [
            "id", "url", "domain", "title", "byline", "excerpt", "siteName", "content", "textContent", "length",
            "lang", "dir", "publishedTime", "fullContent", "date", "query", "meta", "resultUri", "screenshotUri",
        ] {
            assert!(body.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(body["url"], "https://example.com/");
        assert!(body["fullContent"].is_null());
        assert!(body["screenshotUri"].is_null());
    }

    #[tokio::test]
    async fn test_article_missing_url() {
        let app = test_app().await;
        let (response, body) = get(&app.router, "/api/article?cache=true").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"][0]["type"], "missing_parameter");
        assert_eq!(body["detail"][0]["msg"], "Missing required parameter: url");
        assert_eq!(app.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_article_invalid_url() {
        let app = test_app().await;
        let (response, body) = get(&app.router, "/api/article?url=ftp://example.com/file").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"][0]["type"], "invalid_url");
    }

    #[tokio::test]
    async fn test_article_cache_write_failure_sets_warning() {
        let app = test_app().await;
        tokio::fs::remove_dir_all(app.dir.path().join("cache")).await.unwrap();

        let (response, body) = get(&app.router, "/api/article?url=https://example.com").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_HEADER], "MISS");
        assert!(response.headers().contains_key(CACHE_WARNING_HEADER));
        assert_eq!(body["title"], "Routed");
    }
}
