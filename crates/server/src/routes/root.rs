//! `GET /`: service description and endpoint documentation.

use axum::Json;
use pagefront_core::{Article, ErrorBody};
use serde::Serialize;

/// Query parameters of `/api/article`: name, default, description.
const ARTICLE_PARAMETERS: &[(&str, &str, &str)] = &[
    ("url", "(required)", "Page to fetch; `https://` is assumed when no scheme is given"),
    ("cache", "false", "Serve a cached result when one exists and has not expired"),
    ("cache-ttl", "3600", "Lifetime in seconds of the cache entry written for this request"),
    ("full-content", "false", "Include the raw page HTML as `fullContent`"),
    ("screenshot", "false", "Capture a full-page PNG and return its `screenshotUri`"),
    ("user-scripts", "", "Comma-separated script file names to run after load, in order"),
    ("user-scripts-timeout", "0", "Milliseconds to wait after the user scripts ran"),
    ("incognito", "true", "Use a fresh browser profile"),
    ("timeout", "60000", "Navigation timeout in milliseconds; 0 means the default"),
    ("wait-until", "domcontentloaded", "Load event to wait for: load, domcontentloaded, networkidle, commit"),
    ("sleep", "0", "Milliseconds to wait after the page loaded"),
    ("resource", "", "Comma-separated resource types to allow (accepted, not enforced)"),
    ("viewport-width", "", "Viewport width in pixels"),
    ("viewport-height", "", "Viewport height in pixels"),
    ("screen-width", "", "Emulated screen width in pixels"),
    ("screen-height", "", "Emulated screen height in pixels"),
    ("device", "Desktop Chrome", "Device profile name"),
    ("scroll-down", "0", "Pixels to scroll down after load"),
    ("ignore-https-errors", "true", "Ignore TLS certificate errors"),
    ("user-agent", "", "User-Agent override"),
    ("locale", "", "Browser locale, e.g. en-US"),
    ("timezone", "", "Timezone id, e.g. Europe/Berlin"),
    ("http-credentials", "", "Basic auth credentials as `username:password`"),
    ("extra-http-headers", "", "Extra request headers as `name1:value1;name2:value2`"),
];

#[derive(Debug, Serialize)]
pub struct ParameterDoc {
    pub name: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EndpointDoc {
    pub path: &'static str,
    pub method: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<schemars::Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_schema: Option<schemars::Schema>,
}

#[derive(Debug, Serialize)]
pub struct ServiceDoc {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<EndpointDoc>,
}

pub async fn index() -> Json<ServiceDoc> {
    Json(service_doc())
}

fn service_doc() -> ServiceDoc {
    let parameters = ARTICLE_PARAMETERS
        .iter()
        .map(|&(name, default, description)| ParameterDoc { name, default, description })
        .collect();

    ServiceDoc {
        service: "pagefront",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            EndpointDoc {
                path: "/api/article",
                method: "GET",
                description: "Fetch a page and return its article content and metadata. \
                              Responses carry `X-Cache: HIT|MISS`.",
                parameters,
                response_schema: Some(schemars::schema_for!(Article)),
                error_schema: Some(schemars::schema_for!(ErrorBody)),
            },
            EndpointDoc {
                path: "/health",
                method: "GET",
                description: "Liveness probe",
                parameters: Vec::new(),
                response_schema: None,
                error_schema: None,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use pagefront_core::params::PARAM_NAMES;

    use super::*;
    use crate::app::test_support::{get, test_app};

    #[test]
    fn test_every_parameter_documented() {
        for name in PARAM_NAMES {
            assert!(ARTICLE_PARAMETERS.iter().any(|(documented, _, _)| documented == name), "undocumented {name}");
        }
    }

    #[tokio::test]
    async fn test_index() {
        let app = test_app().await;
        let (response, body) = get(&app.router, "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["service"], "pagefront");
        assert_eq!(body["endpoints"][0]["path"], "/api/article");
        assert!(body["endpoints"][0]["response_schema"]["properties"]["textContent"].is_object());
        assert_eq!(body["endpoints"][1]["path"], "/health");
    }
}
