//! Core HTTP client for the JSON price APIs.
//!
//! The [`PriceClient`] struct wraps [`reqwest::Client`] with default headers,
//! an optional bearer API key, and a typed `get` helper that builds query
//! strings and maps error bodies into [`LedgerError`].
//!
//! Backend endpoint methods are added to `PriceClient` via `impl` blocks in
//! the [`crate::api`] module.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use url::Url;

use crate::constants::price_queries::REQUEST_TIMEOUT_SECS;
use crate::error::{ApiErrorBody, LedgerError, Result};

/// HTTP client shared by the price backends.
///
/// The authorization header value is cached at construction time to avoid
/// per-request allocation.
///
/// # Example
///
/// ```no_run
/// use ln_ledger::client::PriceClient;
/// use ln_ledger::constants::COINCAP_BASE_URL;
///
/// # fn main() -> ln_ledger::error::Result<()> {
/// let client = PriceClient::new(COINCAP_BASE_URL)?;
/// // client.get::<MyResponse>("/v2/rates", &[]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PriceClient {
    http: reqwest::Client,
    /// Base URL for REST requests.
    base_url: String,
    /// Pre-built `Authorization` header, if an API key was supplied.
    auth_header: Option<HeaderValue>,
}

impl PriceClient {
    /// Create a new `PriceClient` for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .default_headers(Self::default_headers())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            auth_header: None,
        })
    }

    /// Attach an API key, sent as a bearer token on every request.
    pub fn with_api_key(mut self, api_key: &str) -> Result<Self> {
        let value = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
            LedgerError::InvalidArgument("API key contains invalid header characters".into())
        })?;
        self.auth_header = Some(value);
        Ok(self)
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform a GET request with query parameters and deserialize the JSON
    /// response.
    pub async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<R> {
        let url = self.url(path, query)?;
        tracing::debug!(%url, "GET");

        let mut req = self.http.get(url);
        if let Some(auth) = &self.auth_header {
            req = req.header(header::AUTHORIZATION, auth.clone());
        }
        let resp = req.send().await?;

        self.handle_response(resp).await
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Build the full URL from a path segment and query pairs.
    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let raw = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        let mut url = Url::parse(&raw)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Default headers applied to every request.
    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Read a response, returning either the deserialized body or a
    /// `LedgerError`.
    async fn handle_response<R: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<R> {
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if status.is_success() {
            serde_json::from_slice(&bytes).map_err(LedgerError::Json)
        } else {
            let body = String::from_utf8_lossy(&bytes);
            Err(Self::parse_error_body(status, &body))
        }
    }

    /// Try to parse the API's JSON error structure; fall back to a raw HTTP
    /// status error.
    pub(crate) fn parse_error_body(status: reqwest::StatusCode, body: &str) -> LedgerError {
        if let Ok(api_err) = serde_json::from_str::<ApiErrorBody>(body) {
            if api_err.error.is_some() {
                return LedgerError::Api(api_err);
            }
        }
        LedgerError::HttpStatus {
            status,
            body: body.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_appends_encoded_query() {
        let client = PriceClient::new("https://prices.example/").unwrap();
        let url = client
            .url(
                "v2/assets/bitcoin/history",
                &[("interval", "h1".to_owned()), ("start", "1000".to_owned())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://prices.example/v2/assets/bitcoin/history?interval=h1&start=1000"
        );
    }

    #[test]
    fn error_body_prefers_api_message() {
        let err = PriceClient::parse_error_body(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error":"invalid interval","timestamp":1}"#,
        );
        assert!(matches!(
            err,
            LedgerError::Api(body) if body.error.as_deref() == Some("invalid interval")
        ));

        let err = PriceClient::parse_error_body(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, LedgerError::HttpStatus { status, .. } if status.as_u16() == 502));
    }
}
