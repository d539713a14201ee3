//! REST client for a realtime JSON database.
//!
//! # Responsibility
//! - Read a document with `GET {base}/{path}.json`.
//! - Overwrite a document with `PUT {base}/{path}.json`.
//!
//! # Invariants
//! - Every request is bounded by the configured timeout.
//! - A `null` response body means no document is stored.
//! - HTTP failures are classified into `StoreErrorKind`, never swallowed.

use super::error::{StoreError, StoreErrorKind, StoreResult};
use super::{normalize_path, DocumentStore};
use crate::config::StoreConfig;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;

const AUTH_QUERY_PARAM: &str = "auth";

/// Blocking REST document store.
pub struct HttpDocumentStore {
    base_url: String,
    auth_token: Option<String>,
    client: Client,
}

impl HttpDocumentStore {
    /// Creates a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    /// - `Rejected` when the URL is not absolute http(s) or the client
    ///   cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> StoreResult<Self> {
        let parsed = Url::parse(base_url.trim()).map_err(|err| {
            StoreError::new(
                StoreErrorKind::Rejected,
                format!("invalid store url `{base_url}`: {err}"),
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StoreError::new(
                StoreErrorKind::Rejected,
                format!("store url must use http or https, got `{}`", parsed.scheme()),
            ));
        }

        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            StoreError::new(
                StoreErrorKind::Rejected,
                format!("failed to build http client: {err}"),
            )
        })?;

        Ok(Self {
            base_url: base_url.trim().to_string(),
            auth_token: None,
            client,
        })
    }

    /// Builds a store from the `[store]` configuration section.
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        let store = Self::new(&config.url, Duration::from_millis(config.timeout_ms))?;
        Ok(match config.auth_token.as_deref() {
            Some(token) if !token.trim().is_empty() => store.with_auth_token(token.trim()),
            _ => store,
        })
    }

    /// Appends `auth=<token>` to every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.query(&[(AUTH_QUERY_PARAM, token.as_str())]),
            None => request,
        }
    }
}

impl DocumentStore for HttpDocumentStore {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    fn read_document(&self, path: &str) -> StoreResult<Option<Value>> {
        let url = document_url(&self.base_url, path);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .map_err(transport_error)?;
        let response = ensure_success(response)?;
        let document: Value = response.json().map_err(|err| {
            StoreError::invalid_data(format!("response from `{url}` is not valid JSON: {err}"))
        })?;

        Ok(match document {
            Value::Null => None,
            other => Some(other),
        })
    }

    fn overwrite_document(&self, path: &str, document: &Value) -> StoreResult<()> {
        let url = document_url(&self.base_url, path);
        let response = self
            .authorize(self.client.put(&url))
            .json(document)
            .send()
            .map_err(transport_error)?;
        ensure_success(response)?;
        Ok(())
    }
}

/// REST URL of the document at `path`; the root path maps to `/.json`.
pub fn document_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}.json",
        base_url.trim().trim_end_matches('/'),
        normalize_path(path)
    )
}

/// Classifies a non-success HTTP status. `None` for 2xx.
pub fn classify_status(status: u16) -> Option<StoreErrorKind> {
    match status {
        200..=299 => None,
        401 | 403 => Some(StoreErrorKind::Permission),
        404 => Some(StoreErrorKind::NotFound),
        408 | 429 | 500..=599 => Some(StoreErrorKind::Transient),
        _ => Some(StoreErrorKind::Rejected),
    }
}

fn ensure_success(response: Response) -> StoreResult<Response> {
    let status = response.status();
    match classify_status(status.as_u16()) {
        None => Ok(response),
        Some(kind) => {
            // The body usually carries `{"error": "..."}`.
            let body = response.text().unwrap_or_default();
            Err(StoreError::new(
                kind,
                format!("store responded {status}: {}", error_detail(&body)),
            ))
        }
    }
}

fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_builder() {
        return StoreError::new(StoreErrorKind::Rejected, err.to_string());
    }
    if let Some(kind) = err.status().and_then(|status| classify_status(status.as_u16())) {
        return StoreError::new(kind, err.to_string());
    }
    // Connect failures, timeouts and dropped bodies are all retryable.
    StoreError::transient(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{classify_status, document_url, error_detail, HttpDocumentStore};
    use crate::config::StoreConfig;
    use crate::store::StoreErrorKind;
    use std::time::Duration;

    #[test]
    fn root_document_url_uses_json_suffix() {
        assert_eq!(
            document_url("https://record-mine-default-rtdb.firebaseio.com/", "/"),
            "https://record-mine-default-rtdb.firebaseio.com/.json"
        );
        assert_eq!(
            document_url("https://db.example.com", "/tracker/records/"),
            "https://db.example.com/tracker/records.json"
        );
    }

    #[test]
    fn status_classification() {
        assert_eq!(classify_status(200), None);
        assert_eq!(classify_status(204), None);
        assert_eq!(classify_status(401), Some(StoreErrorKind::Permission));
        assert_eq!(classify_status(403), Some(StoreErrorKind::Permission));
        assert_eq!(classify_status(404), Some(StoreErrorKind::NotFound));
        assert_eq!(classify_status(429), Some(StoreErrorKind::Transient));
        assert_eq!(classify_status(503), Some(StoreErrorKind::Transient));
        assert_eq!(classify_status(400), Some(StoreErrorKind::Rejected));
    }

    #[test]
    fn error_detail_prefers_error_field() {
        assert_eq!(error_detail(r#"{"error": "Permission denied"}"#), "Permission denied");
        assert_eq!(error_detail("  bad gateway \n"), "bad gateway");
    }

    #[test]
    fn new_rejects_non_http_urls() {
        let err = HttpDocumentStore::new("ftp://example.com", Duration::from_secs(1))
            .err()
            .unwrap();
        assert_eq!(err.kind, StoreErrorKind::Rejected);

        let err = HttpDocumentStore::new("not a url", Duration::from_secs(1))
            .err()
            .unwrap();
        assert_eq!(err.kind, StoreErrorKind::Rejected);
    }

    #[test]
    fn from_config_ignores_blank_token() {
        let config = StoreConfig {
            auth_token: Some("   ".to_string()),
            ..StoreConfig::default()
        };
        let store = HttpDocumentStore::from_config(&config).unwrap();
        assert!(store.auth_token.is_none());
        assert_eq!(store.base_url(), config.url);
    }
}
