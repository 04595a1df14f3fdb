//! HTTP client for the conversion backend.
//!
//! [`ApiClient`] implements both network ports, [`FormatRegistry`] and
//! [`ConversionService`], on top of a single `reqwest::Client`, plus the
//! auxiliary read-only endpoints (supported formats, health, statistics).
//!
//! ## Routes
//!
//! ```text
//! GET  {base}/api/format/available-formats/{ext}  → FormatCatalog
//! GET  {base}/api/format/supported-formats        → SupportedFormats
//! POST {base}/api/image/convert  (file, format)   → bytes + Content-Disposition
//! GET  {base}/api/stats/metrics                   → ConversionStats
//! GET  {base}/api/{service}/health                → ServiceHealth
//! ```
//!
//! There is no retry here. Each failure is final for that attempt and is
//! reported as a typed [`ConvertError`]; the workflow decides what the user
//! sees.

use crate::config::ClientConfig;
use crate::error::ConvertError;
use crate::model::{
    ConversionResult, ConversionStats, FormatCatalog, SelectedFile, Service, ServiceHealth,
    SupportedFormats,
};
use crate::pipeline::conversion::{suggested_filename, ConversionService};
use crate::pipeline::discovery::FormatRegistry;
use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest backend error body echoed into an error message.
const MAX_DETAIL_CHARS: usize = 200;

/// reqwest-backed client for every backend route.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a client with its own connection pool.
    pub fn new(config: ClientConfig) -> Result<Self, ConvertError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fileconv/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConvertError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(config, client))
    }

    /// Reuse an existing `reqwest::Client` (shared pool, custom TLS, proxies).
    pub fn with_client(config: ClientConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// All input formats the registry accepts.
    pub async fn supported_formats(&self) -> Result<SupportedFormats, ConvertError> {
        let url = self.endpoint(&["api", "format", "supported-formats"])?;
        self.get_json(url, self.config.discovery_timeout_secs).await
    }

    /// Liveness of one backend service.
    pub async fn health(&self, service: Service) -> Result<ServiceHealth, ConvertError> {
        let url = self.endpoint(&["api", service.prefix(), "health"])?;
        self.get_json(url, self.config.discovery_timeout_secs).await
    }

    /// Aggregate conversion counters from the statistics service.
    pub async fn conversion_stats(&self) -> Result<ConversionStats, ConvertError> {
        let url = self.endpoint(&["api", "stats", "metrics"])?;
        self.get_json(url, self.config.discovery_timeout_secs).await
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ConvertError> {
        let base = &self.config.base_url;
        let invalid = |reason: &str| ConvertError::InvalidBaseUrl {
            base: base.clone(),
            reason: reason.to_string(),
        };

        if base.is_empty() {
            return Err(invalid(
                "an empty base URL has no origin outside a browser; set FILECONV_API_BASE",
            ));
        }

        let mut url = Url::parse(base).map_err(|e| invalid(&e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        timeout_secs: u64,
    ) -> Result<T, ConvertError> {
        debug!("GET {}", url);
        let response = self
            .send(self.client.get(url.clone()), &url, timeout_secs)
            .await?;
        response
            .json::<T>()
            .await
            .map_err(|e| map_body_error(&url, e, timeout_secs))
    }

    /// Send `request` and turn non-2xx statuses into [`ConvertError::HttpStatus`].
    async fn send(
        &self,
        request: RequestBuilder,
        url: &Url,
        timeout_secs: u64,
    ) -> Result<Response, ConvertError> {
        let response = request
            .timeout(Duration::from_secs(timeout_secs))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ConvertError::Timeout {
                        url: url.to_string(),
                        secs: timeout_secs,
                    }
                } else {
                    ConvertError::RequestFailed {
                        url: url.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body, status);
        warn!("{} answered HTTP {}: {}", url, status.as_u16(), detail);
        Err(ConvertError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl FormatRegistry for ApiClient {
    async fn available_formats(&self, extension: &str) -> Result<FormatCatalog, ConvertError> {
        let url = self.endpoint(&["api", "format", "available-formats", extension])?;
        info!("Discovering output formats for '{}'", extension);
        self.get_json(url, self.config.discovery_timeout_secs).await
    }
}

#[async_trait]
impl ConversionService for ApiClient {
    async fn convert(
        &self,
        file: &SelectedFile,
        format: &str,
    ) -> Result<ConversionResult, ConvertError> {
        let url = self.endpoint(&["api", "image", "convert"])?;
        let timeout_secs = self.config.conversion_timeout_secs;

        let mime = mime_guess::from_path(file.name()).first_or_octet_stream();
        let part = Part::stream_with_length(Body::from(file.content().clone()), file.len() as u64)
            .file_name(file.name().to_string())
            .mime_str(mime.essence_str())
            .map_err(|e| ConvertError::Internal(format!("Invalid MIME type '{mime}': {e}")))?;
        let form = Form::new()
            .part("file", part)
            .text("format", format.to_string());

        info!(
            "Converting '{}' ({} bytes) to '{}'",
            file.name(),
            file.len(),
            format
        );
        let response = self
            .send(self.client.post(url.clone()).multipart(form), &url, timeout_secs)
            .await?;

        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let payload = response
            .bytes()
            .await
            .map_err(|e| map_body_error(&url, e, timeout_secs))?;

        let suggested_name = suggested_filename(disposition.as_deref(), format);
        debug!("Received {} bytes as '{}'", payload.len(), suggested_name);
        Ok(ConversionResult {
            payload,
            suggested_name,
        })
    }
}

fn map_body_error(url: &Url, e: reqwest::Error, timeout_secs: u64) -> ConvertError {
    if e.is_timeout() {
        ConvertError::Timeout {
            url: url.to_string(),
            secs: timeout_secs,
        }
    } else if e.is_decode() {
        ConvertError::InvalidResponse {
            url: url.to_string(),
            reason: e.to_string(),
        }
    } else {
        ConvertError::RequestFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

/// Human-readable detail for a non-2xx response.
///
/// The backend reports errors as `{"detail": ...}`; other bodies are echoed
/// (truncated), and an empty body falls back to the status reason phrase.
fn error_detail(body: &str, status: StatusCode) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        match map.get("detail") {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(other) => return other.to_string(),
            None => {}
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string();
    }
    if trimmed.chars().count() > MAX_DETAIL_CHARS {
        let cut: String = trimmed.chars().take(MAX_DETAIL_CHARS - 1).collect();
        format!("{cut}\u{2026}")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = ClientConfig::builder().base_url(base).build().unwrap();
        ApiClient::new(config).unwrap()
    }

    #[test]
    fn endpoint_appends_segments() {
        let c = client("http://localhost:8080");
        let url = c
            .endpoint(&["api", "format", "available-formats", "jpg"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/format/available-formats/jpg"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let c = client("https://example.com/converter/");
        let url = c.endpoint(&["api", "image", "convert"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/converter/api/image/convert");
    }

    #[test]
    fn endpoint_encodes_odd_extensions() {
        let c = client("http://localhost");
        let url = c
            .endpoint(&["api", "format", "available-formats", "a/b?c"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost/api/format/available-formats/a%2Fb%3Fc"
        );
    }

    #[test]
    fn endpoint_with_empty_extension_ends_in_slash() {
        let c = client("http://localhost");
        let url = c
            .endpoint(&["api", "format", "available-formats", ""])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost/api/format/available-formats/");
    }

    #[test]
    fn empty_base_is_rejected_per_request() {
        let c = ApiClient::new(ClientConfig::default()).unwrap();
        let err = c.endpoint(&["api", "image", "convert"]).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidBaseUrl { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn registry_lookup_with_empty_base_fails_without_network() {
        let c = ApiClient::new(ClientConfig::default()).unwrap();
        let err = c.available_formats("png").await.unwrap_err();
        assert!(matches!(err, ConvertError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn detail_from_json_body() {
        let d = error_detail(
            r#"{"detail": "Format 'xyz' is not supported"}"#,
            StatusCode::NOT_FOUND,
        );
        assert_eq!(d, "Format 'xyz' is not supported");
    }

    #[test]
    fn non_string_detail_is_serialised() {
        let d = error_detail(r#"{"detail": [{"loc": ["body", "file"]}]}"#, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(d.contains("loc"), "got: {d}");
    }

    #[test]
    fn empty_body_uses_reason_phrase() {
        assert_eq!(error_detail("", StatusCode::BAD_GATEWAY), "Bad Gateway");
    }

    #[test]
    fn long_plain_body_is_truncated() {
        let body = "x".repeat(500);
        let d = error_detail(&body, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(d.chars().count(), MAX_DETAIL_CHARS);
        assert!(d.ends_with('\u{2026}'));
    }
}
