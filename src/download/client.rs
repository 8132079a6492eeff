//! HTTP client wrapper for provider API calls.
//!
//! `HttpClient` performs JSON metadata probes and size-capped streaming
//! transfers. Both check the response status before touching the body, and a
//! transfer that fails part-way removes whatever it had written.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// HTTP client for provider requests.
///
/// Created once per downloader and reused for connection pooling.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts (10 s connect, 10 s per request).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, request_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(request_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Fetches `url` and decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` on transport failure, timeout, non-2xx status
    /// (403 becomes `QuotaExceeded`), or an undecodable body.
    #[instrument(skip(self, url), fields(url = %redacted(url)))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, DownloadError> {
        let response = self.send(url).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DownloadError::network(redacted(url), e))
    }

    /// Streams `url` into `dest`, enforcing `max_bytes` on both the declared
    /// `Content-Length` and the running byte count.
    ///
    /// Returns the number of bytes written. On any error after the file was
    /// created, the partial file is removed.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` on transport failure, timeout, non-2xx status,
    /// size-cap violation, or file system errors.
    #[must_use = "the byte count confirms the transfer completed"]
    #[instrument(skip(self, url, dest), fields(url = %redacted(url), dest = %dest.display()))]
    pub async fn download_capped(
        &self,
        url: &Url,
        dest: &Path,
        max_bytes: u64,
    ) -> Result<u64, DownloadError> {
        let response = self.send(url).await?;

        if let Some(declared) = response.content_length()
            && declared > max_bytes
        {
            debug!(declared, max_bytes, "declared length exceeds cap, not streaming");
            return Err(DownloadError::too_large(redacted(url), declared, max_bytes));
        }

        let mut file = File::create(dest)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;

        let stream_result = stream_to_file(&mut file, response, url, dest, max_bytes).await;
        drop(file);

        if stream_result.is_err() {
            debug!(path = %dest.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(dest).await;
        }

        let bytes_written = stream_result?;
        info!(path = %dest.display(), bytes = bytes_written, "transfer complete");
        Ok(bytes_written)
    }

    async fn send(&self, url: &Url) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DownloadError::network(redacted(url), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(redacted(url), status.as_u16()));
        }
        Ok(response)
    }
}

/// Streams response body to file, returning bytes written.
///
/// Extracted so the caller can clean up on error.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &Url,
    file_path: &Path,
    max_bytes: u64,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(redacted(url), e))?;

        bytes_written += chunk.len() as u64;
        if bytes_written > max_bytes {
            return Err(DownloadError::too_large(
                redacted(url),
                bytes_written,
                max_bytes,
            ));
        }

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

/// Renders a URL without its query string so API keys never reach logs or errors.
pub(crate) fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use serde::Deserialize;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    fn url_for(server: &wiremock::MockServer, route: &str) -> Url {
        Url::parse(&format!("{}{route}", server.uri())).unwrap()
    }

    #[test]
    fn test_redacted_strips_query() {
        let url = Url::parse("https://api.test/drive/v3/files/X?key=SECRET&alt=media").unwrap();
        let shown = redacted(&url);
        assert_eq!(shown, "https://api.test/drive/v3/files/X");
        assert!(!shown.contains("SECRET"));
    }

    #[tokio::test]
    async fn test_get_json_success() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/meta"))
            .and(query_param("key", "k"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "a.zip"})),
            )
            .mount(&mock_server)
            .await;

        let mut url = url_for(&mock_server, "/meta");
        url.query_pairs_mut().append_pair("key", "k");
        let named: Named = HttpClient::new().get_json(&url).await.unwrap();
        assert_eq!(named.name, "a.zip");
    }

    #[tokio::test]
    async fn test_get_json_403_is_quota_exceeded() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/meta"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let result = HttpClient::new()
            .get_json::<Named>(&url_for(&mock_server, "/meta"))
            .await;
        assert!(matches!(result, Err(DownloadError::QuotaExceeded { .. })));
    }

    #[tokio::test]
    async fn test_get_json_bad_body_is_error() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/meta"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let result = HttpClient::new()
            .get_json::<Named>(&url_for(&mock_server, "/meta"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_download_capped_writes_file() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/file"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive bytes"))
            .mount(&mock_server)
            .await;

        let dest = temp_dir.path().join("out.zip");
        let bytes = HttpClient::new()
            .download_capped(&url_for(&mock_server, "/file"), &dest, 1_000)
            .await
            .unwrap();
        assert_eq!(bytes, 13);
        assert_eq!(std::fs::read(&dest).unwrap(), b"archive bytes");
    }

    #[tokio::test]
    async fn test_download_capped_rejects_oversized_body_and_cleans_up() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/big"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4096]))
            .mount(&mock_server)
            .await;

        let dest = temp_dir.path().join("big.zip");
        let result = HttpClient::new()
            .download_capped(&url_for(&mock_server, "/big"), &dest, 1_024)
            .await;

        match result {
            Err(DownloadError::TooLarge { limit, .. }) => assert_eq!(limit, 1_024),
            other => panic!("Expected TooLarge error, got: {other:?}"),
        }
        let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert!(entries.is_empty(), "partial file left behind: {entries:?}");
    }

    #[tokio::test]
    async fn test_download_capped_exact_cap_is_accepted() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/exact"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 512]))
            .mount(&mock_server)
            .await;

        let dest = temp_dir.path().join("exact.zip");
        let bytes = HttpClient::new()
            .download_capped(&url_for(&mock_server, "/exact"), &dest, 512)
            .await
            .unwrap();
        assert_eq!(bytes, 512);
    }

    #[tokio::test]
    async fn test_download_capped_404_leaves_no_file() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let dest = temp_dir.path().join("missing.zip");
        let result = HttpClient::new()
            .download_capped(&url_for(&mock_server, "/missing"), &dest, 1_000)
            .await;
        match result {
            Err(DownloadError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_capped_timeout_is_timeout_error() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"data")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let dest = temp_dir.path().join("slow.zip");
        let result = HttpClient::new_with_timeouts(30, 1)
            .download_capped(&url_for(&mock_server, "/slow"), &dest, 1_000)
            .await;
        assert!(
            matches!(result, Err(DownloadError::Timeout { .. })),
            "expected timeout, got {result:?}"
        );
        assert!(!dest.exists());
    }
}
