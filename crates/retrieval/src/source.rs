//! Where document bytes come from.

use futures::StreamExt;
use manualqa_core::{AppError, AppResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const FETCH_TIMEOUT_SECS: u64 = 120;

/// A document location: a local file or an HTTP(S) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Local(PathBuf),
    Remote(String),
}

impl DocumentSource {
    /// Treat `http://` and `https://` strings as remote, anything else as a path.
    pub fn parse(input: &str) -> Self {
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Remote(input.to_string())
        } else {
            Self::Local(PathBuf::from(input))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Path or URL as stored in document metadata. Also the id seed.
    pub fn locator(&self) -> String {
        match self {
            Self::Local(path) => path.display().to_string(),
            Self::Remote(url) => url.clone(),
        }
    }

    /// Last path segment, without query or fragment.
    pub fn filename(&self) -> String {
        let name = match self {
            Self::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
            Self::Remote(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                let after_scheme = path.split_once("://").map_or(path, |(_, rest)| rest);
                after_scheme
                    .split_once('/')
                    .and_then(|(_, p)| p.rsplit('/').find(|s| !s.is_empty()))
                    .map(str::to_string)
            }
        };
        name.unwrap_or_else(|| "document".to_string())
    }

    /// Read the document, failing once it exceeds `max_bytes`.
    pub async fn fetch(&self, max_bytes: u64) -> AppResult<Vec<u8>> {
        match self {
            Self::Local(path) => fetch_local(path, max_bytes).await,
            Self::Remote(url) => fetch_remote(url, max_bytes).await,
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.locator())
    }
}

async fn fetch_local(path: &Path, max_bytes: u64) -> AppResult<Vec<u8>> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| AppError::Fetch(format!("Cannot read {}: {}", path.display(), e)))?;
    if metadata.len() > max_bytes {
        return Err(AppError::Fetch(format!(
            "{} is {} bytes, limit is {}",
            path.display(),
            metadata.len(),
            max_bytes
        )));
    }

    tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Fetch(format!("Cannot read {}: {}", path.display(), e)))
}

#[tracing::instrument(skip(max_bytes))]
async fn fetch_remote(url: &str, max_bytes: u64) -> AppResult<Vec<u8>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()
        .map_err(|e| AppError::Fetch(format!("Failed to create HTTP client: {}", e)))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::Fetch(format!("Request to {} failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Fetch(format!("{} returned {}", url, status)));
    }

    if let Some(length) = response.content_length() {
        if length > max_bytes {
            return Err(AppError::Fetch(format!(
                "{} is {} bytes, limit is {}",
                url, length, max_bytes
            )));
        }
    }

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| AppError::Fetch(format!("Download of {} failed: {}", url, e)))?;
        if body.len() as u64 + chunk.len() as u64 > max_bytes {
            return Err(AppError::Fetch(format!(
                "{} exceeds the {} byte limit",
                url, max_bytes
            )));
        }
        body.extend_from_slice(&chunk);
    }

    tracing::debug!("Fetched {} bytes from {}", body.len(), url);
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one HTTP response on a local port and return its URL.
    async fn serve_once(body: Vec<u8>, send_length: bool) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let header = if send_length {
                format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", body.len())
            } else {
                "HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_string()
            };
            let _ = socket.write_all(header.as_bytes()).await;
            let _ = socket.write_all(&body).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{}/manuals/router.pdf?download=1", addr)
    }

    #[test]
    fn test_parse_and_names() {
        let remote = DocumentSource::parse("https://example.com/docs/oven.pdf?v=2#page=3");
        assert!(remote.is_remote());
        assert_eq!(remote.filename(), "oven.pdf");
        assert_eq!(remote.locator(), "https://example.com/docs/oven.pdf?v=2#page=3");

        let local = DocumentSource::parse("/srv/manuals/dishwasher.pdf");
        assert!(!local.is_remote());
        assert_eq!(local.filename(), "dishwasher.pdf");

        assert_eq!(DocumentSource::parse("https://example.com").filename(), "document");
    }

    #[tokio::test]
    async fn test_fetch_local() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("manual.txt");
        std::fs::write(&path, b"hello").unwrap();

        let source = DocumentSource::Local(path);
        assert_eq!(source.fetch(1024).await.unwrap(), b"hello");
        assert!(matches!(source.fetch(3).await, Err(AppError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_local_missing() {
        let source = DocumentSource::Local(PathBuf::from("/nonexistent/manual.pdf"));
        assert!(matches!(source.fetch(1024).await, Err(AppError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_remote() {
        let url = serve_once(b"remote manual".to_vec(), true).await;
        let bytes = DocumentSource::Remote(url).fetch(1024).await.unwrap();
        assert_eq!(bytes, b"remote manual");
    }

    #[tokio::test]
    async fn test_fetch_remote_declared_too_large() {
        let url = serve_once(vec![b'x'; 64], true).await;
        let result = DocumentSource::Remote(url).fetch(16).await;
        assert!(matches!(result, Err(AppError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_remote_streamed_too_large() {
        let url = serve_once(vec![b'x'; 64], false).await;
        let result = DocumentSource::Remote(url).fetch(16).await;
        assert!(matches!(result, Err(AppError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_remote_unreachable() {
        let result = DocumentSource::Remote("http://127.0.0.1:9/x.pdf".to_string())
            .fetch(16)
            .await;
        assert!(matches!(result, Err(AppError::Fetch(_))));
    }
}
