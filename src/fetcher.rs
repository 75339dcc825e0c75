//! Authenticated download of rendered map images.

use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use crate::config::Credentials;
use crate::error::{MapImageError, Result};
use crate::models::ImageVariant;

pub const KEY_ID_HEADER: &str = "x-ncp-apigw-api-key-id";
pub const KEY_SECRET_HEADER: &str = "x-ncp-apigw-api-key";

/// `<base>/<thumbnails|detail>/course-<id>.png`
pub fn artifact_path(base: &Path, course_id: u32, variant: ImageVariant) -> PathBuf {
    base.join(variant.dir_name())
        .join(format!("course-{}.png", course_id))
}

/// Creates the per-variant directories under `base` if they are missing.
pub async fn ensure_directories(base: &Path) -> Result<()> {
    for variant in ImageVariant::ALL {
        let dir = base.join(variant.dir_name());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| MapImageError::fs(&dir, e))?;
    }
    Ok(())
}

pub struct ImageFetcher {
    client: Client,
    credentials: Credentials,
}

impl ImageFetcher {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(credentials: Credentials, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| MapImageError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, credentials))
    }

    pub fn with_client(client: Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// GETs `url` and streams a successful body into `dest`, replacing any
    /// existing file. Returns the number of bytes written.
    pub async fn fetch_to_file(&self, url: Url, dest: &Path) -> Result<u64> {
        self.credentials.validate()?;

        let mut resp = self
            .client
            .get(url)
            .header(KEY_ID_HEADER, &self.credentials.key_id)
            .header(KEY_SECRET_HEADER, &self.credentials.key_secret)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown status").to_string()
            } else {
                body
            };
            return Err(MapImageError::ExternalService {
                status: status.as_u16(),
                body,
            });
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MapImageError::fs(parent, e))?;
        }

        let file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| MapImageError::fs(dest, e))?;

        let written = match stream_body(&mut resp, file, dest).await {
            Ok(written) => written,
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(dest).await {
                    warn!("failed to remove partial {}: {}", dest.display(), rm);
                }
                return Err(e);
            }
        };

        debug!("wrote {} bytes to {}", written, dest.display());
        Ok(written)
    }
}

/// Copies the body into `file` chunk by chunk. The file is closed on return.
async fn stream_body(
    resp: &mut reqwest::Response,
    mut file: tokio::fs::File,
    dest: &Path,
) -> Result<u64> {
    let mut written = 0u64;
    while let Some(chunk) = resp.chunk().await? {
        file.write_all(&chunk)
            .await
            .map_err(|e| MapImageError::fs(dest, e))?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| MapImageError::fs(dest, e))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_paths_are_deterministic() {
        let base = Path::new("public/images/courses");
        assert_eq!(
            artifact_path(base, 7, ImageVariant::Thumbnail),
            PathBuf::from("public/images/courses/thumbnails/course-7.png")
        );
        assert_eq!(
            artifact_path(base, 7, ImageVariant::Detail),
            PathBuf::from("public/images/courses/detail/course-7.png")
        );
    }

    #[tokio::test]
    async fn ensure_directories_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        ensure_directories(tmp.path()).await.unwrap();
        ensure_directories(tmp.path()).await.unwrap();
        assert!(tmp.path().join("thumbnails").is_dir());
        assert!(tmp.path().join("detail").is_dir());
    }

    #[tokio::test]
    async fn invalid_credentials_fail_before_any_request() {
        let fetcher = ImageFetcher::new(Credentials::new("id", ""), None).unwrap();
        let tmp = tempfile::tempdir().unwrap();
        // Nothing listens on port 9; a request attempt would be a network error.
        let url = Url::parse("http://127.0.0.1:9/raster").unwrap();
        let err = fetcher
            .fetch_to_file(url, &tmp.path().join("x.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, MapImageError::Config(_)));
    }

    #[tokio::test]
    async fn connection_failure_is_a_network_error() {
        let fetcher = ImageFetcher::new(Credentials::new("id", "secret"), None).unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let url = Url::parse("http://127.0.0.1:9/raster").unwrap();
        let err = fetcher
            .fetch_to_file(url, &tmp.path().join("x.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, MapImageError::Network(_)));
        assert!(!tmp.path().join("x.png").exists());
    }

    /// Serves one connection with `response`, then closes it.
    async fn one_shot_server(response: &'static [u8]) -> Url {
        use tokio::io::AsyncReadExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response).await.unwrap();
            socket.shutdown().await.ok();
        });
        Url::parse(&format!("http://{}/raster", addr)).unwrap()
    }

    #[tokio::test]
    async fn truncated_body_leaves_no_file() {
        let url = one_shot_server(
            b"HTTP/1.1 200 OK\r\ncontent-type: image/png\r\ncontent-length: 1000\r\n\r\nonly-part",
        )
        .await;
        let fetcher = ImageFetcher::new(Credentials::new("id", "secret"), None).unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("thumbnails/course-3.png");
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(&dest, b"previous run").unwrap();

        let err = fetcher.fetch_to_file(url, &dest).await.unwrap_err();

        assert!(matches!(err, MapImageError::Network(_)));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn expired_timeout_is_a_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("http://{}/raster", listener.local_addr().unwrap())).unwrap();
        // Accept and hold the connection without ever answering.
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            std::future::pending::<()>().await;
        });

        let fetcher = ImageFetcher::new(
            Credentials::new("id", "secret"),
            Some(Duration::from_millis(200)),
        )
        .unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let err = tokio::time::timeout(
            Duration::from_secs(10),
            fetcher.fetch_to_file(url, &tmp.path().join("x.png")),
        )
        .await
        .expect("client timeout should fire first")
        .unwrap_err();

        match err {
            MapImageError::Network(e) => assert!(e.is_timeout()),
            other => panic!("expected network error, got {:?}", other),
        }
    }
}
