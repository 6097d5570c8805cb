// Model file downloader
//
// Streams a URL to a destination file with a bounded redirect chain. A
// failed download never leaves a partial file behind.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::redirect::Policy;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::blender::ArtifactReference;
use crate::errors::BridgeError;

const MAX_REDIRECTS: usize = 5;
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .context("Failed to create download client")?;
        Ok(Self { client })
    }

    /// Fetch `url` into `dest`, following at most five redirects.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<ArtifactReference, BridgeError> {
        debug!(%url, dest = %dest.display(), "Downloading model file");

        let response = self.client.get(url).send().await.map_err(|err| {
            if err.is_redirect() {
                BridgeError::Download("too many redirects".to_string())
            } else {
                BridgeError::Download(err.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Download(format!("HTTP {}", status.as_u16())));
        }

        match self.stream_to_file(response, dest).await {
            Ok(()) => ArtifactReference::verify(dest),
            Err(err) => {
                let _ = tokio::fs::remove_file(dest).await;
                Err(BridgeError::Download(err.to_string()))
            }
        }
    }

    async fn stream_to_file(&self, response: reqwest::Response, dest: &Path) -> Result<()> {
        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create {}", dest.display()))?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Failed to read response body")?;
            file.write_all(&chunk)
                .await
                .context("Failed to write chunk")?;
        }
        file.flush().await.context("Failed to flush file")?;
        Ok(())
    }
}

/// File name derived from the URL path, or a timestamped fallback when the
/// URL has no usable basename.
pub fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|segments| segments.last().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("model_{}", chrono::Utc::now().timestamp_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_download_writes_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/model.obj")
            .with_status(200)
            .with_body("v 0 0 0\n")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("model.obj");
        let artifact = Downloader::new()
            .unwrap()
            .download(&format!("{}/model.obj", server.url()), &dest)
            .await
            .unwrap();
        assert_eq!(artifact.size_bytes, 8);
        assert_eq!(artifact.format, "obj");
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "v 0 0 0\n");
    }

    #[tokio::test]
    async fn test_download_404_leaves_no_file() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.obj")
            .with_status(404)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("missing.obj");
        let err = Downloader::new()
            .unwrap()
            .download(&format!("{}/missing.obj", server.url()), &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Download(_)));
        assert!(err.to_string().contains("404"));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_follows_redirect() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/start")
            .with_status(302)
            .with_header("location", &format!("{}/final.glb", server.url()))
            .create_async()
            .await;
        server
            .mock("GET", "/final.glb")
            .with_status(200)
            .with_body("glTF")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("final.glb");
        let artifact = Downloader::new()
            .unwrap()
            .download(&format!("{}/start", server.url()), &dest)
            .await
            .unwrap();
        assert_eq!(artifact.size_bytes, 4);
    }

    #[tokio::test]
    async fn test_download_gives_up_after_redirect_bound() {
        let mut server = mockito::Server::new_async().await;
        // Each hop redirects to the next; one more hop than the bound.
        for hop in 0..=MAX_REDIRECTS {
            server
                .mock("GET", format!("/hop/{}", hop).as_str())
                .with_status(302)
                .with_header("location", &format!("{}/hop/{}", server.url(), hop + 1))
                .create_async()
                .await;
        }

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("looped.obj");
        let err = Downloader::new()
            .unwrap()
            .download(&format!("{}/hop/0", server.url()), &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Download(_)));
        assert!(err.to_string().contains("too many redirects"));
        assert!(!dest.exists());
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://cdn.example.com/assets/head.glb?sig=abc"),
            "head.glb"
        );
        assert!(filename_from_url("https://cdn.example.com/").starts_with("model_"));
    }
}
