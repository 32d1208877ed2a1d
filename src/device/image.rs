//! Evidence images
//!
//! The client does no format or content checks; the backend's validator is
//! the only judge of whether an image is acceptable. All the client does is
//! turn a captured image into a URL the backend can fetch.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::error::EvidenceError;

/// An image the user picked or captured
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedImage {
    /// Already hosted somewhere the backend can reach
    Hosted { url: String },
    /// Raw bytes from the camera or file picker
    Local { file_name: String, bytes: Vec<u8> },
}

impl CapturedImage {
    pub fn hosted(url: impl Into<String>) -> Self {
        CapturedImage::Hosted { url: url.into() }
    }

    pub async fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("evidence")
            .to_string();
        Ok(CapturedImage::Local { file_name, bytes })
    }
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist the image and return the URL to put in the submission.
    async fn store(&self, image: &CapturedImage) -> Result<String, EvidenceError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(alias = "imageUrl")]
    url: String,
}

/// Uploads local images to an HTTP endpoint; hosted images pass through.
pub struct HttpImageStore {
    client: Client,
    upload_url: Option<String>,
    token: Option<String>,
}

impl HttpImageStore {
    pub fn new(client: Client, upload_url: Option<String>) -> Self {
        Self {
            client,
            upload_url,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[async_trait]
impl ImageStore for HttpImageStore {
    async fn store(&self, image: &CapturedImage) -> Result<String, EvidenceError> {
        let (file_name, bytes) = match image {
            CapturedImage::Hosted { url } => return Ok(url.clone()),
            CapturedImage::Local { file_name, bytes } => (file_name, bytes),
        };

        let upload_url = self.upload_url.as_deref().ok_or_else(|| {
            EvidenceError::ImageUpload("no upload endpoint is configured for local images".to_string())
        })?;

        info!("Uploading evidence image {} ({} bytes)", file_name, bytes.len());
        let mut request = self
            .client
            .post(upload_url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .header("X-File-Name", file_name.as_str())
            .body(bytes.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EvidenceError::ImageUpload(e.to_string()))?;
        if !response.status().is_success() {
            return Err(EvidenceError::ImageUpload(format!("upload answered {}", response.status())));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| EvidenceError::ImageUpload(e.to_string()))?;
        Ok(body.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hosted_image_passes_through() {
        let store = HttpImageStore::new(Client::new(), None);
        let url = store.store(&CapturedImage::hosted("https://cdn.example.com/a.jpg")).await.unwrap();
        assert_eq!(url, "https://cdn.example.com/a.jpg");
    }

    #[tokio::test]
    async fn test_local_image_needs_endpoint() {
        let store = HttpImageStore::new(Client::new(), None);
        let image = CapturedImage::Local {
            file_name: "run.jpg".into(),
            bytes: vec![0xFF, 0xD8],
        };
        let err = store.store(&image).await.unwrap_err();
        assert!(matches!(err, EvidenceError::ImageUpload(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_from_file_keeps_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sunrise.png");
        tokio::fs::write(&path, b"not really a png").await.unwrap();

        let image = CapturedImage::from_file(&path).await.unwrap();
        assert_eq!(
            image,
            CapturedImage::Local {
                file_name: "sunrise.png".into(),
                bytes: b"not really a png".to_vec(),
            }
        );
    }
}
