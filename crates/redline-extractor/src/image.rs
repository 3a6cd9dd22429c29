//! Image loading for the vision parser
//!
//! Resolves a local path or an `http(s)://` URL into bytes plus a media type,
//! enforcing the accepted formats and the size cap.

use base64::{engine::general_purpose, Engine as _};
use redline_domain::StageError;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Accepted image extensions, lowercase, without the dot
pub const SUPPORTED_FORMATS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Media type used when the extension says nothing useful
pub const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

/// Bound on a remote fetch when none is configured
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(120);

const FETCH_STAGE: &str = "image_fetch";

/// Image bytes ready to send upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// MIME type derived from the extension
    pub media_type: &'static str,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl LoadedImage {
    /// `data:<media>;base64,<payload>` URL
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Media type for an extension, defaulting to JPEG
pub fn media_type_for(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => DEFAULT_MEDIA_TYPE,
    }
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

fn check_format(extension: &str) -> Result<(), StageError> {
    if SUPPORTED_FORMATS.contains(&extension.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(StageError::UnsupportedFormat {
            format: if extension.is_empty() {
                "(none)".to_string()
            } else {
                format!(".{}", extension)
            },
            supported: SUPPORTED_FORMATS
                .iter()
                .map(|f| format!(".{}", f))
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

fn check_size(bytes: u64, max_bytes: u64) -> Result<(), StageError> {
    if bytes > max_bytes {
        Err(StageError::TooLarge {
            size_mb: bytes as f64 / (1024.0 * 1024.0),
            max_mb: max_bytes / (1024 * 1024),
        })
    } else {
        Ok(())
    }
}

/// Loads images from disk or over HTTP
#[derive(Debug, Clone)]
pub struct ImageLoader {
    client: reqwest::Client,
    max_bytes: u64,
    timeout: Duration,
}

impl ImageLoader {
    /// Loader with a size cap in bytes
    pub fn new(client: reqwest::Client, max_bytes: u64) -> Self {
        Self {
            client,
            max_bytes,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Loader whose HTTP client and remote fetches are bounded by `timeout`
    pub fn with_timeout(max_bytes: u64, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self::new(client, max_bytes).timeout(timeout)
    }

    /// Bound the whole remote fetch, body included
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve `reference` into a validated image
    pub async fn load(&self, reference: &str) -> Result<LoadedImage, StageError> {
        if is_remote(reference) {
            self.load_remote(reference).await
        } else {
            self.load_local(reference).await
        }
    }

    async fn load_local(&self, reference: &str) -> Result<LoadedImage, StageError> {
        let path = Path::new(reference);
        if !path.exists() {
            return Err(StageError::NotFound(reference.to_string()));
        }

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        check_format(extension)?;

        let metadata = tokio::fs::metadata(path).await.map_err(|e| StageError::Unreadable {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?;
        check_size(metadata.len(), self.max_bytes)?;

        let bytes = tokio::fs::read(path).await.map_err(|e| StageError::Unreadable {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?;

        debug!(path = %reference, bytes = bytes.len(), "Loaded local image");
        Ok(LoadedImage {
            media_type: media_type_for(extension),
            bytes,
        })
    }

    async fn load_remote(&self, reference: &str) -> Result<LoadedImage, StageError> {
        let url = reqwest::Url::parse(reference).map_err(|e| StageError::Unreadable {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?;

        // Extensionless URLs are allowed; a wrong extension is not
        let extension = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_string())
            .unwrap_or_default();
        if !extension.is_empty() {
            check_format(&extension)?;
        }

        match tokio::time::timeout(self.timeout, self.fetch(url, reference)).await {
            Ok(result) => result.map(|bytes| LoadedImage {
                media_type: media_type_for(&extension),
                bytes,
            }),
            Err(_) => Err(StageError::Timeout {
                stage: FETCH_STAGE.to_string(),
                message: format!("no response from {} within {:?}", reference, self.timeout),
            }),
        }
    }

    /// Download the body, giving up as soon as it passes the size cap
    async fn fetch(&self, url: reqwest::Url, reference: &str) -> Result<Vec<u8>, StageError> {
        let failed = |e: reqwest::Error| {
            if e.is_timeout() {
                StageError::Timeout {
                    stage: FETCH_STAGE.to_string(),
                    message: e.to_string(),
                }
            } else {
                StageError::Unreadable {
                    reference: reference.to_string(),
                    reason: e.to_string(),
                }
            }
        };

        let mut response = self.client.get(url).send().await.map_err(failed)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StageError::NotFound(reference.to_string()));
        }
        if !response.status().is_success() {
            return Err(StageError::Unreadable {
                reference: reference.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        if let Some(length) = response.content_length() {
            check_size(length, self.max_bytes)?;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(failed)? {
            bytes.extend_from_slice(&chunk);
            check_size(bytes.len() as u64, self.max_bytes)?;
        }

        debug!(url = %reference, bytes = bytes.len(), "Fetched remote image");
        Ok(bytes)
    }
}
