//! Decodes base64 data URLs posted by the camera and upload widgets.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::config::MediaConfig;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Image is not a base64 data URL")]
    NotDataUrl,

    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Image payload is not valid base64")]
    InvalidPayload,

    #[error("Image payload is empty")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    VoterImage,
    CandidateImage,
}

impl MediaKind {
    const ALL: [Self; 2] = [Self::VoterImage, Self::CandidateImage];

    const fn dir(self) -> &'static str {
        match self {
            Self::VoterImage => "votes",
            Self::CandidateImage => "candidates",
        }
    }
}

/// Parsed `data:image/<ext>;base64,<payload>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn parse(raw: &str) -> Result<Self, MediaError> {
        let (header, payload) = raw
            .trim()
            .split_once(";base64,")
            .ok_or(MediaError::NotDataUrl)?;

        let mime = header
            .strip_prefix("data:")
            .ok_or(MediaError::NotDataUrl)?
            .to_ascii_lowercase();

        let extension = match mime.rsplit('/').next() {
            Some("jpeg" | "jpg") => "jpg",
            Some("png") => "png",
            Some("webp") => "webp",
            Some("gif") => "gif",
            _ => return Err(MediaError::UnsupportedType(mime)),
        }
        .to_string();

        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|_| MediaError::InvalidPayload)?;
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }

        Ok(Self {
            mime,
            extension,
            bytes,
        })
    }
}

pub struct MediaService {
    root: PathBuf,
    inline_images: bool,
}

impl MediaService {
    #[must_use]
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: PathBuf::from(&config.media_path),
            inline_images: config.inline_images,
        }
    }

    /// Validates the data URL and returns the value to store on the record:
    /// a path relative to the media root, or the data URL itself when files
    /// cannot be written.
    pub async fn store(&self, kind: MediaKind, stem: &str, raw: &str) -> Result<String, MediaError> {
        let image = DataUrl::parse(raw)?;

        if self.inline_images {
            return Ok(raw.trim().to_string());
        }

        let relative = format!("{}/{}.{}", kind.dir(), safe_stem(stem), image.extension);
        let path = self.root.join(&relative);

        let written = async {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&path, &image.bytes).await
        }
        .await;

        match written {
            Ok(()) => {
                info!(path = %path.display(), bytes = image.bytes.len(), "Stored image");
                Ok(relative)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Media directory not writable, keeping image inline");
                Ok(raw.trim().to_string())
            }
        }
    }

    /// Deletes the file behind a value returned by `store`. Inline data URLs
    /// and anything outside the media directories are left alone.
    pub async fn remove(&self, stored: &str) {
        let Some(relative) = file_reference(stored) else {
            return;
        };

        let path = self.root.join(relative);
        match fs::remove_file(&path).await {
            Ok(()) => info!(path = %path.display(), "Removed image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove image"),
        }
    }

    pub async fn remove_all(&self, stored: &[String]) {
        for value in stored {
            self.remove(value).await;
        }
    }
}

fn file_reference(stored: &str) -> Option<&str> {
    let (dir, name) = stored.split_once('/')?;
    let known = MediaKind::ALL.iter().any(|kind| kind.dir() == dir);
    let plain = !name.is_empty() && !name.starts_with('.') && safe_stem(name) == name;
    (known && plain).then_some(stored)
}

/// Keeps `[A-Za-z0-9._-]`; everything else becomes `_`.
fn safe_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
