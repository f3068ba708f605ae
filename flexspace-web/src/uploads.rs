//! Room photo storage on the local filesystem
//!
//! Files live under `<upload_dir>/rooms/` and are served back at `/uploads/rooms/<file>`.

use flexspace_core::{FlexSpaceError, FlexSpaceResult};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Files must be strictly smaller than this
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// URL prefix the upload directory is mounted at
pub const UPLOADS_MOUNT: &str = "/uploads";

/// A photo accepted from a multipart upload but not yet written
#[derive(Debug)]
pub struct PendingPhoto {
    extension: String,
    bytes: Vec<u8>,
}

impl PendingPhoto {
    /// Check the declared content type and size of one uploaded file
    pub fn new(content_type: Option<&str>, bytes: Vec<u8>) -> FlexSpaceResult<Self> {
        let subtype = content_type
            .and_then(|ct| ct.strip_prefix("image/"))
            .ok_or_else(|| FlexSpaceError::validation("photos", "only image files are allowed"))?;

        if bytes.is_empty() {
            return Err(FlexSpaceError::validation("photos", "empty file"));
        }
        if bytes.len() >= MAX_PHOTO_BYTES {
            return Err(FlexSpaceError::validation(
                "photos",
                "each photo must be smaller than 5 MB",
            ));
        }

        Ok(Self {
            extension: extension_for(subtype),
            bytes,
        })
    }
}

/// `jpeg` becomes `jpg`; structured suffixes such as `svg+xml` keep their base type.
fn extension_for(subtype: &str) -> String {
    let base: String = subtype
        .split(['+', ';'])
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    match base.as_str() {
        "jpeg" | "pjpeg" => "jpg".to_string(),
        "" => "img".to_string(),
        _ => base,
    }
}

#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    pub fn new(upload_root: &Path) -> Self {
        Self {
            dir: upload_root.join("rooms"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write every photo under a fresh name and return their public URLs.
    /// If one write fails, the files already written are removed.
    pub async fn save_all(&self, photos: Vec<PendingPhoto>) -> FlexSpaceResult<Vec<String>> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut urls = Vec::with_capacity(photos.len());
        for photo in photos {
            let file_name = format!("{}.{}", uuid::Uuid::new_v4(), photo.extension);
            if let Err(e) = tokio::fs::write(self.dir.join(&file_name), &photo.bytes).await {
                self.remove_all(&urls).await;
                return Err(e.into());
            }
            debug!("Stored photo {}", file_name);
            urls.push(format!("{}/rooms/{}", UPLOADS_MOUNT, file_name));
        }
        Ok(urls)
    }

    /// Best-effort removal of previously saved photos by URL
    pub async fn remove_all(&self, urls: &[String]) {
        for url in urls {
            let Some(file_name) = url.rsplit('/').next() else {
                continue;
            };
            if let Err(e) = tokio::fs::remove_file(self.dir.join(file_name)).await {
                warn!("Failed to remove photo {}: {}", file_name, e);
            }
        }
    }
}
