/// Profile photo upload
///
/// # Pipeline
///
/// ```text
/// validate (filename → extension → size)     nothing touches the disk before this
///   → write original bytes under a generated name
///   → normalize on a blocking thread, overwrite
///   → point the user's photo_url at the new file
///   → best-effort removal of the previous photo
/// ```
///
/// Any failure after the first write removes the file again, so a rejected
/// upload never leaves an orphan behind.
///
/// # Normalization
///
/// Decoded images are converted to 8-bit RGB (8-bit grayscale is kept as is),
/// downscaled with Lanczos3 to fit in 400×400 when larger, and re-encoded as
/// baseline JPEG at quality 85. Stored photos are therefore always JPEG, even
/// when the generated name keeps the original extension.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, ColorType, DynamicImage, GenericImageView};
use sqlx::PgPool;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::models::user::User;

/// Extensions accepted for profile photos (compared lowercase)
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Bounding box for stored photos
pub const MAX_DIMENSION: u32 = 400;

pub const JPEG_QUALITY: u8 = 85;

/// Path prefix under which photos are served
pub const PHOTO_URL_PREFIX: &str = "/api/upload/profile-photo";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file name provided")]
    MissingFilename,

    #[error("File type not allowed: {0:?}. Allowed: jpg, jpeg, png, gif, webp")]
    UnsupportedExtension(String),

    #[error("File too large: {size} bytes (max 5 MB)")]
    TooLarge { size: usize },

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Photo not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Io(#[from] io::Error),
}

impl From<UploadError> for ServiceError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::MissingFilename => ServiceError::field("file", err.to_string()),
            UploadError::UnsupportedExtension(_) => ServiceError::field("file", err.to_string()),
            UploadError::TooLarge { .. } => ServiceError::field("file", err.to_string()),
            UploadError::InvalidImage(_) => ServiceError::field("file", err.to_string()),
            UploadError::NotFound => ServiceError::NotFound(err.to_string()),
            UploadError::Io(e) => ServiceError::Internal(format!("Photo storage failed: {}", e)),
        }
    }
}

/// Checks an incoming upload, returning its lowercase extension
///
/// Order matters: filename, then extension, then size.
pub fn validate_upload(filename: Option<&str>, size: usize) -> Result<String, UploadError> {
    let filename = filename
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or(UploadError::MissingFilename)?;

    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadError::UnsupportedExtension(extension));
    }

    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge { size });
    }

    Ok(extension)
}

/// `YYYYMMDD_HHMMSS_<8 hex>.<ext>`
pub fn generate_filename(extension: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        &suffix[..8],
        extension
    )
}

/// Retrieval path recorded on the user
pub fn photo_url(filename: &str) -> String {
    format!("{}/{}", PHOTO_URL_PREFIX, filename)
}

/// Stored filename referenced by a photo URL
pub fn filename_from_url(url: &str) -> Option<&str> {
    url.strip_prefix(PHOTO_URL_PREFIX)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|name| is_safe_filename(name))
}

/// Rejects anything that could leave the upload directory
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && !name.contains('\0')
}

/// Decodes, converts, downsizes and re-encodes an image as JPEG
pub fn normalize_image(bytes: &[u8]) -> Result<Vec<u8>, UploadError> {
    let image = image::load_from_memory(bytes).map_err(|e| UploadError::InvalidImage(e.to_string()))?;

    let image = if image.width() > MAX_DIMENSION || image.height() > MAX_DIMENSION {
        image.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
    } else {
        image
    };

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);

    match image {
        DynamicImage::ImageLuma8(gray) => {
            encoder.encode(gray.as_raw(), gray.width(), gray.height(), ColorType::L8)
        }
        other => {
            let rgb = other.to_rgb8();
            encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        }
    }
    .map_err(|e| UploadError::InvalidImage(format!("encode failed: {}", e)))?;

    Ok(out)
}

/// Directory holding processed photos
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf, UploadError> {
        if !is_safe_filename(filename) {
            return Err(UploadError::NotFound);
        }
        Ok(self.dir.join(filename))
    }

    /// Validates, writes and normalizes an upload
    ///
    /// Returns the generated filename. On failure nothing is left on disk.
    pub async fn store(&self, original_name: Option<&str>, bytes: Vec<u8>) -> Result<String, UploadError> {
        let extension = validate_upload(original_name, bytes.len())?;
        let filename = generate_filename(&extension);
        let path = self.dir.join(&filename);

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, &bytes).await?;
        debug!(filename = %filename, size = bytes.len(), "Photo written");

        let normalized = tokio::task::spawn_blocking(move || normalize_image(&bytes))
            .await
            .map_err(|e| UploadError::InvalidImage(format!("processing task failed: {}", e)))
            .and_then(|result| result);

        let written = match normalized {
            Ok(jpeg) => tokio::fs::write(&path, jpeg).await.map_err(UploadError::from),
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            self.remove_quietly(&filename).await;
            return Err(e);
        }

        Ok(filename)
    }

    /// Reads a stored photo
    pub async fn read(&self, filename: &str) -> Result<Vec<u8>, UploadError> {
        let path = self.path_for(filename)?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(UploadError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes a stored photo; a missing file is not an error
    pub async fn remove(&self, filename: &str) -> Result<(), UploadError> {
        let path = self.path_for(filename)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(filename = %filename, "Photo already absent from disk");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_quietly(&self, filename: &str) {
        if let Err(e) = self.remove(filename).await {
            warn!(filename = %filename, error = %e, "Failed to remove photo file");
        }
    }
}

/// Stores a new profile photo and points the user at it
pub async fn upload_profile_photo(
    pool: &PgPool,
    store: &PhotoStore,
    user: &User,
    original_name: Option<&str>,
    bytes: Vec<u8>,
) -> ServiceResult<User> {
    let filename = store.store(original_name, bytes).await?;

    let updated = match User::set_photo_url(pool, user.id, Some(&photo_url(&filename))).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            store.remove_quietly(&filename).await;
            return Err(ServiceError::NotFound("User not found".to_string()));
        }
        Err(e) => {
            error!(user_id = %user.id, error = %e, "Failed to record profile photo");
            store.remove_quietly(&filename).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = user.photo_url.as_deref().and_then(filename_from_url) {
        if previous != filename {
            store.remove_quietly(previous).await;
        }
    }

    info!(user_id = %user.id, filename = %filename, "Profile photo updated");
    Ok(updated)
}

/// Removes the user's profile photo file and reference
pub async fn delete_profile_photo(pool: &PgPool, store: &PhotoStore, user: &User) -> ServiceResult<User> {
    let Some(url) = user.photo_url.as_deref() else {
        return Err(ServiceError::NotFound("No profile photo".to_string()));
    };

    match filename_from_url(url) {
        Some(filename) => {
            if let Err(e) = store.remove(filename).await {
                warn!(user_id = %user.id, error = %e, "Could not delete photo file, clearing reference anyway");
            }
        }
        None => warn!(user_id = %user.id, url = %url, "Photo reference outside upload directory"),
    }

    let updated = User::set_photo_url(pool, user.id, None)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

    info!(user_id = %user.id, "Profile photo removed");
    Ok(updated)
}
