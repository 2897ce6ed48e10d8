//! Image uploads: decode, bound the width, re-encode as JPEG, store under a
//! content-hash file name in the upload directory.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use thiserror::Error;

use crate::config::UploadConfig;

/// URL prefix the upload directory is served under.
pub const UPLOADS_ROUTE: &str = "/uploads";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("Upload exceeds {0} bytes")]
    TooLarge(usize),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encode(image::ImageError),
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredUpload {
    pub file_name: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
}

/// Re-encoded image ready to be written
#[derive(Debug)]
struct ProcessedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

pub struct UploadService {
    dir: PathBuf,
    max_width: u32,
    jpeg_quality: u8,
    max_bytes: usize,
}

impl UploadService {
    pub fn new(config: &UploadConfig, max_bytes: usize) -> Self {
        Self {
            dir: config.dir.clone(),
            max_width: config.max_width,
            jpeg_quality: config.jpeg_quality,
            max_bytes,
        }
    }

    /// Process and persist one image. Identical output is stored once.
    pub async fn store(&self, data: Vec<u8>) -> Result<StoredUpload, UploadError> {
        if data.is_empty() {
            return Err(UploadError::UnsupportedImage("file is empty".to_string()));
        }
        if data.len() > self.max_bytes {
            return Err(UploadError::TooLarge(self.max_bytes));
        }

        let max_width = self.max_width;
        let quality = self.jpeg_quality;
        let processed = tokio::task::spawn_blocking(move || process_image(&data, max_width, quality))
            .await
            .map_err(|e| UploadError::Io(std::io::Error::other(e)))??;

        let file_name = format!("{}.jpg", content_hash(&processed.bytes));
        let path = self.dir.join(&file_name);

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::create_dir_all(&self.dir).await?;
            // Write then rename so readers never see a partial file
            let temp_path = path.with_extension("tmp");
            tokio::fs::write(&temp_path, &processed.bytes).await?;
            tokio::fs::rename(&temp_path, &path).await?;
            tracing::info!("Stored upload {} ({} bytes)", file_name, processed.bytes.len());
        } else {
            tracing::debug!("Upload {} already stored", file_name);
        }

        Ok(StoredUpload {
            url: format!("{}/{}", UPLOADS_ROUTE, file_name),
            file_name,
            width: processed.width,
            height: processed.height,
            size_bytes: processed.bytes.len(),
        })
    }
}

fn process_image(data: &[u8], max_width: u32, quality: u8) -> Result<ProcessedImage, UploadError> {
    let format = image::guess_format(data)
        .map_err(|_| UploadError::UnsupportedImage("unrecognised image format".to_string()))?;
    let mut img = image::load_from_memory_with_format(data, format)
        .map_err(|e| UploadError::UnsupportedImage(e.to_string()))?;

    if img.width() > max_width {
        img = img.resize(max_width, img.height(), FilterType::Lanczos3);
    }

    let rgb = img.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(&rgb)
        .map_err(UploadError::Encode)?;

    Ok(ProcessedImage {
        width: rgb.width(),
        height: rgb.height(),
        bytes,
    })
}

fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
