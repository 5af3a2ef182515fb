/// Pixel dimension probing
///
/// Tier 1 reads only the image header. Tier 2 falls back to a full decode for
/// formats whose header probe is unavailable or fails.
use std::io::Cursor;
use std::sync::Arc;

use image::ImageReader;
use tokio::task;

use crate::error::GalleryError;
use crate::gallery::item::Dimensions;
use crate::loader::FileBytes;

/// Probe dimensions off the UI executor
pub async fn probe_dimensions(file: Arc<FileBytes>) -> Result<Dimensions, GalleryError> {
    // Spawn blocking because a tier 2 decode is CPU-bound
    task::spawn_blocking(move || probe_dimensions_blocking(&file.bytes))
        .await
        .map_err(|e| GalleryError::Decode(format!("Task join error: {}", e)))?
}

/// Blocking version of dimension probing
pub fn probe_dimensions_blocking(bytes: &[u8]) -> Result<Dimensions, GalleryError> {
    if let Some(dims) = probe_header(bytes) {
        return Ok(dims);
    }

    // Tier 2: decode the whole image
    let img = image::load_from_memory(bytes).map_err(|e| GalleryError::Decode(e.to_string()))?;
    Dimensions::new(img.width(), img.height())
        .ok_or_else(|| GalleryError::Decode("image has zero width or height".to_string()))
}

/// Tier 1: header-only probe
fn probe_header(bytes: &[u8]) -> Option<Dimensions> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format().ok()?;
    match reader.into_dimensions() {
        Ok((width, height)) => Dimensions::new(width, height),
        Err(e) => {
            log::debug!("header probe failed, falling back to full decode: {}", e);
            None
        }
    }
}
