use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use std::path::Path;
use std::sync::Arc;

use crate::error::{AppError, Result};

/// A decoded RGB image together with the identifier it is reported under.
#[derive(Clone)]
pub struct SourceImage {
    id: String,
    image: Arc<RgbImage>,
}

impl SourceImage {
    pub fn new(id: impl Into<String>, image: RgbImage) -> Self {
        Self {
            id: id.into(),
            image: Arc::new(image),
        }
    }

    /// Decodes an image file, reporting it under its file name.
    pub fn open(path: &Path, resize_max: Option<u32>) -> Result<Self> {
        let id = image_id(path);
        let decoded = image::open(path).map_err(|e| AppError::Decode(id.clone(), e))?;
        Ok(Self::from_dynamic(id, decoded, resize_max))
    }

    /// Decodes an in-memory buffer (format guessed from its contents).
    pub fn from_bytes(id: impl Into<String>, bytes: &[u8], resize_max: Option<u32>) -> Result<Self> {
        let id = id.into();
        let decoded = image::load_from_memory(bytes).map_err(|e| AppError::Decode(id.clone(), e))?;
        Ok(Self::from_dynamic(id, decoded, resize_max))
    }

    pub fn from_dynamic(id: impl Into<String>, image: DynamicImage, resize_max: Option<u32>) -> Self {
        let rgb = image.to_rgb8();
        let rgb = match resize_max {
            Some(max_side) => downscale(rgb, max_side),
            None => rgb,
        };
        Self::new(id, rgb)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn pixel_count(&self) -> usize {
        self.image.width() as usize * self.image.height() as usize
    }
}

/// The identifier an image file is reported under: its file name.
pub fn image_id(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Shrinks the image so its longer side is at most `max_side`, keeping the aspect ratio.
/// Images already within bounds are returned untouched.
pub fn downscale(image: RgbImage, max_side: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    let longer = w.max(h);
    if max_side == 0 || longer <= max_side {
        return image;
    }
    let scale = max_side as f64 / longer as f64;
    let new_w = ((w as f64 * scale) as u32).max(1);
    let new_h = ((h as f64 * scale) as u32).max(1);
    image::imageops::resize(&image, new_w, new_h, FilterType::Lanczos3)
}
