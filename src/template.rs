use std::path::Path;

use image::{GrayImage, ImageReader, imageops};

/// Longer side of a stored template never exceeds this.
pub const MAX_TEMPLATE_EDGE: u32 = 450;

/// File extensions accepted by the template picker.
pub const TEMPLATE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to open template file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode template image: {0}")]
    Decode(#[from] image::ImageError),
}

/// The reference image the live feed is matched against.
///
/// Stored grayscale, downscaled on load so its longer side is at most
/// [`MAX_TEMPLATE_EDGE`] pixels. Replaced wholesale on each successful load.
pub struct Template {
    image: GrayImage,
}

impl Template {
    /// Decodes a raster file into a grayscale template.
    ///
    /// On failure the caller keeps whatever template it already had.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Template, TemplateError> {
        let img = ImageReader::open(path.as_ref())?.decode()?;
        let gray = img.to_luma8();
        log::info!(
            "loaded template {} ({}x{})",
            path.as_ref().display(),
            gray.width(),
            gray.height()
        );
        Ok(Template::from_gray(gray))
    }

    /// Wraps an already-decoded grayscale image, applying the size cap.
    pub fn from_gray(gray: GrayImage) -> Template {
        Template {
            image: shrink_to_limit(gray, MAX_TEMPLATE_EDGE),
        }
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

fn shrink_to_limit(gray: GrayImage, limit: u32) -> GrayImage {
    let (w, h) = gray.dimensions();
    let long_edge = w.max(h);
    if long_edge <= limit {
        return gray;
    }
    // The long edge lands exactly on the limit; the short edge rounds.
    let (new_w, new_h) = if w >= h {
        (limit, ((h * limit) as f32 / w as f32).round().max(1.0) as u32)
    } else {
        (((w * limit) as f32 / h as f32).round().max(1.0) as u32, limit)
    };
    log::debug!("resizing template {}x{} -> {}x{}", w, h, new_w, new_h);
    imageops::resize(&gray, new_w, new_h, imageops::FilterType::Triangle)
}
