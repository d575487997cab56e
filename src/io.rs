// ============================================================================
// IMAGE I/O — decode + bound the source image, encode the result
// ============================================================================

use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ImageEncoder, ImageError, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::canvas::RasterError;
use crate::ops::processing::ProcessingMode;
use crate::{log_info, log_warn};

/// Name used for exports when the source had no name.
pub const FALLBACK_EXPORT_NAME: &str = "processed-image.png";

/// Error type for loading a source image
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Decode(String),
    EmptyImage,
    Raster(RasterError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "I/O error: {}", e),
            LoadError::Decode(e) => write!(f, "Decode error: {}", e),
            LoadError::EmptyImage => write!(f, "Image has no pixels"),
            LoadError::Raster(e) => write!(f, "Buffer error: {}", e),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

impl From<RasterError> for LoadError {
    fn from(e: RasterError) -> Self {
        LoadError::Raster(e)
    }
}

impl From<ImageError> for LoadError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::IoError(io) => LoadError::Io(io),
            other => LoadError::Decode(other.to_string()),
        }
    }
}

/// Error type for writing the processed image
#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Encode(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "I/O error: {}", e),
            ExportError::Encode(e) => write!(f, "Encode error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl From<ImageError> for ExportError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::IoError(io) => ExportError::Io(io),
            other => ExportError::Encode(other.to_string()),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Size after proportionally shrinking so the longer side is at most
/// `max_dimension`.  Sides round down and never drop below one pixel.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dimension || longest == 0 {
        return (width, height);
    }
    let scale = |v: u32| ((v as u64 * max_dimension as u64) / longest as u64).max(1) as u32;
    (scale(width), scale(height))
}

/// Bound a decoded image to `max_dimension`, downscaling if needed.
pub fn prepare_image(img: RgbaImage, max_dimension: u32) -> Result<RgbaImage, LoadError> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(LoadError::EmptyImage);
    }
    let (nw, nh) = fit_within(w, h, max_dimension);
    if (nw, nh) == (w, h) {
        return Ok(img);
    }
    log_info!("Downscaling {}x{} to {}x{}", w, h, nw, nh);
    Ok(imageops::resize(&img, nw, nh, FilterType::Triangle))
}

/// Decode an encoded image held in memory.
pub fn decode_image(bytes: &[u8], max_dimension: u32) -> Result<RgbaImage, LoadError> {
    let img = image::load_from_memory(bytes)?.to_rgba8();
    prepare_image(img, max_dimension)
}

/// Open and decode an image file.
pub fn load_image(path: &Path, max_dimension: u32) -> Result<RgbaImage, LoadError> {
    let img = image::open(path).map_err(|e| {
        log_warn!("Failed to open {}: {}", path.display(), e);
        LoadError::from(e)
    })?;
    log_info!("Loaded {} ({}x{})", path.display(), img.width(), img.height());
    prepare_image(img.to_rgba8(), max_dimension)
}

// ============================================================================
// Export
// ============================================================================

/// Encode as PNG into memory.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(out)
}

/// Encode as PNG and write to `path`.
pub fn export_png(image: &RgbaImage, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    PngEncoder::new(&mut writer).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    log_info!("Exported {}x{} PNG to {}", image.width(), image.height(), path.display());
    Ok(())
}

/// Download name for a processed image: `<basename>-<mode>.png`.
///
/// The last extension is stripped.  A name that is nothing but an extension
/// (`.jpg`) leaves an empty basename, while a leading dot followed by more
/// dots (`.hidden-file.png`) keeps everything before the last one.
pub fn export_filename(original_name: &str, mode: ProcessingMode) -> String {
    if original_name.is_empty() {
        return FALLBACK_EXPORT_NAME.to_string();
    }
    let basename = match original_name.rfind('.') {
        Some(0) => "",
        Some(idx) => &original_name[..idx],
        None => original_name,
    };
    format!("{}-{}.png", basename, mode.slug())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn fit_within_preserves_ratio() {
        assert_eq!(fit_within(3000, 2000, 1920), (1920, 1280));
        assert_eq!(fit_within(2000, 3000, 1920), (1280, 1920));
        assert_eq!(fit_within(1920, 1080, 1920), (1920, 1080));
        assert_eq!(fit_within(800, 600, 1920), (800, 600));
        assert_eq!(fit_within(5000, 1, 1920), (1920, 1));
    }

    #[test]
    fn prepare_image_downscales_oversized() {
        let img = RgbaImage::from_pixel(300, 200, Rgba([10, 20, 30, 255]));
        let out = prepare_image(img, 192).unwrap();
        assert_eq!(out.dimensions(), (192, 128));
        assert_eq!(out.get_pixel(100, 60), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn prepare_image_rejects_empty() {
        assert!(matches!(prepare_image(RgbaImage::new(0, 0), 1920), Err(LoadError::EmptyImage)));
    }

    #[test]
    fn png_round_trips_through_memory() {
        let img = RgbaImage::from_fn(7, 5, |x, y| Rgba([x as u8, y as u8, 99, 200]));
        let bytes = encode_png(&img).unwrap();
        let back = decode_image(&bytes, 1920).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn decode_garbage_is_an_error() {
        assert!(matches!(decode_image(b"not an image", 1920), Err(LoadError::Decode(_))));
    }

    #[test]
    fn export_filename_variants() {
        assert_eq!(export_filename("photo.jpg", ProcessingMode::FillBlack), "photo-blackfill.png");
        assert_eq!(export_filename("image.png", ProcessingMode::FillWhite), "image-whitefill.png");
        assert_eq!(export_filename("document.jpeg", ProcessingMode::Mosaic), "document-mosaic.png");
        assert_eq!(export_filename("picture.webp", ProcessingMode::Blur), "picture-blur.png");
        assert_eq!(
            export_filename("filename_without_extension", ProcessingMode::Mosaic),
            "filename_without_extension-mosaic.png"
        );
        assert_eq!(
            export_filename("file.name.with.dots.jpg", ProcessingMode::FillBlack),
            "file.name.with.dots-blackfill.png"
        );
        assert_eq!(export_filename(".hidden-file.png", ProcessingMode::Blur), ".hidden-file-blur.png");
        assert_eq!(export_filename("", ProcessingMode::Mosaic), "processed-image.png");
        assert_eq!(export_filename(".jpg", ProcessingMode::FillBlack), "-blackfill.png");
        assert_eq!(export_filename("画像ファイル.jpg", ProcessingMode::FillBlack), "画像ファイル-blackfill.png");
    }
}
