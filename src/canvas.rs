// ============================================================================
// RASTER BUFFER — live pixels, the load-time original, and snapshots
// ============================================================================

use image::{RgbaImage, imageops};
use std::fmt;

// ============================================================================
// PIXEL RECT
// ============================================================================

/// Integer rectangle in buffer space.  `x`/`y` is the top-left corner,
/// the rectangle covers `x..x+width` × `y..y+height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanning the whole of a `width` × `height` buffer.
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Build an integer rectangle from a normalized floating-point extent
    /// (`x0`, `y0`, `w`, `h`), clamped to the buffer.  Partially covered
    /// pixels on the far edges are included.
    pub fn from_extent(x0: f32, y0: f32, w: f32, h: f32, buf_w: u32, buf_h: u32) -> Self {
        let clamp_axis = |v: f32, max: u32| -> u32 {
            if v.is_nan() { 0 } else { v.clamp(0.0, max as f32) as u32 }
        };
        let left = clamp_axis(x0.floor(), buf_w);
        let top = clamp_axis(y0.floor(), buf_h);
        let right = clamp_axis((x0 + w).ceil(), buf_w);
        let bottom = clamp_axis((y0 + h).ceil(), buf_h);
        Self::new(
            left,
            top,
            right.saturating_sub(left),
            bottom.saturating_sub(top),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// True when the rectangle lies entirely inside a `width` × `height` buffer.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        (self.x as u64 + self.width as u64) <= width as u64
            && (self.y as u64 + self.height as u64) <= height as u64
    }

    /// Clip to a `width` × `height` buffer.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self::new(
            x,
            y,
            self.right().min(width) - x,
            self.bottom().min(height) - y,
        )
    }

    /// Grow by `pad` pixels on every side, then clip to the buffer.
    pub fn expand(&self, pad: u32, width: u32, height: u32) -> Self {
        let x = self.x.saturating_sub(pad);
        let y = self.y.saturating_sub(pad);
        let right = self.right().saturating_add(pad).min(width);
        let bottom = self.bottom().saturating_add(pad).min(height);
        Self::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y))
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }
}

impl fmt::Display for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@({},{})", self.width, self.height, self.x, self.y)
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    /// The requested rectangle is not fully inside the buffer.
    OutOfBounds { rect: PixelRect, width: u32, height: u32 },
    /// Pixel data of one size was offered where another size is required.
    DimensionMismatch { expected: (u32, u32), found: (u32, u32) },
    /// Raw bytes do not describe a non-empty RGBA image of the stated size.
    InvalidPixelData { width: u32, height: u32, len: usize },
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::OutOfBounds { rect, width, height } => {
                write!(f, "region {} is outside the {}x{} buffer", rect, width, height)
            }
            RasterError::DimensionMismatch { expected, found } => write!(
                f,
                "dimension mismatch: expected {}x{}, found {}x{}",
                expected.0, expected.1, found.0, found.1
            ),
            RasterError::InvalidPixelData { width, height, len } => write!(
                f,
                "invalid pixel data: {} bytes cannot form a {}x{} RGBA buffer",
                len, width, height
            ),
        }
    }
}

impl std::error::Error for RasterError {}

// ============================================================================
// UNDO ENTRY
// ============================================================================

/// Immutable full-buffer copy taken before a mutation.
#[derive(Clone, PartialEq, Eq)]
pub struct UndoEntry {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl UndoEntry {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn memory_size(&self) -> usize {
        self.pixels.len()
    }
}

impl fmt::Debug for UndoEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoEntry")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

// ============================================================================
// RASTER BUFFER
// ============================================================================

/// The pixels being edited plus an untouched copy of what was loaded.
///
/// Dimensions are fixed for the lifetime of the buffer: nothing in the
/// editing pipeline resizes it, so every snapshot can be restored in place.
#[derive(Clone, Debug)]
pub struct RasterBuffer {
    live: RgbaImage,
    original: RgbaImage,
}

impl RasterBuffer {
    /// Establish the live buffer and the original reference from one decoded
    /// image.  The two copies are owned independently.
    pub fn load(image: RgbaImage) -> Result<Self, RasterError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(RasterError::InvalidPixelData {
                width: image.width(),
                height: image.height(),
                len: image.as_raw().len(),
            });
        }
        Ok(Self {
            original: image.clone(),
            live: image,
        })
    }

    /// Like [`load`](Self::load) but from raw row-major RGBA bytes.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RasterError> {
        let len = pixels.len();
        let image = RgbaImage::from_raw(width, height, pixels)
            .filter(|_| len == width as usize * height as usize * 4)
            .ok_or(RasterError::InvalidPixelData { width, height, len })?;
        Self::load(image)
    }

    pub fn width(&self) -> u32 {
        self.live.width()
    }

    pub fn height(&self) -> u32 {
        self.live.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.live.dimensions()
    }

    /// Shorter of the two buffer sides; effect sizes scale with it.
    pub fn short_side(&self) -> u32 {
        self.width().min(self.height())
    }

    pub fn live(&self) -> &RgbaImage {
        &self.live
    }

    pub fn original(&self) -> &RgbaImage {
        &self.original
    }

    /// Copy of the `rect` sub-region.
    pub fn get_region(&self, rect: PixelRect) -> Result<RgbaImage, RasterError> {
        self.check_bounds(rect)?;
        Ok(imageops::crop_imm(&self.live, rect.x, rect.y, rect.width, rect.height).to_image())
    }

    /// Write a `rect`-sized block into the live buffer at `rect`'s origin.
    pub fn set_region(&mut self, rect: PixelRect, block: &RgbaImage) -> Result<(), RasterError> {
        self.check_bounds(rect)?;
        if block.dimensions() != (rect.width, rect.height) {
            return Err(RasterError::DimensionMismatch {
                expected: (rect.width, rect.height),
                found: block.dimensions(),
            });
        }
        if rect.is_empty() {
            return Ok(());
        }

        let stride = self.width() as usize * 4;
        let row_bytes = rect.width as usize * 4;
        let dst: &mut [u8] = &mut self.live;
        for (row, src_row) in block.as_raw().chunks_exact(row_bytes).enumerate() {
            let off = (rect.y as usize + row) * stride + rect.x as usize * 4;
            dst[off..off + row_bytes].copy_from_slice(src_row);
        }
        Ok(())
    }

    /// Full-buffer immutable copy of the live pixels.
    pub fn snapshot(&self) -> UndoEntry {
        UndoEntry {
            width: self.width(),
            height: self.height(),
            pixels: self.live.as_raw().clone(),
        }
    }

    /// Replace the live pixels with a snapshot's bytes.
    pub fn restore(&mut self, entry: &UndoEntry) -> Result<(), RasterError> {
        if (entry.width, entry.height) != self.dimensions() {
            return Err(RasterError::DimensionMismatch {
                expected: self.dimensions(),
                found: (entry.width, entry.height),
            });
        }
        self.live.copy_from_slice(&entry.pixels);
        Ok(())
    }

    /// Replace the live pixels with the load-time original.
    pub fn reset_to_original(&mut self) {
        self.live.copy_from_slice(self.original.as_raw());
    }

    /// True when the live pixels still equal the original.
    pub fn is_pristine(&self) -> bool {
        self.live.as_raw() == self.original.as_raw()
    }

    fn check_bounds(&self, rect: PixelRect) -> Result<(), RasterError> {
        if rect.fits_within(self.width(), self.height()) {
            Ok(())
        } else {
            Err(RasterError::OutOfBounds {
                rect,
                width: self.width(),
                height: self.height(),
            })
        }
    }
}
