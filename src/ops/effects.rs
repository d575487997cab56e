// ============================================================================
// REGION EFFECTS — solid fill, block mosaic, selection outline preview
// ============================================================================
//
// Kernels here operate on a region block extracted from the live buffer and
// return the replacement block.  They never read from their own output, so
// a cell filled early in a pass cannot bleed into a later cell's sample.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::canvas::PixelRect;

pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

// --- Fill ---

/// Opaque `width` × `height` block of one color.
pub fn fill_core(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

// --- Mosaic ---

/// Block mosaic over a whole region block.
///
/// The block is partitioned into `block_size` squares from its top-left
/// corner; cells on the right and bottom edges are clipped.  Each cell takes
/// the color of the pixel half a block in from its corner, pulled back
/// inside the region when the clipped cell is too small to contain it.
/// Cells are written fully opaque whatever the sample's alpha.
pub fn mosaic_core(region: &RgbaImage, block_size: u32) -> RgbaImage {
    let bs = block_size.max(1);
    let w = region.width();
    let h = region.height();
    if w == 0 || h == 0 {
        return region.clone();
    }

    let src_raw = region.as_raw();
    let stride = w as usize * 4;
    let mut dst_raw = vec![0u8; src_raw.len()];

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let sy = mosaic_sample(y as u32, bs, h) as usize;
            let row_in = &src_raw[sy * stride..(sy + 1) * stride];
            for x in 0..w {
                let sx = mosaic_sample(x, bs, w) as usize * 4;
                let pi = x as usize * 4;
                row_out[pi..pi + 3].copy_from_slice(&row_in[sx..sx + 3]);
                row_out[pi + 3] = 255;
            }
        });

    RgbaImage::from_raw(w, h, dst_raw).unwrap_or_else(|| region.clone())
}

/// Sample coordinate for the cell containing `v` along an axis of `len`.
#[inline]
fn mosaic_sample(v: u32, bs: u32, len: u32) -> u32 {
    let cell = (v / bs) * bs;
    (cell + bs / 2).min(len - 1)
}

// --- Selection outline ---

/// Composite a dashed rectangle outline over a copy of `base`.
///
/// The stroke is centred on the rectangle's edges like a canvas
/// `strokeRect`; dashes run `dash` pixels on, `dash` off along each edge.
/// A `dash` of zero draws a solid line.
pub fn selection_outline(
    base: &RgbaImage,
    rect: PixelRect,
    stroke: u32,
    dash: u32,
    color: Rgba<u8>,
) -> RgbaImage {
    let mut out = base.clone();
    let (w, h) = (base.width() as i64, base.height() as i64);
    if stroke == 0 || w == 0 || h == 0 {
        return out;
    }

    let lo = (stroke / 2) as i64;
    let hi = stroke as i64 - lo;
    let (l, t) = (rect.x as i64, rect.y as i64);
    let (r, b) = (rect.right() as i64, rect.bottom() as i64);
    let near = |v: i64, edge: i64| v >= edge - lo && v < edge + hi;
    let dashed = |pos: i64| dash == 0 || pos.rem_euclid(2 * dash as i64) < dash as i64;

    let stride = w as usize * 4;
    let raw: &mut [u8] = &mut out;
    raw.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i64;
            let in_span_y = y >= t - lo && y < b + hi;
            let horizontal = near(y, t) || near(y, b);
            for x in 0..w {
                let in_span_x = x >= l - lo && x < r + hi;
                let on_h = horizontal && in_span_x;
                let on_v = (near(x, l) || near(x, r)) && in_span_y;
                let visible = (on_h && dashed(x - l)) || (on_v && dashed(y - t));
                if visible {
                    let pi = x as usize * 4;
                    row[pi..pi + 4].copy_from_slice(&color.0);
                }
            }
        });

    out
}
