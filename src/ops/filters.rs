// ============================================================================
// IMAGE FILTERS — region-limited Gaussian blur
// ============================================================================

use image::{RgbaImage, imageops};
use rayon::prelude::*;

use crate::canvas::PixelRect;

/// Padding needed around a region so the kernel reads real neighbours.
pub fn blur_padding(sigma: f32) -> u32 {
    (sigma * 3.0).ceil().max(0.0) as u32
}

/// Blur `context` and return only the `inner` rectangle (relative to
/// `context`'s origin).  `context` should be the region grown by
/// [`blur_padding`] so edge pixels blend with their true surroundings.
pub fn blur_within(context: &RgbaImage, inner: PixelRect, sigma: f32) -> RgbaImage {
    let inner = inner.clamp_to(context.width(), context.height());
    let blurred = parallel_gaussian_blur(context, sigma);
    imageops::crop_imm(&blurred, inner.x, inner.y, inner.width, inner.height).to_image()
}

// ---------------------------------------------------------------------------
//  Parallel separable Gaussian blur (rayon)
// ---------------------------------------------------------------------------

/// Build a 1-D Gaussian kernel truncated at ceil(3*sigma).
fn build_gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = blur_padding(sigma) as usize;
    if radius == 0 {
        return vec![1.0];
    }
    let len = radius * 2 + 1;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..len)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / s2).exp()
        })
        .collect();
    let inv = 1.0 / kernel.iter().sum::<f32>();
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}

/// Separable Gaussian blur, clamping samples at the image border.
pub fn parallel_gaussian_blur(src: &RgbaImage, sigma: f32) -> RgbaImage {
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 || sigma <= 0.0 {
        return src.clone();
    }

    let kernel = build_gaussian_kernel(sigma);
    let radius = kernel.len() / 2;
    let buf_in: Vec<f32> = src.as_raw().iter().map(|&b| b as f32).collect();
    let stride = w * 4;

    // --- Horizontal pass (parallel by row) ---
    let mut buf_h = vec![0.0f32; w * h * 4];
    buf_h.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &buf_in[y * stride..(y + 1) * stride];
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x + ki).saturating_sub(radius).min(w - 1);
                let px = &row_in[sx * 4..sx * 4 + 4];
                for c in 0..4 {
                    acc[c] += px[c] * kv;
                }
            }
            row_out[x * 4..x * 4 + 4].copy_from_slice(&acc);
        }
    });

    // --- Vertical pass (parallel by row) ---
    let mut dst_raw = vec![0u8; w * h * 4];
    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sy = (y + ki).saturating_sub(radius).min(h - 1);
                let idx = sy * stride + x * 4;
                for c in 0..4 {
                    acc[c] += buf_h[idx + c] * kv;
                }
            }
            for c in 0..4 {
                row_out[x * 4 + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap_or_else(|| src.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let k = build_gaussian_kernel(2.0);
        assert_eq!(k.len(), 13);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!((k[0] - k[12]).abs() < 1e-7);
        assert!(k[6] > k[5]);
    }

    #[test]
    fn uniform_image_is_unchanged() {
        let src = RgbaImage::from_pixel(9, 7, Rgba([90, 120, 200, 255]));
        assert_eq!(parallel_gaussian_blur(&src, 2.0), src);
    }

    #[test]
    fn blur_softens_a_hard_edge() {
        let src = RgbaImage::from_fn(20, 4, |x, _| {
            if x < 10 { Rgba([0, 0, 0, 255]) } else { Rgba([255, 255, 255, 255]) }
        });
        let out = parallel_gaussian_blur(&src, 2.0);
        let left = out.get_pixel(9, 1)[0];
        let right = out.get_pixel(10, 1)[0];
        assert!(left > 0 && left < 128, "left of edge was {left}");
        assert!(right > 128 && right < 255, "right of edge was {right}");
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(19, 0)[0], 255);
    }

    #[test]
    fn blur_within_returns_inner_block_blended_with_context() {
        // Black inner square surrounded by white context.
        let ctx = RgbaImage::from_fn(16, 16, |x, y| {
            if (6..10).contains(&x) && (6..10).contains(&y) {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let block = blur_within(&ctx, PixelRect::new(6, 6, 4, 4), 2.0);
        assert_eq!(block.dimensions(), (4, 4));
        // Corner pixels pick up white from the surrounding context.
        assert!(block.get_pixel(0, 0)[0] > 0);
    }

    #[test]
    fn padding_covers_three_sigma() {
        assert_eq!(blur_padding(2.0), 6);
        assert_eq!(blur_padding(2.5), 8);
        assert_eq!(blur_padding(0.0), 0);
    }
}
