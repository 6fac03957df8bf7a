//! Template correlation engines
//!
//! The matcher only needs "best normalized cross-correlation of this template
//! anywhere inside this source". That capability sits behind a trait so the
//! bundled CPU implementation can be swapped for an accelerated one, or a stub
//! in tests.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::integral_image::{integral_image, integral_squared_image};
use rayon::prelude::*;
use tracing::debug;

/// Computes the best-alignment correlation of a template within a source image
#[async_trait]
pub trait CorrelationEngine: Send + Sync {
    /// Prepare the engine for use
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Maximum normalized cross-correlation over every valid offset of
    /// `template` inside `source`, in [-1, 1].
    ///
    /// Buffers are taken by value and dropped when matching finishes.
    async fn match_template(&self, source: GrayImage, template: GrayImage) -> Result<f32>;

    /// Engine name for logging
    fn name(&self) -> &str;
}

/// Exhaustive zero-mean normalized cross-correlation on the CPU
#[derive(Debug, Clone, Copy, Default)]
pub struct NccCorrelator;

impl NccCorrelator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CorrelationEngine for NccCorrelator {
    async fn match_template(&self, source: GrayImage, template: GrayImage) -> Result<f32> {
        tokio::task::spawn_blocking(move || best_ncc(&source, &template))
            .await
            .context("Correlation task panicked")?
    }

    fn name(&self) -> &str {
        "ncc-cpu"
    }
}

/// Best zero-mean normalized cross-correlation score over all offsets.
///
/// Window statistics are O(1) per offset, but the cross term is a full
/// template-sized dot product, so the cost is
/// `(W - w + 1) * (H - h + 1) * w * h` multiply-adds. Equal-size inputs cost
/// one offset; a template around half the source size is the worst case.
pub fn best_ncc(source: &GrayImage, template: &GrayImage) -> Result<f32> {
    let (src_w, src_h) = source.dimensions();
    let (tmpl_w, tmpl_h) = template.dimensions();

    if src_w == 0 || src_h == 0 || tmpl_w == 0 || tmpl_h == 0 {
        bail!("Cannot correlate a zero-area image");
    }
    if tmpl_w > src_w || tmpl_h > src_h {
        bail!(
            "Template ({}x{}) is larger than source ({}x{})",
            tmpl_w,
            tmpl_h,
            src_w,
            src_h
        );
    }

    let count = (tmpl_w as u64 * tmpl_h as u64) as f64;

    let tmpl = template.as_raw();
    let tmpl_mean = tmpl.iter().map(|&v| v as u64).sum::<u64>() as f64 / count;
    let tmpl_energy: f64 = tmpl
        .iter()
        .map(|&v| {
            let d = v as f64 - tmpl_mean;
            d * d
        })
        .sum();

    if tmpl_energy < 1e-10 {
        debug!("Template has no variance; correlation is undefined");
        return Ok(0.0);
    }

    let sums = integral_image::<_, u64>(source);
    let squares = integral_squared_image::<_, u64>(source);
    let src = source.as_raw();
    let stride = src_w as usize;
    let (tw, th) = (tmpl_w as usize, tmpl_h as usize);

    let best = (0..=(src_h - tmpl_h))
        .into_par_iter()
        .map(|y| {
            let mut row_best = f64::NEG_INFINITY;
            for x in 0..=(src_w - tmpl_w) {
                let window_sum = rect_sum(&sums, x, y, tmpl_w, tmpl_h) as f64;
                let window_sq = rect_sum(&squares, x, y, tmpl_w, tmpl_h) as f64;
                let window_energy = window_sq - window_sum * window_sum / count;

                let score = if window_energy < 1e-10 {
                    0.0
                } else {
                    // Exact integer dot product; sum(s * (t - mean_t)) = sum(s * t) - mean_t * sum(s)
                    let mut dot = 0u64;
                    for ty in 0..th {
                        let src_row = &src[(y as usize + ty) * stride + x as usize..][..tw];
                        let tmpl_row = &tmpl[ty * tw..][..tw];
                        dot += src_row
                            .iter()
                            .zip(tmpl_row)
                            .map(|(&s, &t)| s as u32 * t as u32)
                            .sum::<u32>() as u64;
                    }
                    let cross = dot as f64 - tmpl_mean * window_sum;
                    cross / (window_energy * tmpl_energy).sqrt()
                };

                if score > row_best {
                    row_best = score;
                }
            }
            row_best
        })
        .reduce(|| f64::NEG_INFINITY, f64::max);

    Ok(best.clamp(-1.0, 1.0) as f32)
}

/// Sum of the `w` x `h` window at (x, y) from a padded integral image
fn rect_sum(integral: &ImageBuffer<Luma<u64>, Vec<u64>>, x: u32, y: u32, w: u32, h: u32) -> u64 {
    let a = integral.get_pixel(x, y).0[0];
    let b = integral.get_pixel(x + w, y).0[0];
    let c = integral.get_pixel(x, y + h).0[0];
    let d = integral.get_pixel(x + w, y + h).0[0];
    d + a - b - c
}
