//! Bilateral filter: edge-preserving smoothing.
//!
//! Every output pixel is a weighted average of its `kernel_size` x
//! `kernel_size` neighborhood. The weight of a neighbor falls off with both
//! its spatial distance from the center and its RGB distance from the
//! center color, so edges between differently colored regions survive.
//!
//! ## Supported Formats
//!
//! Works on any [`PixelSource`]; the array front-end accepts (height, width,
//! 1 | 3 | 4) images. Alpha is never averaged: the output keeps the center
//! pixel's alpha.

use log::debug;
use ndarray::{Array3, ArrayView3};

use crate::buffer::{PixelSink, PixelSource};
use crate::color::Rgba;
use crate::error::Error;

use super::core::{clamp_coord, draw_windowed, KernelWeights, RowCache};
use super::{apply_f32, apply_u8, copy_image, Filter, Options};

/// Bilateral filter parameters.
///
/// `spatial_sigma` and `color_sigma` must be positive; this is not checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bilateral {
    pub kernel_size: i32,
    pub spatial_sigma: f32,
    pub color_sigma: f32,
}

impl Bilateral {
    pub fn new(kernel_size: i32, spatial_sigma: f32, color_sigma: f32) -> Self {
        Self {
            kernel_size,
            spatial_sigma,
            color_sigma,
        }
    }
}

/// Weighted average of the window around `x` in the cache's center row.
///
/// weight = 1 / (exp(d_s^2 / 2) * exp(d_c^2 / 2)) with `d_s` the scaled
/// spatial distance from the table and `d_c` the RGB distance over
/// `color_sigma`.
fn bilateral_pixel(cache: &RowCache, x: usize, weights: &KernelWeights, color_sigma: f64) -> Rgba<f32> {
    let center = cache.center_row()[x];
    let width = cache.center_row().len() as i32;
    let kcenter = cache.center() as i32;

    let (mut r, mut g, mut b) = (0.0f64, 0.0f64, 0.0f64);
    let mut sum_weight = 0.0f64;

    for w in weights.entries() {
        let sx = clamp_coord(x as i32 + w.u, 0, width) as usize;
        let px = cache.row((kcenter + w.v) as usize)[sx];

        let dr = (px.r - center.r) as f64;
        let dg = (px.g - center.g) as f64;
        let db = (px.b - center.b) as f64;
        let image_dist = w.weight as f64;
        let color_dist = (dr * dr + dg * dg + db * db).sqrt() / color_sigma;

        let weight = 1.0 / ((image_dist * image_dist * 0.5).exp() * (color_dist * color_dist * 0.5).exp());

        sum_weight += weight;
        r += weight * px.r as f64;
        g += weight * px.g as f64;
        b += weight * px.b as f64;
    }

    Rgba::new(
        (r / sum_weight) as f32,
        (g / sum_weight) as f32,
        (b / sum_weight) as f32,
        center.a,
    )
}

impl Filter for Bilateral {
    fn draw(&self, dst: &mut dyn PixelSink, src: &dyn PixelSource, options: Option<&Options>) {
        let options = options.copied().unwrap_or_default();
        let srcb = src.bounds();
        if srcb.is_empty() {
            debug!("bilateral: empty source {:?}, nothing to draw", srcb);
            return;
        }

        let weights = KernelWeights::spatial(self.kernel_size, self.spatial_sigma);
        if weights.is_pass_through() {
            debug!("bilateral: kernel size {} disables filtering, copying", self.kernel_size);
            copy_image(dst, src);
            return;
        }

        debug!(
            "bilateral: {}x{} kernel={} sigma_s={} sigma_c={} chunks={}",
            srcb.width(),
            srcb.height(),
            weights.size(),
            self.spatial_sigma,
            self.color_sigma,
            options.parallelization.degree()
        );

        let color_sigma = self.color_sigma as f64;
        draw_windowed(dst, src, &options, weights.size(), |cache, x| {
            bilateral_pixel(cache, x, &weights, color_sigma)
        });
    }
}

// ============================================================================
// Array front-end
// ============================================================================

/// Apply a bilateral filter - f32 version.
///
/// # Arguments
/// * `input` - Image with 1, 3, or 4 channels (height, width, channels), values 0.0-1.0
/// * `kernel_size` - Window side (odd; even sizes round down, < 1 copies)
/// * `spatial_sigma` - Spatial falloff, in pixels
/// * `color_sigma` - Color falloff, in 0.0-1.0 units
///
/// # Returns
/// Filtered image with same channel count
pub fn bilateral_f32(
    input: ArrayView3<f32>,
    kernel_size: i32,
    spatial_sigma: f32,
    color_sigma: f32,
) -> Result<Array3<f32>, Error> {
    apply_f32(&Bilateral::new(kernel_size, spatial_sigma, color_sigma), input)
}

/// Apply a bilateral filter - u8 version.
///
/// `color_sigma` is given in 0-255 units.
pub fn bilateral_u8(
    input: ArrayView3<u8>,
    kernel_size: i32,
    spatial_sigma: f32,
    color_sigma: f32,
) -> Result<Array3<u8>, Error> {
    apply_u8(&Bilateral::new(kernel_size, spatial_sigma, color_sigma / 255.0), input)
}
