//! Morphology filters: Erosion, Dilation, Opening, Closing.
//!
//! The structuring element is a flat, row-major list of weights forming a
//! square of side `floor(sqrt(len))` (rounded down to odd). Zero weights are
//! left out of the neighborhood, so any shape fits inside the square.
//!
//! - **Erosion** - per channel minimum of `sample * weight`
//! - **Dilation** - per channel maximum of the samples (weights only select)
//! - **Opening** - erosion followed by dilation
//! - **Closing** - dilation followed by erosion
//!
//! All four channels, alpha included, are processed. Samples beyond the
//! image edge replicate the edge pixel.

use log::debug;
use ndarray::{Array3, ArrayView3};

use crate::buffer::{PixelSink, PixelSource};
use crate::color::Rgba;
use crate::error::Error;

use super::core::{clamp_coord, draw_windowed, KernelWeights, RowCache};
use super::{apply_f32, apply_u8, copy_image, Filter, GroupFilter, Options};

/// Square all-ones structuring element of side `size`.
pub fn square_kernel(size: usize) -> Vec<f32> {
    vec![1.0; size * size]
}

/// Circular structuring element covering offsets within `radius`.
pub fn disk_kernel(radius: f32) -> Vec<f32> {
    let r_ceil = radius.max(0.0).ceil() as isize;
    let r_sq = radius * radius;
    let side = (2 * r_ceil + 1) as usize;

    let mut kernel = Vec::with_capacity(side * side);
    for dy in -r_ceil..=r_ceil {
        for dx in -r_ceil..=r_ceil {
            let dist_sq = (dx * dx + dy * dy) as f32;
            kernel.push(if dist_sq <= r_sq { 1.0 } else { 0.0 });
        }
    }
    kernel
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Min,
    Max,
}

fn morphology_pixel(cache: &RowCache, x: usize, mask: &KernelWeights, op: Extremum) -> Rgba<f32> {
    let width = cache.center_row().len() as i32;
    let kcenter = cache.center() as i32;

    let mut acc = match op {
        Extremum::Min => Rgba::splat(f32::INFINITY),
        Extremum::Max => Rgba::splat(f32::NEG_INFINITY),
    };

    for w in mask.entries() {
        let sx = clamp_coord(x as i32 + w.u, 0, width) as usize;
        let px = cache.row((kcenter + w.v) as usize)[sx];

        match op {
            Extremum::Min => {
                acc.r = acc.r.min(px.r * w.weight);
                acc.g = acc.g.min(px.g * w.weight);
                acc.b = acc.b.min(px.b * w.weight);
                acc.a = acc.a.min(px.a * w.weight);
            }
            Extremum::Max => {
                acc.r = acc.r.max(px.r);
                acc.g = acc.g.max(px.g);
                acc.b = acc.b.max(px.b);
                acc.a = acc.a.max(px.a);
            }
        }
    }

    acc
}

fn draw_morphology(
    name: &str,
    kernel: &[f32],
    op: Extremum,
    dst: &mut dyn PixelSink,
    src: &dyn PixelSource,
    options: Option<&Options>,
) {
    let options = options.copied().unwrap_or_default();
    let srcb = src.bounds();
    if srcb.is_empty() {
        debug!("{}: empty source {:?}, nothing to draw", name, srcb);
        return;
    }

    let mask = KernelWeights::mask(kernel);
    if mask.is_pass_through() {
        debug!("{}: kernel of {} weights has no effect, copying", name, kernel.len());
        copy_image(dst, src);
        return;
    }

    debug!(
        "{}: {}x{} kernel={} taps={} chunks={}",
        name,
        srcb.width(),
        srcb.height(),
        mask.size(),
        mask.entries().len(),
        options.parallelization.degree()
    );

    draw_windowed(dst, src, &options, mask.size(), |cache, x| morphology_pixel(cache, x, &mask, op));
}

// ============================================================================
// Erosion
// ============================================================================

/// Grayscale/color erosion with a weighted structuring element.
#[derive(Debug, Clone, PartialEq)]
pub struct Erosion {
    kernel: Vec<f32>,
}

impl Erosion {
    pub fn new(kernel: impl Into<Vec<f32>>) -> Self {
        Self { kernel: kernel.into() }
    }

    pub fn kernel(&self) -> &[f32] {
        &self.kernel
    }
}

impl Filter for Erosion {
    fn draw(&self, dst: &mut dyn PixelSink, src: &dyn PixelSource, options: Option<&Options>) {
        draw_morphology("erosion", &self.kernel, Extremum::Min, dst, src, options);
    }
}

// ============================================================================
// Dilation
// ============================================================================

/// Grayscale/color dilation; nonzero kernel weights select the neighborhood.
#[derive(Debug, Clone, PartialEq)]
pub struct Dilation {
    kernel: Vec<f32>,
}

impl Dilation {
    pub fn new(kernel: impl Into<Vec<f32>>) -> Self {
        Self { kernel: kernel.into() }
    }

    pub fn kernel(&self) -> &[f32] {
        &self.kernel
    }
}

impl Filter for Dilation {
    fn draw(&self, dst: &mut dyn PixelSink, src: &dyn PixelSource, options: Option<&Options>) {
        draw_morphology("dilation", &self.kernel, Extremum::Max, dst, src, options);
    }
}

// ============================================================================
// Opening / Closing
// ============================================================================

/// Erosion followed by dilation with the same kernel.
pub fn opening(kernel: &[f32]) -> GroupFilter {
    GroupFilter::new(vec![Box::new(Erosion::new(kernel)), Box::new(Dilation::new(kernel))])
}

/// Dilation followed by erosion with the same kernel.
pub fn closing(kernel: &[f32]) -> GroupFilter {
    GroupFilter::new(vec![Box::new(Dilation::new(kernel)), Box::new(Erosion::new(kernel))])
}

// ============================================================================
// Array front-end
// ============================================================================

/// Apply erosion to image - f32 version.
///
/// # Arguments
/// * `input` - Image with 1, 3, or 4 channels (height, width, channels), values 0.0-1.0
/// * `kernel` - Row-major square structuring element
///
/// # Returns
/// Eroded image with same channel count
pub fn erode_f32(input: ArrayView3<f32>, kernel: &[f32]) -> Result<Array3<f32>, Error> {
    apply_f32(&Erosion::new(kernel), input)
}

/// Apply erosion to image - u8 version.
pub fn erode_u8(input: ArrayView3<u8>, kernel: &[f32]) -> Result<Array3<u8>, Error> {
    apply_u8(&Erosion::new(kernel), input)
}

/// Apply dilation to image - f32 version.
///
/// # Arguments
/// * `input` - Image with 1, 3, or 4 channels (height, width, channels), values 0.0-1.0
/// * `kernel` - Row-major square structuring element
///
/// # Returns
/// Dilated image with same channel count
pub fn dilate_f32(input: ArrayView3<f32>, kernel: &[f32]) -> Result<Array3<f32>, Error> {
    apply_f32(&Dilation::new(kernel), input)
}

/// Apply dilation to image - u8 version.
pub fn dilate_u8(input: ArrayView3<u8>, kernel: &[f32]) -> Result<Array3<u8>, Error> {
    apply_u8(&Dilation::new(kernel), input)
}

/// Apply opening to image - f32 version.
pub fn open_f32(input: ArrayView3<f32>, kernel: &[f32]) -> Result<Array3<f32>, Error> {
    apply_f32(&opening(kernel), input)
}

/// Apply opening to image - u8 version.
pub fn open_u8(input: ArrayView3<u8>, kernel: &[f32]) -> Result<Array3<u8>, Error> {
    apply_u8(&opening(kernel), input)
}

/// Apply closing to image - f32 version.
pub fn close_f32(input: ArrayView3<f32>, kernel: &[f32]) -> Result<Array3<f32>, Error> {
    apply_f32(&closing(kernel), input)
}

/// Apply closing to image - u8 version.
pub fn close_u8(input: ArrayView3<u8>, kernel: &[f32]) -> Result<Array3<u8>, Error> {
    apply_u8(&closing(kernel), input)
}
