//! Windowed spatial filters.
//!
//! ## Filter contract
//!
//! Every filter implements [`Filter`]:
//! - `bounds(src)` returns the destination rectangle, always
//!   `(0, 0, src.width, src.height)`
//! - `draw(dst, src, options)` renders the filtered source into `dst`
//!
//! Sources are read through [`PixelSource`] and destinations written through
//! [`PixelSink`]; [`crate::buffer::PixelBuffer`] implements both for any
//! domain and backing storage.
//!
//! ## Architecture
//!
//! All windowed filters share one engine (see [`core`]):
//! - **Row chunks** - the source rows are split into contiguous chunks that
//!   run concurrently on rayon
//! - **Sliding row cache** - each chunk keeps exactly `kernel_size` rows and
//!   fetches one new row per scan step
//! - **Replicate-edge clamping** - samples outside the image repeat the edge
//! - **Deterministic** - output does not depend on the parallelization degree
//!
//! ## Array front-end
//!
//! Each filter module also exposes `*_f32` / `*_u8` functions over
//! `ndarray` images of shape (height, width, channels) with 1, 3 or 4
//! channels, mirroring the rest of the crate's array API.

pub mod core;
pub mod bilateral;
pub mod morphology;

use std::sync::atomic::{AtomicUsize, Ordering};

use log::debug;
use ndarray::{Array3, ArrayView3};

use crate::buffer::{PixelSink, PixelSource, RealBuffer, Rect};
use crate::color::Encoding;
use crate::error::Error;

pub use self::bilateral::Bilateral;
pub use self::morphology::{closing, opening, Dilation, Erosion};

// ============================================================================
// Options
// ============================================================================

static DEFAULT_PARALLELIZATION: AtomicUsize = AtomicUsize::new(0);

/// Set the process-wide parallelization degree used by
/// [`Parallelization::Default`]. Zero restores the automatic default (one
/// chunk per rayon worker thread).
pub fn set_default_parallelization(degree: usize) {
    DEFAULT_PARALLELIZATION.store(degree, Ordering::Relaxed);
}

/// Current process-wide parallelization degree.
pub fn default_parallelization() -> usize {
    match DEFAULT_PARALLELIZATION.load(Ordering::Relaxed) {
        0 => rayon::current_num_threads().max(1),
        degree => degree,
    }
}

/// How many row chunks a filter splits its work into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Parallelization {
    /// Use the process-wide default.
    #[default]
    Default,
    /// Single chunk on the calling thread.
    Disabled,
    /// Exactly this many chunks (at least one).
    Degree(usize),
}

impl Parallelization {
    pub fn degree(self) -> usize {
        match self {
            Parallelization::Default => default_parallelization(),
            Parallelization::Disabled => 1,
            Parallelization::Degree(n) => n.max(1),
        }
    }
}

/// Per-invocation drawing options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    pub parallelization: Parallelization,
}

impl Options {
    pub fn with_parallelization(parallelization: Parallelization) -> Self {
        Self { parallelization }
    }
}

// ============================================================================
// Filter trait
// ============================================================================

/// An image-to-image transform.
pub trait Filter: Send + Sync {
    /// Destination bounds for a source with `src_bounds`.
    fn bounds(&self, src_bounds: Rect) -> Rect {
        Rect::from_size(src_bounds.width(), src_bounds.height())
    }

    /// Render the filtered `src` into `dst`. `None` options use the defaults.
    fn draw(&self, dst: &mut dyn PixelSink, src: &dyn PixelSource, options: Option<&Options>);
}

/// Copy `src` into `dst`, mapping the source origin to the destination
/// origin. Used as the pass-through for degenerate kernels.
pub fn copy_image(dst: &mut dyn PixelSink, src: &dyn PixelSource) {
    let srcb = src.bounds();
    let dstb = dst.bounds();
    for y in srcb.min_y..srcb.max_y {
        for x in srcb.min_x..srcb.max_x {
            dst.set(dstb.min_x + x - srcb.min_x, dstb.min_y + y - srcb.min_y, src.get(x, y));
        }
    }
}

/// Filters applied in sequence; every stage but the last renders into a
/// full intermediate buffer.
pub struct GroupFilter {
    filters: Vec<Box<dyn Filter>>,
}

impl GroupFilter {
    pub fn new(filters: Vec<Box<dyn Filter>>) -> Self {
        Self { filters }
    }

    pub fn filters(&self) -> &[Box<dyn Filter>] {
        &self.filters
    }
}

impl Filter for GroupFilter {
    fn draw(&self, dst: &mut dyn PixelSink, src: &dyn PixelSource, options: Option<&Options>) {
        let Some((last, stages)) = self.filters.split_last() else {
            return;
        };

        let mut intermediate: Option<RealBuffer> = None;
        for filter in stages {
            let mut tmp = RealBuffer::new_unbounded(dst.bounds());
            match &intermediate {
                Some(prev) => filter.draw(&mut tmp, prev, options),
                None => filter.draw(&mut tmp, src, options),
            }
            intermediate = Some(tmp);
        }

        match &intermediate {
            Some(prev) => last.draw(dst, prev, options),
            None => last.draw(dst, src, options),
        }
    }
}

// ============================================================================
// Array front-end helpers
// ============================================================================

/// Run `filter` over an (H, W, C) f32 image, values 0.0-1.0.
///
/// Returns an image with the same channel count as the input.
pub fn apply_f32(filter: &dyn Filter, input: ArrayView3<f32>) -> Result<Array3<f32>, Error> {
    let channels = input.dim().2;
    let src = RealBuffer::from_array(input, Encoding::Unit)?;
    let mut dst = RealBuffer::new_bounded(filter.bounds(src.bounds()), Encoding::Unit);
    filter.draw(&mut dst, &src, None);

    let rgba = dst.to_array();
    debug!("array filter: {:?} -> {} channels", rgba.dim(), channels);
    Ok(match channels {
        4 => rgba,
        n => rgba.slice(ndarray::s![.., .., ..n]).to_owned(),
    })
}

/// Run `filter` over an (H, W, C) u8 image.
pub fn apply_u8(filter: &dyn Filter, input: ArrayView3<u8>) -> Result<Array3<u8>, Error> {
    let input = input.mapv(|v| v as f32 / 255.0);
    let output = apply_f32(filter, input.view())?;
    Ok(output.mapv(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
}
