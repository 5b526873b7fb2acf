//! Core machinery shared by the windowed filters.
//!
//! This module provides:
//! - Replicate-edge coordinate clamping
//! - Row-range partitioning and parallel chunk execution
//! - The sliding row cache each chunk scans with
//! - Kernel weight tables (spatial and structuring-element masks)
//! - The generic windowed draw loop tying them together

use log::trace;
use rayon::prelude::*;

use crate::buffer::{PixelSink, PixelSource};
use crate::color::{PixelSample, Rgba};

use super::{Options, Parallelization};

/// Clamp `v` into `[min, max)`, replicating the edge value.
///
/// Callers guarantee `min < max`.
#[inline]
pub fn clamp_coord(v: i32, min: i32, max: i32) -> i32 {
    if v < min {
        min
    } else if v > max - 1 {
        max - 1
    } else {
        v
    }
}

// ============================================================================
// Parallel row execution
// ============================================================================

/// Split `[start, stop)` into at most `parts` contiguous ranges.
///
/// Every range gets `count / parts` rows and the first `count % parts`
/// ranges one extra, so the ranges cover the input exactly once.
pub fn split_range(start: i32, stop: i32, parts: usize) -> Vec<(i32, i32)> {
    let count = stop - start;
    if count < 1 {
        return Vec::new();
    }

    let parts = parts.clamp(1, count as usize) as i32;
    let div = count / parts;
    let rem = count % parts;

    (0..parts)
        .map(|i| {
            (
                start + i * div + i.min(rem),
                start + (i + 1) * div + (i + 1).min(rem),
            )
        })
        .collect()
}

/// Run `f` over contiguous row chunks of `[min_y, max_y)` concurrently.
///
/// `out` holds `row_len` values per row of the range; each chunk receives
/// the exclusive slice covering its rows, so no two chunks share output.
/// Returns once every chunk has finished.
pub fn parallelize<T, F>(
    parallelization: Parallelization,
    min_y: i32,
    max_y: i32,
    out: &mut [T],
    row_len: usize,
    f: F,
) where
    T: Send,
    F: Fn(i32, i32, &mut [T]) + Sync,
{
    let ranges = split_range(min_y, max_y, parallelization.degree());

    let mut chunks = Vec::with_capacity(ranges.len());
    let mut rest = out;
    for (pmin, pmax) in ranges {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut((pmax - pmin) as usize * row_len);
        chunks.push((pmin, pmax, head));
        rest = tail;
    }

    if chunks.len() == 1 {
        for (pmin, pmax, rows) in chunks {
            f(pmin, pmax, rows);
        }
        return;
    }

    chunks.into_par_iter().for_each(|(pmin, pmax, rows)| {
        trace!("chunk rows {}..{}", pmin, pmax);
        f(pmin, pmax, rows);
    });
}

// ============================================================================
// Sliding row cache
// ============================================================================

/// Exactly `kernel_size` source rows around the current scan row.
///
/// Row `i` at scan position `y` holds source row
/// `clamp(y + i - center, min_y, max_y - 1)`; row `center` is always `y`.
#[derive(Debug, Clone)]
pub struct RowCache {
    rows: Vec<Vec<Rgba<f32>>>,
    center: usize,
    min_y: i32,
    max_y: i32,
}

impl RowCache {
    /// Fill the cache for a chunk starting at `start_y`.
    pub fn new<P: PixelSource + ?Sized>(src: &P, kernel_size: usize, start_y: i32) -> Self {
        let bounds = src.bounds();
        let width = bounds.width() as usize;
        let center = kernel_size / 2;

        let rows = (0..kernel_size)
            .map(|i| {
                let y = clamp_coord(start_y + i as i32 - center as i32, bounds.min_y, bounds.max_y);
                let mut row = vec![Rgba::default(); width];
                src.read_row(y, &mut row);
                row
            })
            .collect();

        Self {
            rows,
            center,
            min_y: bounds.min_y,
            max_y: bounds.max_y,
        }
    }

    /// Move from scan row `y` to `y + 1`: drop the top row and fetch the
    /// next one into its allocation.
    pub fn advance<P: PixelSource + ?Sized>(&mut self, src: &P, y: i32) {
        self.rows.rotate_left(1);
        let next = clamp_coord(y + self.center as i32 + 1, self.min_y, self.max_y);
        if let Some(last) = self.rows.last_mut() {
            src.read_row(next, last);
        }
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[Rgba<f32>] {
        &self.rows[i]
    }

    #[inline]
    pub fn center_row(&self) -> &[Rgba<f32>] {
        &self.rows[self.center]
    }

    pub fn center(&self) -> usize {
        self.center
    }

    pub fn kernel_size(&self) -> usize {
        self.rows.len()
    }
}

// ============================================================================
// Kernel weights
// ============================================================================

/// Offset `(u, v)` from the kernel center with its weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvWeight {
    pub u: i32,
    pub v: i32,
    pub weight: f32,
}

/// Precomputed per-offset weights over a square neighborhood.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KernelWeights {
    size: usize,
    entries: Vec<UvWeight>,
}

impl KernelWeights {
    /// Force a requested kernel size down to the nearest odd size; anything
    /// below 1 becomes 0 (filtering disabled).
    pub fn odd_size(size: i32) -> usize {
        let size = if size % 2 == 0 { size - 1 } else { size };
        size.max(0) as usize
    }

    /// Spatial distance table: weight = `hypot(u, v) / sigma` for every
    /// offset of a `kernel_size` square.
    pub fn spatial(kernel_size: i32, sigma: f32) -> Self {
        let size = Self::odd_size(kernel_size);
        let center = (size / 2) as i32;

        let mut entries = Vec::with_capacity(size * size);
        for i in 0..size as i32 {
            for j in 0..size as i32 {
                let (u, v) = (i - center, j - center);
                entries.push(UvWeight {
                    u,
                    v,
                    weight: (u as f32).hypot(v as f32) / sigma,
                });
            }
        }

        Self { size, entries }
    }

    /// Structuring element from a flat row-major weight list forming a
    /// square of side `floor(sqrt(len))`. Zero weights are dropped.
    pub fn mask(kernel: &[f32]) -> Self {
        let size = Self::odd_size((kernel.len() as f64).sqrt() as i32);
        let center = (size / 2) as i32;

        let mut entries = Vec::new();
        for i in 0..size {
            for j in 0..size {
                let w = kernel.get(j * size + i).copied().unwrap_or(0.0);
                if w != 0.0 {
                    entries.push(UvWeight {
                        u: i as i32 - center,
                        v: j as i32 - center,
                        weight: w,
                    });
                }
            }
        }

        Self { size, entries }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn center(&self) -> usize {
        self.size / 2
    }

    pub fn entries(&self) -> &[UvWeight] {
        &self.entries
    }

    /// True when the kernel cannot affect the image.
    pub fn is_pass_through(&self) -> bool {
        self.size == 0 || self.entries.is_empty()
    }
}

// ============================================================================
// Windowed draw loop
// ============================================================================

/// Scan `src` with a `kernel_size` row cache per chunk and store the value
/// `kernel(cache, x)` for every pixel into `dst`.
///
/// `x` is relative to the source's left edge. Destination coordinates are
/// offset so the source origin maps to the destination origin. Results land
/// in the component the destination projects to canonical color.
pub fn draw_windowed<K>(
    dst: &mut dyn PixelSink,
    src: &dyn PixelSource,
    options: &Options,
    kernel_size: usize,
    kernel: K,
) where
    K: Fn(&RowCache, usize) -> Rgba<f32> + Sync,
{
    let srcb = src.bounds();
    let dstb = dst.bounds();
    let width = srcb.width() as usize;
    if width == 0 || srcb.height() == 0 {
        return;
    }

    let mut out = vec![Rgba::default(); width * srcb.height() as usize];
    parallelize(options.parallelization, srcb.min_y, srcb.max_y, &mut out, width, |pmin, pmax, rows| {
        let mut cache = RowCache::new(src, kernel_size, pmin);
        for (y, out_row) in (pmin..pmax).zip(rows.chunks_exact_mut(width)) {
            for (x, px) in out_row.iter_mut().enumerate() {
                *px = kernel(&cache, x);
            }
            if y < pmax - 1 {
                cache.advance(src, y);
            }
        }
    });

    let domain = dst.domain();
    for (dy, row) in out.chunks_exact(width).enumerate() {
        for (dx, px) in row.iter().enumerate() {
            let sample = PixelSample::from_projection(*px, domain);
            dst.set(dstb.min_x + dx as i32, dstb.min_y + dy as i32, sample);
        }
    }
}
