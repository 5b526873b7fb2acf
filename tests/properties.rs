//! Cross-module properties of the windowed filters.
//!
//! Random inputs come from a small deterministic LCG so failures reproduce.

use ndarray::Array3;

use windowed_filters::buffer::{
    Complex64Buffer, ComplexBuffer, PixelSource, Real64Buffer, RealBuffer, Rect,
};
use windowed_filters::color::{
    Complex32, Complex64, ComplexPart, Domain, Encoding, PixelSample, Rgba, Rgba16,
};
use windowed_filters::filters::bilateral::bilateral_f32;
use windowed_filters::filters::core::{split_range, RowCache};
use windowed_filters::filters::morphology::{disk_kernel, erode_u8, open_f32, square_kernel};
use windowed_filters::filters::{
    closing, opening, set_default_parallelization, Bilateral, Dilation, Erosion, Filter, Options,
    Parallelization,
};
use windowed_filters::Error;

// ============================================================================
// Helpers
// ============================================================================

/// MINSTD linear congruential generator.
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        SimpleRng {
            state: seed.wrapping_add(1),
        }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(48271).wrapping_add(1) % 2147483647;
        self.state as u32
    }

    fn next_f32(&mut self) -> f32 {
        (self.next_u32() as f32) / (2147483647.0f32)
    }
}

fn random_image(rect: Rect, seed: u64) -> RealBuffer {
    let mut rng = SimpleRng::new(seed);
    let mut buffer = RealBuffer::new_bounded(rect, Encoding::Unit);
    for y in rect.min_y..rect.max_y {
        for x in rect.min_x..rect.max_x {
            let rgba = Rgba::new(rng.next_f32(), rng.next_f32(), rng.next_f32(), rng.next_f32());
            buffer.set(x, y, PixelSample::Bounded(rgba, Encoding::Unit));
        }
    }
    buffer
}

fn uniform_image(rect: Rect, rgba: Rgba<f32>) -> RealBuffer {
    let mut buffer = RealBuffer::new_bounded(rect, Encoding::Unit);
    for y in rect.min_y..rect.max_y {
        for x in rect.min_x..rect.max_x {
            buffer.set(x, y, PixelSample::Bounded(rgba, Encoding::Unit));
        }
    }
    buffer
}

fn run(filter: &dyn Filter, src: &dyn PixelSource, options: Option<&Options>) -> RealBuffer {
    let mut dst = RealBuffer::new_unbounded(filter.bounds(src.bounds()));
    filter.draw(&mut dst, src, options);
    dst
}

fn bits(buffer: &RealBuffer) -> Vec<u32> {
    buffer.pix().iter().map(|v| v.to_bits()).collect()
}

fn all_filters() -> Vec<(&'static str, Box<dyn Filter>)> {
    let kernel = square_kernel(3);
    let filters: Vec<(&'static str, Box<dyn Filter>)> = vec![
        ("bilateral", Box::new(Bilateral::new(5, 2.0, 0.25)) as Box<dyn Filter>),
        ("erosion", Box::new(Erosion::new(kernel.clone())) as Box<dyn Filter>),
        ("dilation", Box::new(Dilation::new(disk_kernel(2.0))) as Box<dyn Filter>),
        ("opening", Box::new(opening(&kernel)) as Box<dyn Filter>),
        ("closing", Box::new(closing(&kernel)) as Box<dyn Filter>),
    ];
    filters
}

// ============================================================================
// Degenerate kernels and dimensions
// ============================================================================

#[test]
fn test_kernel_below_one_is_identity() {
    let src = random_image(Rect::from_size(6, 4), 1);
    let identities: Vec<Box<dyn Filter>> = vec![
        Box::new(Bilateral::new(0, 1.0, 1.0)),
        Box::new(Bilateral::new(-7, 1.0, 1.0)),
        Box::new(Erosion::new(Vec::new())),
        Box::new(Dilation::new(Vec::new())),
    ];
    for filter in &identities {
        let dst = run(filter.as_ref(), &src, None);
        assert_eq!(dst.pix(), src.pix());
    }
}

#[test]
fn test_output_dimensions_match_source() {
    for (w, h) in [(1, 1), (7, 3), (2, 9), (16, 5)] {
        let src = random_image(Rect::new(-3, 11, -3 + w, 11 + h), (w * h) as u64);
        for (name, filter) in all_filters() {
            let dst = run(filter.as_ref(), &src, None);
            assert_eq!(dst.bounds(), Rect::from_size(w, h), "{}", name);
        }
    }
}

// ============================================================================
// Morphology ordering
// ============================================================================

#[test]
fn test_opening_below_dilation_closing_above_erosion() {
    let src = random_image(Rect::from_size(13, 11), 7);
    for kernel in [square_kernel(3), square_kernel(5), disk_kernel(2.0)] {
        let opened = run(&opening(&kernel), &src, None);
        let dilated = run(&Dilation::new(kernel.clone()), &src, None);
        let closed = run(&closing(&kernel), &src, None);
        let eroded = run(&Erosion::new(kernel.clone()), &src, None);

        assert!(opened.pix().iter().zip(dilated.pix()).all(|(o, d)| o <= d));
        assert!(closed.pix().iter().zip(eroded.pix()).all(|(c, e)| c >= e));
    }
}

#[test]
fn test_uniform_gray_erosion_equals_dilation_equals_source() {
    let src = uniform_image(Rect::from_size(5, 5), Rgba::new(0.5, 0.5, 0.5, 1.0));
    let kernel = square_kernel(3);
    let eroded = run(&Erosion::new(kernel.clone()), &src, None);
    let dilated = run(&Dilation::new(kernel), &src, None);
    assert_eq!(eroded.pix(), src.pix());
    assert_eq!(dilated.pix(), src.pix());
}

#[test]
fn test_single_bright_pixel_erodes_to_black() {
    let mut src = uniform_image(Rect::from_size(5, 5), Rgba::new(0.0, 0.0, 0.0, 1.0));
    src.set(2, 2, PixelSample::Bounded(Rgba::splat(1.0), Encoding::Unit));

    let dst = run(&Erosion::new(square_kernel(3)), &src, None);
    for y in 0..5 {
        for x in 0..5 {
            let px = dst.get(x, y).to_unbounded();
            assert_eq!((px.r, px.g, px.b), (0.0, 0.0, 0.0), "({}, {})", x, y);
        }
    }
}

// ============================================================================
// Bilateral limit
// ============================================================================

/// Replicate-edge box blur of the RGB channels, keeping the center alpha.
fn box_blur(src: &RealBuffer, size: i32) -> Vec<Rgba<f32>> {
    let b = src.bounds();
    let r = size / 2;
    let mut out = Vec::new();
    for y in b.min_y..b.max_y {
        for x in b.min_x..b.max_x {
            let (mut sr, mut sg, mut sb) = (0.0f64, 0.0f64, 0.0f64);
            for dy in -r..=r {
                for dx in -r..=r {
                    let sx = (x + dx).clamp(b.min_x, b.max_x - 1);
                    let sy = (y + dy).clamp(b.min_y, b.max_y - 1);
                    let px = src.get(sx, sy).to_unbounded();
                    sr += px.r as f64;
                    sg += px.g as f64;
                    sb += px.b as f64;
                }
            }
            let n = (size * size) as f64;
            let center = src.get(x, y).to_unbounded();
            out.push(Rgba::new((sr / n) as f32, (sg / n) as f32, (sb / n) as f32, center.a));
        }
    }
    out
}

#[test]
fn test_bilateral_with_huge_sigmas_is_box_blur() {
    let src = random_image(Rect::from_size(9, 7), 42);
    for size in [3, 5] {
        let dst = run(&Bilateral::new(size, 1e12, 1e12), &src, None);
        let expected = box_blur(&src, size);

        let w = src.bounds().width();
        for (i, e) in expected.iter().enumerate() {
            let (x, y) = (i as i32 % w, i as i32 / w);
            let got = dst.get(x, y).to_unbounded();
            for (g, e) in got.to_array().iter().zip(e.to_array()) {
                assert!((g - e).abs() < 1e-5, "size {} at ({}, {}): {} vs {}", size, x, y, g, e);
            }
        }
    }
}

// ============================================================================
// Row cache and parallel execution
// ============================================================================

#[test]
fn test_row_cache_tracks_source_rows() {
    let rect = Rect::new(2, -5, 8, 12);
    let src = random_image(rect, 3);
    let width = rect.width() as usize;

    for k in (1..=15usize).step_by(2) {
        let center = (k / 2) as i32;
        let mut rng = SimpleRng::new(k as u64 * 31);
        let mut start = rect.min_y;

        while start < rect.max_y {
            let stop = (start + 1 + (rng.next_u32() % 6) as i32).min(rect.max_y);
            let mut cache = RowCache::new(&src, k, start);

            for y in start..stop {
                let mut expected = vec![Rgba::default(); width];
                for i in 0..k {
                    let sy = (y + i as i32 - center).clamp(rect.min_y, rect.max_y - 1);
                    src.read_row(sy, &mut expected);
                    assert_eq!(cache.row(i), &expected[..], "k={} y={} row {}", k, y, i);
                }

                src.read_row(y, &mut expected);
                assert_eq!(cache.center_row(), &expected[..]);

                if y < stop - 1 {
                    cache.advance(&src, y);
                }
            }
            start = stop;
        }
    }
}

#[test]
fn test_split_range_covers_exactly_once() {
    let mut rng = SimpleRng::new(5);
    for _ in 0..200 {
        let start = (rng.next_u32() % 50) as i32 - 25;
        let count = (rng.next_u32() % 40) as i32;
        let parts = (rng.next_u32() % 12) as usize;

        let ranges = split_range(start, start + count, parts);
        let mut next = start;
        for (lo, hi) in &ranges {
            assert_eq!(*lo, next);
            assert!(hi > lo);
            next = *hi;
        }
        if count > 0 {
            assert_eq!(next, start + count);
            assert!(ranges.len() <= parts.max(1));
        } else {
            assert!(ranges.is_empty());
        }
    }
}

#[test]
fn test_parallel_degree_is_byte_identical() {
    let src = random_image(Rect::new(4, 1, 15, 38), 9);
    let serial_opts = Options::with_parallelization(Parallelization::Disabled);

    for (name, filter) in all_filters() {
        let serial = run(filter.as_ref(), &src, Some(&serial_opts));
        for degree in [2, 4, 8] {
            let options = Options::with_parallelization(Parallelization::Degree(degree));
            let parallel = run(filter.as_ref(), &src, Some(&options));
            assert_eq!(bits(&serial), bits(&parallel), "{} degree {}", name, degree);
        }
        let default = run(filter.as_ref(), &src, None);
        assert_eq!(bits(&serial), bits(&default), "{} default degree", name);
    }
}

#[test]
fn test_huge_parallelization_degree_matches_serial() {
    let src = random_image(Rect::from_size(5, 9), 19);
    let serial_opts = Options::with_parallelization(Parallelization::Disabled);

    for (name, filter) in all_filters() {
        let serial = run(filter.as_ref(), &src, Some(&serial_opts));
        for degree in [usize::MAX, 1 << 32, (1 << 31) + 3] {
            let options = Options::with_parallelization(Parallelization::Degree(degree));
            let parallel = run(filter.as_ref(), &src, Some(&options));
            assert_eq!(bits(&serial), bits(&parallel), "{} degree {}", name, degree);
        }
    }
}

#[test]
fn test_huge_default_degree_matches_serial() {
    let src = uniform_image(Rect::from_size(2, 2), Rgba::splat(0.5));
    let filter = Dilation::new(square_kernel(3));
    let serial = run(&filter, &src, Some(&Options::with_parallelization(Parallelization::Disabled)));

    set_default_parallelization(usize::MAX);
    let by_default = run(&filter, &src, None);
    set_default_parallelization(0);

    assert_eq!(bits(&serial), bits(&by_default));
    assert!(serial.pix().iter().all(|&v| v == 0.5));
}

// ============================================================================
// Buffer placement
// ============================================================================

#[test]
fn test_destination_origin_does_not_change_result() {
    let src = random_image(Rect::from_size(8, 6), 11);
    for (name, filter) in all_filters() {
        let at_origin = run(filter.as_ref(), &src, None);

        let mut shifted = RealBuffer::new_unbounded(Rect::new(10, -4, 18, 2));
        filter.draw(&mut shifted, &src, None);
        assert_eq!(at_origin.pix(), shifted.pix(), "{}", name);
    }
}

#[test]
fn test_sub_image_source_filters_like_copy() {
    let parent = random_image(Rect::from_size(12, 10), 13);
    let region = Rect::new(3, 2, 9, 8);
    let view = parent.sub_image(region);

    let mut copy = RealBuffer::new_bounded(region, Encoding::Unit);
    for y in region.min_y..region.max_y {
        for x in region.min_x..region.max_x {
            copy.set(x, y, parent.get(x, y));
        }
    }

    for (name, filter) in all_filters() {
        let from_view = run(filter.as_ref(), &view, None);
        let from_copy = run(filter.as_ref(), &copy, None);
        assert_eq!(from_view.pix(), from_copy.pix(), "{}", name);
    }

    let disjoint = parent.sub_image(Rect::new(40, 40, 50, 50));
    assert!(disjoint.bounds().is_empty());
    assert_eq!(disjoint.get(45, 45), PixelSample::zero(Domain::Bounded(Encoding::Unit)));
}

// ============================================================================
// Filtering across domains
// ============================================================================

fn complex_image(rect: Rect, part: ComplexPart, f: impl Fn(i32, i32) -> Complex32) -> ComplexBuffer {
    let mut buffer = ComplexBuffer::new_complex(rect, part);
    for y in rect.min_y..rect.max_y {
        for x in rect.min_x..rect.max_x {
            buffer.set(x, y, PixelSample::Complex(Rgba::splat(f(x, y)), part));
        }
    }
    buffer
}

#[test]
fn test_signed_source_and_destination() {
    let rect = Rect::from_size(4, 4);
    let mut src = RealBuffer::new_bounded(rect, Encoding::Signed);
    for y in 0..4 {
        for x in 0..4 {
            let v = if (x, y) == (1, 2) { 1.0 } else { -1.0 };
            src.set(x, y, PixelSample::Bounded(Rgba::new(v, v, v, 1.0), Encoding::Signed));
        }
    }

    let mut dilated = RealBuffer::new_bounded(rect, Encoding::Signed);
    Dilation::new(square_kernel(3)).draw(&mut dilated, &src, None);
    let mut eroded = RealBuffer::new_bounded(rect, Encoding::Signed);
    Erosion::new(square_kernel(3)).draw(&mut eroded, &src, None);

    for y in 0..4 {
        for x in 0..4 {
            let near = (0..=2).contains(&x) && (1..=3).contains(&y);
            let v = if near { 1.0 } else { -1.0 };
            let expected = PixelSample::Bounded(Rgba::new(v, v, v, 1.0), Encoding::Signed);
            assert_eq!(dilated.get(x, y), expected, "dilation ({}, {})", x, y);

            let expected = PixelSample::Bounded(Rgba::new(-1.0, -1.0, -1.0, 1.0), Encoding::Signed);
            assert_eq!(eroded.get(x, y), expected, "erosion ({}, {})", x, y);
        }
    }

    // signed -0.5 is unit 0.25
    let gray = {
        let mut b = RealBuffer::new_bounded(rect, Encoding::Signed);
        for y in 0..4 {
            for x in 0..4 {
                b.set(x, y, PixelSample::Bounded(Rgba::new(-0.5, -0.5, -0.5, 1.0), Encoding::Signed));
            }
        }
        b
    };
    let mut smoothed = RealBuffer::new_bounded(rect, Encoding::Signed);
    Bilateral::new(3, 1.0, 0.1).draw(&mut smoothed, &gray, None);
    assert!(smoothed.pix().chunks_exact(4).all(|px| (px[0] + 0.5).abs() < 1e-6 && px[3] == 1.0));
}

#[test]
fn test_imaginary_projection_survives_filtering() {
    let rect = Rect::from_size(3, 3);
    let part = ComplexPart::Imaginary;
    let src = complex_image(rect, part, |x, y| {
        if (x, y) == (1, 1) {
            Complex32::new(0.1, 0.9)
        } else {
            Complex32::new(0.1, 0.2)
        }
    });

    let mut dst = ComplexBuffer::new_complex(rect, part);
    Dilation::new(square_kernel(3)).draw(&mut dst, &src, None);
    let expected = Encoding::Unit.quantize(0.9);
    for y in 0..3 {
        for x in 0..3 {
            assert_eq!(dst.get(x, y).to_canonical(), Rgba16::new(expected, expected, expected, expected));
            assert_eq!(dst.red_channel()[y as usize][x as usize], Complex32::new(0.0, 0.9));
        }
    }

    // a single-tap kernel runs the engine; an empty one takes the copy path
    let mut engine = ComplexBuffer::new_complex(rect, part);
    Dilation::new(vec![1.0]).draw(&mut engine, &src, None);
    let mut copied = ComplexBuffer::new_complex(rect, part);
    Dilation::new(Vec::new()).draw(&mut copied, &src, None);
    for y in 0..3 {
        for x in 0..3 {
            assert_eq!(engine.get(x, y).to_canonical(), copied.get(x, y).to_canonical());
            assert_eq!(engine.get(x, y).to_canonical(), src.get(x, y).to_canonical());
        }
    }
}

#[test]
fn test_real_projection_matches_real_buffer() {
    let rect = Rect::from_size(6, 5);
    let real = random_image(rect, 29);
    let complex = complex_image(rect, ComplexPart::Real, |x, y| {
        Complex32::new(real.get(x, y).to_unbounded().r, 0.7)
    });
    let mut gray = RealBuffer::new_unbounded(rect);
    for y in 0..5 {
        for x in 0..6 {
            gray.set(x, y, PixelSample::Unbounded(Rgba::splat(real.get(x, y).to_unbounded().r)));
        }
    }

    for (name, filter) in all_filters() {
        let mut out = ComplexBuffer::new_complex(rect, ComplexPart::Real);
        filter.draw(&mut out, &complex, None);
        let expected = run(filter.as_ref(), &gray, None);
        for y in 0..5 {
            for x in 0..6 {
                assert_eq!(out.get(x, y).to_unbounded(), expected.get(x, y).to_unbounded(), "{}", name);
            }
        }
    }
}

#[test]
fn test_double_precision_storage_filters_like_single() {
    let rect = Rect::new(2, 3, 9, 8);
    let single = random_image(rect, 31);
    let mut double = Real64Buffer::new_bounded(rect, Encoding::Unit);
    for y in rect.min_y..rect.max_y {
        for x in rect.min_x..rect.max_x {
            double.set(x, y, single.get(x, y));
        }
    }

    for (name, filter) in all_filters() {
        let expected = run(filter.as_ref(), &single, None);
        let mut out = Real64Buffer::new_unbounded(filter.bounds(rect));
        filter.draw(&mut out, &double, None);

        assert_eq!(out.pix().len(), expected.pix().len());
        for (a, b) in out.pix().iter().zip(expected.pix()) {
            assert_eq!(*a, *b as f64, "{}", name);
        }
    }
}

#[test]
fn test_double_precision_complex_imaginary_dilation() {
    let rect = Rect::from_size(3, 2);
    let part = ComplexPart::Imaginary;
    let mut src = Complex64Buffer::new_complex(rect, part);
    src.set(0, 0, PixelSample::Complex(Rgba::splat(Complex32::new(0.3, 0.75)), part));

    let mut dst = Complex64Buffer::new_complex(rect, part);
    Dilation::new(square_kernel(3)).draw(&mut dst, &src, None);
    assert_eq!(dst.alpha_channel()[1][1], Complex64::new(0.0, 0.75));
    assert_eq!(dst.red_channel()[0][2], Complex64::new(0.0, 0.0));
    assert_eq!(dst.get(1, 0).to_unbounded(), Rgba::splat(0.75));
}

// ============================================================================
// Color model
// ============================================================================

#[test]
fn test_canonical_round_trip_every_domain() {
    let domains = [
        Domain::Bounded(Encoding::Unit),
        Domain::Bounded(Encoding::Signed),
        Domain::Unbounded,
        Domain::Complex(ComplexPart::Real),
    ];
    let mut rng = SimpleRng::new(17);
    for _ in 0..2000 {
        let color = Rgba16::new(
            rng.next_u32() as u16,
            rng.next_u32() as u16,
            rng.next_u32() as u16,
            rng.next_u32() as u16,
        );
        for domain in domains {
            let sample = PixelSample::from_canonical(color, domain);
            let back = sample.to_canonical();
            for (a, b) in color.to_array().iter().zip(back.to_array()) {
                assert!((*a as i32 - b as i32).abs() <= 1, "{:?}: {} vs {}", domain, a, b);
            }
        }
    }
}

// ============================================================================
// Array front-end
// ============================================================================

#[test]
fn test_array_front_end_channel_counts() {
    let mut rng = SimpleRng::new(23);
    for channels in [1, 3, 4] {
        let img = Array3::from_shape_fn((6, 5, channels), |_| rng.next_f32());
        let blurred = bilateral_f32(img.view(), 3, 1.0, 0.2).unwrap();
        assert_eq!(blurred.dim(), (6, 5, channels));

        let opened = open_f32(img.view(), &square_kernel(3)).unwrap();
        assert_eq!(opened.dim(), (6, 5, channels));

        let bytes = img.mapv(|v| (v * 255.0) as u8);
        assert_eq!(erode_u8(bytes.view(), &square_kernel(3)).unwrap().dim(), (6, 5, channels));
    }

    for channels in [2, 5] {
        let img = Array3::<f32>::zeros((3, 3, channels));
        assert_eq!(
            bilateral_f32(img.view(), 3, 1.0, 0.2).unwrap_err(),
            Error::UnsupportedChannels(channels)
        );
    }
}
