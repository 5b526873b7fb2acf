//! Pixel buffers with rectangular bounds over arbitrary backing storage.
//!
//! Pixels are stored channel-interleaved (R, G, B, A). The pixel at `(x, y)`
//! starts at `(y - rect.min_y) * stride + (x - rect.min_x) * 4`. Buffers are
//! generic over their storage, so the same accessor works for an owned
//! `Vec`, a borrowed slice, or a mutable sub-view of another buffer.
//!
//! Reads outside the bounds return a zero sample and writes outside the
//! bounds are ignored, matching the clamped-boundary behavior of the filters.

use std::marker::PhantomData;

use ndarray::{Array3, ArrayView3};

use crate::color::{Complex32, Complex64, ComplexPart, Domain, Encoding, PixelSample, Rgba};
use crate::error::Error;

// ============================================================================
// Rectangle
// ============================================================================

/// Half-open rectangle `[min_x, max_x) x [min_y, max_y)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Rect {
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Rectangle at the origin with the given size.
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn width(&self) -> i32 {
        (self.max_x - self.min_x).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.max_y - self.min_y).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    /// Largest rectangle contained in both; empty intersections collapse to
    /// the default (zero) rectangle.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let r = Rect::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        );
        if r.is_empty() {
            Rect::default()
        } else {
            r
        }
    }
}

// ============================================================================
// Channel storage types
// ============================================================================

/// Element type a buffer stores per channel.
pub trait Channel: Copy + Default + Send + Sync + 'static {
    /// Coerce a requested domain to one this storage can represent.
    fn storage_domain(domain: Domain) -> Domain;

    /// Interpret four stored channels as a sample in `domain`.
    fn load(px: [Self; 4], domain: Domain) -> PixelSample;

    /// Encode a sample for storage in `domain`.
    fn store(sample: PixelSample, domain: Domain) -> [Self; 4];

    /// Real value used for opacity checks.
    fn real(self) -> f32;
}

impl Channel for f32 {
    fn storage_domain(domain: Domain) -> Domain {
        match domain {
            Domain::Complex(_) => Domain::Unbounded,
            real => real,
        }
    }

    #[inline]
    fn load(px: [f32; 4], domain: Domain) -> PixelSample {
        match domain {
            Domain::Bounded(encoding) => PixelSample::Bounded(Rgba::from_array(px), encoding),
            _ => PixelSample::Unbounded(Rgba::from_array(px)),
        }
    }

    #[inline]
    fn store(sample: PixelSample, domain: Domain) -> [f32; 4] {
        match sample.convert(domain) {
            PixelSample::Bounded(rgba, _) | PixelSample::Unbounded(rgba) => rgba.to_array(),
            PixelSample::Complex(rgba, part) => rgba.map(|c| c.part(part)).to_array(),
        }
    }

    fn real(self) -> f32 {
        self
    }
}

impl Channel for Complex32 {
    fn storage_domain(domain: Domain) -> Domain {
        match domain {
            Domain::Complex(part) => Domain::Complex(part),
            _ => Domain::Complex(ComplexPart::Real),
        }
    }

    #[inline]
    fn load(px: [Complex32; 4], domain: Domain) -> PixelSample {
        let part = match domain {
            Domain::Complex(part) => part,
            _ => ComplexPart::Real,
        };
        PixelSample::Complex(Rgba::from_array(px), part)
    }

    #[inline]
    fn store(sample: PixelSample, domain: Domain) -> [Complex32; 4] {
        match sample.convert(domain) {
            PixelSample::Complex(rgba, _) => rgba.to_array(),
            PixelSample::Bounded(rgba, _) | PixelSample::Unbounded(rgba) => {
                rgba.map(Complex32::from_real).to_array()
            }
        }
    }

    fn real(self) -> f32 {
        self.re
    }
}

// Double-precision storage goes through the single-precision sample types.

impl Channel for f64 {
    fn storage_domain(domain: Domain) -> Domain {
        f32::storage_domain(domain)
    }

    #[inline]
    fn load(px: [f64; 4], domain: Domain) -> PixelSample {
        f32::load(px.map(|v| v as f32), domain)
    }

    #[inline]
    fn store(sample: PixelSample, domain: Domain) -> [f64; 4] {
        f32::store(sample, domain).map(f64::from)
    }

    fn real(self) -> f32 {
        self as f32
    }
}

impl Channel for Complex64 {
    fn storage_domain(domain: Domain) -> Domain {
        Complex32::storage_domain(domain)
    }

    #[inline]
    fn load(px: [Complex64; 4], domain: Domain) -> PixelSample {
        Complex32::load(px.map(Complex64::to_complex32), domain)
    }

    #[inline]
    fn store(sample: PixelSample, domain: Domain) -> [Complex64; 4] {
        Complex32::store(sample, domain).map(Complex64::from)
    }

    fn real(self) -> f32 {
        self.re as f32
    }
}

// ============================================================================
// Source / sink capabilities
// ============================================================================

/// Read side of an image: bounds, per-pixel reads and row fetches.
pub trait PixelSource: Sync {
    fn bounds(&self) -> Rect;

    fn get(&self, x: i32, y: i32) -> PixelSample;

    /// Fetch row `y` as accumulator values, starting at `bounds().min_x`.
    fn read_row(&self, y: i32, row: &mut [Rgba<f32>]) {
        let min_x = self.bounds().min_x;
        for (i, px) in row.iter_mut().enumerate() {
            *px = self.get(min_x + i as i32, y).to_unbounded();
        }
    }
}

/// Write side of an image: bounds, domain and coordinate-indexed writes.
pub trait PixelSink {
    fn bounds(&self) -> Rect;

    /// Domain samples are stored in.
    fn domain(&self) -> Domain;

    fn set(&mut self, x: i32, y: i32, sample: PixelSample);
}

// ============================================================================
// Pixel buffer
// ============================================================================

/// RGBA pixel buffer over storage `S` holding channels of type `C`.
#[derive(Debug, Clone)]
pub struct PixelBuffer<C, S = Vec<C>> {
    pix: S,
    stride: usize,
    rect: Rect,
    domain: Domain,
    _channel: PhantomData<C>,
}

/// Owned real-valued buffer (bounded or unbounded domain).
pub type RealBuffer = PixelBuffer<f32>;

/// Owned complex-valued buffer.
pub type ComplexBuffer = PixelBuffer<Complex32>;

/// Owned double-precision real buffer.
pub type Real64Buffer = PixelBuffer<f64>;

/// Owned double-precision complex buffer.
pub type Complex64Buffer = PixelBuffer<Complex64>;

impl<C: Channel> PixelBuffer<C> {
    fn with_domain(rect: Rect, domain: Domain) -> Self {
        let (w, h) = (rect.width() as usize, rect.height() as usize);
        Self {
            pix: vec![C::default(); 4 * w * h],
            stride: 4 * w,
            rect,
            domain: C::storage_domain(domain),
            _channel: PhantomData,
        }
    }

    /// Zeroed buffer in the bounded domain.
    pub fn new_bounded(rect: Rect, encoding: Encoding) -> Self {
        Self::with_domain(rect, Domain::Bounded(encoding))
    }

    /// Zeroed buffer in the unbounded domain.
    pub fn new_unbounded(rect: Rect) -> Self {
        Self::with_domain(rect, Domain::Unbounded)
    }

    /// Zeroed complex buffer projecting `part` to canonical color.
    ///
    /// Real storage falls back to the unbounded domain.
    pub fn new_complex(rect: Rect, part: ComplexPart) -> Self {
        Self::with_domain(rect, Domain::Complex(part))
    }

    /// Assemble a buffer from four equally sized channel planes, indexed
    /// `[y][x]`. Complex storage projects the real part.
    pub fn from_channels(
        r: &[Vec<C>],
        g: &[Vec<C>],
        b: &[Vec<C>],
        a: &[Vec<C>],
    ) -> Result<Self, Error> {
        let height = r.len();
        let width = r.first().map_or(0, Vec::len);
        let expected = width * height;

        for plane in [r, g, b, a] {
            let actual: usize = plane.iter().map(Vec::len).sum();
            if plane.len() != height
                || actual != expected
                || plane.iter().any(|row| row.len() != width)
            {
                return Err(Error::SizeMismatch { expected, actual });
            }
        }

        let mut buffer = Self::new_complex(
            Rect::from_size(width as i32, height as i32),
            ComplexPart::Real,
        );
        for (y, row) in buffer.pix.chunks_exact_mut(buffer.stride.max(1)).enumerate() {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                px.copy_from_slice(&[r[y][x], g[y][x], b[y][x], a[y][x]]);
            }
        }

        Ok(buffer)
    }
}

impl PixelBuffer<f32> {
    /// Build a bounded buffer from an `(H, W, C)` array with 1, 3 or 4
    /// channels. Grayscale expands to RGB; missing alpha becomes opaque.
    pub fn from_array(input: ArrayView3<f32>, encoding: Encoding) -> Result<Self, Error> {
        let (height, width, channels) = input.dim();
        if !matches!(channels, 1 | 3 | 4) {
            return Err(Error::UnsupportedChannels(channels));
        }

        let opaque = encoding.from_unit(1.0);
        let mut buffer = Self::new_bounded(Rect::from_size(width as i32, height as i32), encoding);
        for ((y, x), px) in ndarray::indices((height, width))
            .into_iter()
            .zip(buffer.pix.chunks_exact_mut(4))
        {
            let rgba = match channels {
                1 => {
                    let v = input[[y, x, 0]];
                    [v, v, v, opaque]
                }
                3 => [input[[y, x, 0]], input[[y, x, 1]], input[[y, x, 2]], opaque],
                _ => [
                    input[[y, x, 0]],
                    input[[y, x, 1]],
                    input[[y, x, 2]],
                    input[[y, x, 3]],
                ],
            };
            px.copy_from_slice(&rgba);
        }

        Ok(buffer)
    }
}

impl<C: Channel, S: AsRef<[C]>> PixelBuffer<C, S> {
    /// Wrap existing storage. `pix` must hold `height` rows of `stride`
    /// values (the last row only needs `4 * width`).
    pub fn from_raw(pix: S, stride: usize, rect: Rect, domain: Domain) -> Result<Self, Error> {
        let (w, h) = (rect.width() as usize, rect.height() as usize);
        if w > 0 && h > 0 {
            if stride < 4 * w {
                return Err(Error::InvalidStride { stride, width: w });
            }
            let expected = (h - 1) * stride + 4 * w;
            let actual = pix.as_ref().len();
            if actual < expected {
                return Err(Error::SizeMismatch { expected, actual });
            }
        }

        Ok(Self {
            pix,
            stride,
            rect,
            domain: C::storage_domain(domain),
            _channel: PhantomData,
        })
    }

    pub fn bounds(&self) -> Rect {
        self.rect
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn pix(&self) -> &[C] {
        self.pix.as_ref()
    }

    /// Index of the first channel of `(x, y)`; only meaningful in bounds.
    #[inline]
    pub fn pix_offset(&self, x: i32, y: i32) -> usize {
        (y - self.rect.min_y) as usize * self.stride + (x - self.rect.min_x) as usize * 4
    }

    #[inline]
    fn load(&self, x: i32, y: i32) -> PixelSample {
        if !self.rect.contains(x, y) {
            return PixelSample::zero(self.domain);
        }
        let idx = self.pix_offset(x, y);
        let pix = self.pix.as_ref();
        C::load([pix[idx], pix[idx + 1], pix[idx + 2], pix[idx + 3]], self.domain)
    }

    /// Pixel at `(x, y)`, or a zero sample outside the bounds.
    pub fn get(&self, x: i32, y: i32) -> PixelSample {
        self.load(x, y)
    }

    /// `width` samples of row `y` starting at the left edge.
    pub fn get_row(&self, y: i32, width: usize) -> Vec<PixelSample> {
        (0..width)
            .map(|i| self.load(self.rect.min_x + i as i32, y))
            .collect()
    }

    /// View of the part of this buffer inside `r`, sharing storage.
    pub fn sub_image(&self, r: Rect) -> PixelBuffer<C, &[C]> {
        let r = r.intersect(&self.rect);
        if r.is_empty() {
            return PixelBuffer {
                pix: &[],
                stride: 0,
                rect: Rect::default(),
                domain: self.domain,
                _channel: PhantomData,
            };
        }

        let idx = self.pix_offset(r.min_x, r.min_y);
        PixelBuffer {
            pix: &self.pix.as_ref()[idx..],
            stride: self.stride,
            rect: r,
            domain: self.domain,
            _channel: PhantomData,
        }
    }

    /// Whether every alpha value is exactly 1.0 (real part for complex data).
    pub fn is_opaque(&self) -> bool {
        let opaque = match self.domain {
            Domain::Bounded(encoding) => encoding.from_unit(1.0),
            _ => 1.0,
        };
        self.rows().all(|row| row.chunks_exact(4).all(|px| px[3].real() == opaque))
    }

    /// Iterate rows as channel slices of length `4 * width`.
    pub fn rows(&self) -> impl Iterator<Item = &[C]> + '_ {
        let row_len = 4 * self.rect.width() as usize;
        let pix = self.pix.as_ref();
        (0..self.rect.height() as usize).map(move |y| &pix[y * self.stride..y * self.stride + row_len])
    }

    /// Extract one channel (0 = R .. 3 = A) as a `[y][x]` plane.
    pub fn channel(&self, c: usize) -> Vec<Vec<C>> {
        self.rows()
            .map(|row| row.chunks_exact(4).map(|px| px[c]).collect())
            .collect()
    }

    pub fn red_channel(&self) -> Vec<Vec<C>> {
        self.channel(0)
    }

    pub fn green_channel(&self) -> Vec<Vec<C>> {
        self.channel(1)
    }

    pub fn blue_channel(&self) -> Vec<Vec<C>> {
        self.channel(2)
    }

    pub fn alpha_channel(&self) -> Vec<Vec<C>> {
        self.channel(3)
    }
}

impl<S: AsRef<[f32]>> PixelBuffer<f32, S> {
    /// Stored values as an `(H, W, 4)` array.
    pub fn to_array(&self) -> Array3<f32> {
        let (w, h) = (self.rect.width() as usize, self.rect.height() as usize);
        let mut output = Array3::<f32>::zeros((h, w, 4));
        for (y, row) in self.rows().enumerate() {
            for (x, px) in row.chunks_exact(4).enumerate() {
                for c in 0..4 {
                    output[[y, x, c]] = px[c];
                }
            }
        }
        output
    }
}

impl<C: Channel, S: AsRef<[C]> + AsMut<[C]>> PixelBuffer<C, S> {
    pub fn pix_mut(&mut self) -> &mut [C] {
        self.pix.as_mut()
    }

    #[inline]
    fn store(&mut self, x: i32, y: i32, sample: PixelSample) {
        if !self.rect.contains(x, y) {
            return;
        }
        let idx = self.pix_offset(x, y);
        let px = C::store(sample, self.domain);
        self.pix.as_mut()[idx..idx + 4].copy_from_slice(&px);
    }

    /// Write `sample` at `(x, y)`, converting into this buffer's domain.
    /// Writes outside the bounds are ignored.
    pub fn set(&mut self, x: i32, y: i32, sample: PixelSample) {
        self.store(x, y, sample);
    }

    /// Mutable view of the part of this buffer inside `r`, sharing storage.
    pub fn sub_image_mut(&mut self, r: Rect) -> PixelBuffer<C, &mut [C]> {
        let r = r.intersect(&self.rect);
        if r.is_empty() {
            return PixelBuffer {
                pix: &mut [],
                stride: 0,
                rect: Rect::default(),
                domain: self.domain,
                _channel: PhantomData,
            };
        }

        let idx = self.pix_offset(r.min_x, r.min_y);
        PixelBuffer {
            pix: &mut self.pix.as_mut()[idx..],
            stride: self.stride,
            rect: r,
            domain: self.domain,
            _channel: PhantomData,
        }
    }
}

impl<C: Channel, S: AsRef<[C]> + Sync> PixelSource for PixelBuffer<C, S> {
    fn bounds(&self) -> Rect {
        self.rect
    }

    fn get(&self, x: i32, y: i32) -> PixelSample {
        self.load(x, y)
    }

    fn read_row(&self, y: i32, row: &mut [Rgba<f32>]) {
        if y < self.rect.min_y || y >= self.rect.max_y {
            row.fill(Rgba::default());
            return;
        }

        let start = self.pix_offset(self.rect.min_x, y);
        let width = (self.rect.width() as usize).min(row.len());
        let src = &self.pix.as_ref()[start..start + 4 * width];
        for (dst, px) in row.iter_mut().zip(src.chunks_exact(4)) {
            *dst = C::load([px[0], px[1], px[2], px[3]], self.domain).to_unbounded();
        }
        for dst in row.iter_mut().skip(width) {
            *dst = Rgba::default();
        }
    }
}

impl<C: Channel, S: AsRef<[C]> + AsMut<[C]>> PixelSink for PixelBuffer<C, S> {
    fn bounds(&self) -> Rect {
        self.rect
    }

    fn domain(&self) -> Domain {
        self.domain
    }

    fn set(&mut self, x: i32, y: i32, sample: PixelSample) {
        self.store(x, y, sample);
    }
}
