//! Pixel/color data model.
//!
//! A [`PixelSample`] holds RGBA values in one of three numeric domains:
//!
//! | Domain | Storage | Canonical mapping |
//! |--------|---------|-------------------|
//! | Bounded (unit) | f32, 0.0-1.0 | `v * 0xffff` |
//! | Bounded (signed) | f32, -1.0-1.0 | `0.5 * (v + 1) * 0xffff` |
//! | Unbounded | f32, any value | `v * 0xffff`, clamped on quantization |
//! | Complex | (re, im) per channel | selected part, `v * 0xffff` |
//!
//! The canonical representation is [`Rgba16`], 16 bits per channel. Every
//! domain converts to and from it; conversions between domains go through the
//! unbounded "unit" value directly so no precision is lost on the way.

/// Largest canonical channel value, as float.
pub const CHANNEL_MAX: f32 = 65535.0;

const CHANNEL_INV: f32 = 1.0 / CHANNEL_MAX;

// ============================================================================
// Canonical color
// ============================================================================

/// Canonical 16-bit-per-channel RGBA color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgba16 {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub a: u16,
}

impl Rgba16 {
    pub const fn new(r: u16, g: u16, b: u16, a: u16) -> Self {
        Self { r, g, b, a }
    }

    /// Widen an 8-bit color (0xab becomes 0xabab).
    pub fn from_rgba8(rgba: [u8; 4]) -> Self {
        let [r, g, b, a] = rgba.map(|v| v as u16 * 0x101);
        Self { r, g, b, a }
    }

    /// Narrow to 8 bits per channel by keeping the high byte.
    pub fn to_rgba8(self) -> [u8; 4] {
        self.to_array().map(|v| (v >> 8) as u8)
    }

    pub fn to_array(self) -> [u16; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(rgba: [u16; 4]) -> Self {
        let [r, g, b, a] = rgba;
        Self { r, g, b, a }
    }
}

// ============================================================================
// Channel containers
// ============================================================================

/// Four channels of any value type.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rgba<T> {
    pub r: T,
    pub g: T,
    pub b: T,
    pub a: T,
}

impl<T: Copy> Rgba<T> {
    pub const fn new(r: T, g: T, b: T, a: T) -> Self {
        Self { r, g, b, a }
    }

    pub const fn splat(v: T) -> Self {
        Self { r: v, g: v, b: v, a: v }
    }

    pub fn map<U: Copy>(self, f: impl Fn(T) -> U) -> Rgba<U> {
        Rgba {
            r: f(self.r),
            g: f(self.g),
            b: f(self.b),
            a: f(self.a),
        }
    }

    pub fn to_array(self) -> [T; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(rgba: [T; 4]) -> Self {
        let [r, g, b, a] = rgba;
        Self { r, g, b, a }
    }
}

/// Single-precision complex channel value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Complex32 {
    pub re: f32,
    pub im: f32,
}

impl Complex32 {
    pub const fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    /// Real value with zero imaginary part.
    pub const fn from_real(re: f32) -> Self {
        Self { re, im: 0.0 }
    }

    pub fn part(self, part: ComplexPart) -> f32 {
        match part {
            ComplexPart::Real => self.re,
            ComplexPart::Imaginary => self.im,
        }
    }
}

/// Double-precision complex channel value.
///
/// Samples read from it carry single precision; see [`Complex32`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Complex64 {
    pub re: f64,
    pub im: f64,
}

impl Complex64 {
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub const fn from_real(re: f64) -> Self {
        Self { re, im: 0.0 }
    }

    pub fn part(self, part: ComplexPart) -> f64 {
        match part {
            ComplexPart::Real => self.re,
            ComplexPart::Imaginary => self.im,
        }
    }

    pub fn to_complex32(self) -> Complex32 {
        Complex32::new(self.re as f32, self.im as f32)
    }
}

impl From<Complex32> for Complex64 {
    fn from(c: Complex32) -> Self {
        Self::new(c.re as f64, c.im as f64)
    }
}

// ============================================================================
// Domains
// ============================================================================

/// Affine convention used by the bounded real domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// 0.0-1.0 maps to 0-0xffff.
    #[default]
    Unit,
    /// -1.0-1.0 maps to 0-0xffff.
    Signed,
}

impl Encoding {
    /// Map a domain value into the 0.0-1.0 unit range (unclamped).
    #[inline]
    pub fn to_unit(self, v: f32) -> f32 {
        match self {
            Encoding::Unit => v,
            Encoding::Signed => 0.5 * (v + 1.0),
        }
    }

    /// Inverse of [`Encoding::to_unit`].
    #[inline]
    pub fn from_unit(self, v: f32) -> f32 {
        match self {
            Encoding::Unit => v,
            Encoding::Signed => 2.0 * v - 1.0,
        }
    }

    /// Quantize a domain value to a canonical channel, clamping to range.
    #[inline]
    pub fn quantize(self, v: f32) -> u16 {
        // NaN saturates to 0 in the final cast
        (self.to_unit(v) * CHANNEL_MAX).round().clamp(0.0, CHANNEL_MAX) as u16
    }

    #[inline]
    pub fn dequantize(self, c: u16) -> f32 {
        self.from_unit(c as f32 * CHANNEL_INV)
    }
}

/// Which half of a complex channel projects to canonical color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ComplexPart {
    #[default]
    Real,
    Imaginary,
}

/// Numeric domain of a pixel sample or buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Bounded(Encoding),
    Unbounded,
    Complex(ComplexPart),
}

impl Default for Domain {
    fn default() -> Self {
        Domain::Bounded(Encoding::Unit)
    }
}

// ============================================================================
// Pixel sample
// ============================================================================

/// A tagged RGBA pixel value in one numeric domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PixelSample {
    Bounded(Rgba<f32>, Encoding),
    Unbounded(Rgba<f32>),
    Complex(Rgba<Complex32>, ComplexPart),
}

impl PixelSample {
    /// All-zero sample in the given domain.
    pub fn zero(domain: Domain) -> Self {
        match domain {
            Domain::Bounded(encoding) => PixelSample::Bounded(Rgba::default(), encoding),
            Domain::Unbounded => PixelSample::Unbounded(Rgba::default()),
            Domain::Complex(part) => PixelSample::Complex(Rgba::default(), part),
        }
    }

    pub fn domain(&self) -> Domain {
        match *self {
            PixelSample::Bounded(_, encoding) => Domain::Bounded(encoding),
            PixelSample::Unbounded(_) => Domain::Unbounded,
            PixelSample::Complex(_, part) => Domain::Complex(part),
        }
    }

    /// Unit-scaled real values, the representation filter accumulators use.
    ///
    /// Bounded values are mapped through their encoding, complex values
    /// contribute their selected part.
    pub fn to_unbounded(&self) -> Rgba<f32> {
        match *self {
            PixelSample::Bounded(rgba, encoding) => rgba.map(|v| encoding.to_unit(v)),
            PixelSample::Unbounded(rgba) => rgba,
            PixelSample::Complex(rgba, part) => rgba.map(|c| c.part(part)),
        }
    }

    /// Build a sample in `domain` from unit-scaled real values.
    ///
    /// A complex target receives the values as real parts with zero
    /// imaginary parts.
    pub fn from_unbounded(rgba: Rgba<f32>, domain: Domain) -> Self {
        match domain {
            Domain::Bounded(encoding) => {
                PixelSample::Bounded(rgba.map(|v| encoding.from_unit(v)), encoding)
            }
            Domain::Unbounded => PixelSample::Unbounded(rgba),
            Domain::Complex(part) => PixelSample::Complex(rgba.map(Complex32::from_real), part),
        }
    }

    /// Sample in `domain` whose visible projection equals the unit-scaled
    /// `rgba`. Unlike [`PixelSample::from_unbounded`], a complex target
    /// projecting its imaginary part receives the values there (real part 0).
    pub fn from_projection(rgba: Rgba<f32>, domain: Domain) -> Self {
        match domain {
            Domain::Complex(ComplexPart::Imaginary) => PixelSample::Complex(
                rgba.map(|v| Complex32::new(0.0, v)),
                ComplexPart::Imaginary,
            ),
            other => PixelSample::from_unbounded(rgba, other),
        }
    }

    /// Convert to another domain without passing through quantization.
    pub fn convert(self, domain: Domain) -> Self {
        match (self, domain) {
            (sample, target) if sample.domain() == target => sample,
            (PixelSample::Complex(rgba, _), Domain::Complex(part)) => {
                PixelSample::Complex(rgba, part)
            }
            (sample, target) => PixelSample::from_unbounded(sample.to_unbounded(), target),
        }
    }

    /// Quantize to canonical color.
    pub fn to_canonical(&self) -> Rgba16 {
        match *self {
            PixelSample::Bounded(rgba, encoding) => {
                Rgba16::from_array(rgba.map(|v| encoding.quantize(v)).to_array())
            }
            PixelSample::Unbounded(rgba) => {
                Rgba16::from_array(rgba.map(|v| Encoding::Unit.quantize(v)).to_array())
            }
            PixelSample::Complex(rgba, part) => Rgba16::from_array(
                rgba.map(|c| Encoding::Unit.quantize(c.part(part))).to_array(),
            ),
        }
    }

    /// Decode canonical color into `domain`.
    pub fn from_canonical(color: Rgba16, domain: Domain) -> Self {
        let channels = Rgba::from_array(color.to_array());
        match domain {
            Domain::Bounded(encoding) => {
                PixelSample::Bounded(channels.map(|c| encoding.dequantize(c)), encoding)
            }
            Domain::Unbounded => {
                PixelSample::Unbounded(channels.map(|c| Encoding::Unit.dequantize(c)))
            }
            Domain::Complex(part) => PixelSample::Complex(
                channels.map(|c| Complex32::from_real(Encoding::Unit.dequantize(c))),
                part,
            ),
        }
    }

    /// 8-bit projection of the canonical color.
    pub fn to_rgba8(&self) -> [u8; 4] {
        self.to_canonical().to_rgba8()
    }
}
