//! Windowed Filters
//!
//! Parallel sliding-window image filters (bilateral smoothing and
//! grayscale/color morphology) over a multi-domain pixel model, with Python
//! bindings via PyO3 and WASM bindings for JavaScript.
//!
//! ## Pixel Model
//! Pixels are RGBA samples in one of three numeric domains:
//! - **Bounded**: f32 in 0.0-1.0 (or -1.0-1.0 with signed encoding)
//! - **Unbounded**: f32, no clamping (filter accumulators)
//! - **Complex**: (re, im) per channel, one part projects to color
//!
//! Buffers store channels as f32, f64, or single/double precision complex.
//!
//! Every domain converts to and from a canonical 16-bit-per-channel color.
//!
//! ## Filter Architecture
//! Filters read from any [`buffer::PixelSource`] and write to any
//! [`buffer::PixelSink`]. The destination always has the source's size,
//! placed at the origin. Work is split into row chunks processed on rayon;
//! the result does not depend on how many chunks are used.
//!
//! ## Array API
//! The `*_f32` / `*_u8` functions take ndarray images of shape
//! (height, width, channels) with 1, 3 or 4 channels.

pub mod buffer;
pub mod color;
pub mod error;
pub mod filters;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use buffer::{
    Complex64Buffer, ComplexBuffer, PixelBuffer, PixelSink, PixelSource, Real64Buffer, RealBuffer,
    Rect,
};
pub use color::{Complex32, Complex64, ComplexPart, Domain, Encoding, PixelSample, Rgba, Rgba16};
pub use error::Error;
pub use filters::{
    closing, opening, set_default_parallelization, Bilateral, Dilation, Erosion, Filter,
    GroupFilter, Options, Parallelization,
};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::error::Error;
    use crate::filters::bilateral;
    use crate::filters::morphology;

    fn to_py_err(err: Error) -> PyErr {
        PyValueError::new_err(err.to_string())
    }

    // ========================================================================
    // Bilateral Filter
    // ========================================================================

    /// Edge-preserving bilateral smoothing (u8).
    ///
    /// `color_sigma` is in 0-255 units.
    #[pyfunction]
    #[pyo3(signature = (image, kernel_size=5, spatial_sigma=2.0, color_sigma=25.0))]
    pub fn bilateral_filter<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        kernel_size: i32,
        spatial_sigma: f32,
        color_sigma: f32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let result = bilateral::bilateral_u8(image.as_array(), kernel_size, spatial_sigma, color_sigma)
            .map_err(to_py_err)?;
        Ok(result.into_pyarray(py))
    }

    /// Edge-preserving bilateral smoothing (f32, values 0.0-1.0).
    #[pyfunction]
    #[pyo3(signature = (image, kernel_size=5, spatial_sigma=2.0, color_sigma=0.1))]
    pub fn bilateral_filter_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        kernel_size: i32,
        spatial_sigma: f32,
        color_sigma: f32,
    ) -> PyResult<Bound<'py, PyArray3<f32>>> {
        let result = bilateral::bilateral_f32(image.as_array(), kernel_size, spatial_sigma, color_sigma)
            .map_err(to_py_err)?;
        Ok(result.into_pyarray(py))
    }

    // ========================================================================
    // Morphology Filters
    // ========================================================================

    #[pyfunction]
    pub fn erode<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        kernel: Vec<f32>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let result = morphology::erode_u8(image.as_array(), &kernel).map_err(to_py_err)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    pub fn erode_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        kernel: Vec<f32>,
    ) -> PyResult<Bound<'py, PyArray3<f32>>> {
        let result = morphology::erode_f32(image.as_array(), &kernel).map_err(to_py_err)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    pub fn dilate<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        kernel: Vec<f32>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let result = morphology::dilate_u8(image.as_array(), &kernel).map_err(to_py_err)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    pub fn dilate_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        kernel: Vec<f32>,
    ) -> PyResult<Bound<'py, PyArray3<f32>>> {
        let result = morphology::dilate_f32(image.as_array(), &kernel).map_err(to_py_err)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    pub fn open<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        kernel: Vec<f32>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let result = morphology::open_u8(image.as_array(), &kernel).map_err(to_py_err)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    pub fn open_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        kernel: Vec<f32>,
    ) -> PyResult<Bound<'py, PyArray3<f32>>> {
        let result = morphology::open_f32(image.as_array(), &kernel).map_err(to_py_err)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    pub fn close<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        kernel: Vec<f32>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let result = morphology::close_u8(image.as_array(), &kernel).map_err(to_py_err)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    pub fn close_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        kernel: Vec<f32>,
    ) -> PyResult<Bound<'py, PyArray3<f32>>> {
        let result = morphology::close_f32(image.as_array(), &kernel).map_err(to_py_err)?;
        Ok(result.into_pyarray(py))
    }

    /// Structuring element helpers.
    #[pyfunction]
    pub fn disk_kernel(radius: f32) -> Vec<f32> {
        morphology::disk_kernel(radius)
    }

    #[pyfunction]
    pub fn set_parallelization(degree: usize) {
        crate::filters::set_default_parallelization(degree);
    }

    /// Windowed filters extension module
    #[pymodule]
    pub fn windowed_filters(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Bilateral
        m.add_function(wrap_pyfunction!(bilateral_filter, m)?)?;
        m.add_function(wrap_pyfunction!(bilateral_filter_f32, m)?)?;

        // Morphology
        m.add_function(wrap_pyfunction!(erode, m)?)?;
        m.add_function(wrap_pyfunction!(erode_f32, m)?)?;
        m.add_function(wrap_pyfunction!(dilate, m)?)?;
        m.add_function(wrap_pyfunction!(dilate_f32, m)?)?;
        m.add_function(wrap_pyfunction!(open, m)?)?;
        m.add_function(wrap_pyfunction!(open_f32, m)?)?;
        m.add_function(wrap_pyfunction!(close, m)?)?;
        m.add_function(wrap_pyfunction!(close_f32, m)?)?;
        m.add_function(wrap_pyfunction!(disk_kernel, m)?)?;

        // Configuration
        m.add_function(wrap_pyfunction!(set_parallelization, m)?)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::windowed_filters;
