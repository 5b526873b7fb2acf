//! WebAssembly exports for the windowed filters.
//!
//! These functions are exposed to JavaScript via wasm-bindgen and operate on
//! flat RGBA data (length = width * height * 4).
//!
//! ## Bit Depth Support
//!
//! - **u8**: 8-bit per channel (0-255), standard for web/display
//! - **f32**: Float per channel (0.0-1.0), for HDR/linear workflows

use ndarray::{Array3, ArrayView3};
use wasm_bindgen::prelude::*;

use crate::error::Error;
use crate::filters::bilateral::{bilateral_f32, bilateral_u8};
use crate::filters::morphology::{
    close_f32, close_u8, dilate_f32, dilate_u8, erode_f32, erode_u8, open_f32, open_u8,
};

fn to_js_err(err: Error) -> JsError {
    JsError::new(&err.to_string())
}

fn rgba_view<T>(data: &[T], width: usize, height: usize) -> Result<ArrayView3<'_, T>, JsError> {
    ArrayView3::from_shape((height, width, 4), data).map_err(|_| {
        to_js_err(Error::SizeMismatch {
            expected: width * height * 4,
            actual: data.len(),
        })
    })
}

fn into_flat<T>(result: Array3<T>) -> Vec<T> {
    result.into_raw_vec_and_offset().0
}

// ============================================================================
// Bilateral Filter
// ============================================================================

/// Bilateral smoothing of RGBA u8 data. `color_sigma` is in 0-255 units.
#[wasm_bindgen]
pub fn bilateral_rgba_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    kernel_size: i32,
    spatial_sigma: f32,
    color_sigma: f32,
) -> Result<Vec<u8>, JsError> {
    let input = rgba_view(data, width, height)?;
    let result = bilateral_u8(input, kernel_size, spatial_sigma, color_sigma).map_err(to_js_err)?;
    Ok(into_flat(result))
}

/// Bilateral smoothing of RGBA f32 data (values 0.0-1.0).
#[wasm_bindgen]
pub fn bilateral_rgba_f32_wasm(
    data: &[f32],
    width: usize,
    height: usize,
    kernel_size: i32,
    spatial_sigma: f32,
    color_sigma: f32,
) -> Result<Vec<f32>, JsError> {
    let input = rgba_view(data, width, height)?;
    let result = bilateral_f32(input, kernel_size, spatial_sigma, color_sigma).map_err(to_js_err)?;
    Ok(into_flat(result))
}

// ============================================================================
// Morphology Filters
// ============================================================================

#[wasm_bindgen]
pub fn erode_rgba_wasm(data: &[u8], width: usize, height: usize, kernel: &[f32]) -> Result<Vec<u8>, JsError> {
    let input = rgba_view(data, width, height)?;
    Ok(into_flat(erode_u8(input, kernel).map_err(to_js_err)?))
}

#[wasm_bindgen]
pub fn erode_rgba_f32_wasm(data: &[f32], width: usize, height: usize, kernel: &[f32]) -> Result<Vec<f32>, JsError> {
    let input = rgba_view(data, width, height)?;
    Ok(into_flat(erode_f32(input, kernel).map_err(to_js_err)?))
}

#[wasm_bindgen]
pub fn dilate_rgba_wasm(data: &[u8], width: usize, height: usize, kernel: &[f32]) -> Result<Vec<u8>, JsError> {
    let input = rgba_view(data, width, height)?;
    Ok(into_flat(dilate_u8(input, kernel).map_err(to_js_err)?))
}

#[wasm_bindgen]
pub fn dilate_rgba_f32_wasm(data: &[f32], width: usize, height: usize, kernel: &[f32]) -> Result<Vec<f32>, JsError> {
    let input = rgba_view(data, width, height)?;
    Ok(into_flat(dilate_f32(input, kernel).map_err(to_js_err)?))
}

#[wasm_bindgen]
pub fn open_rgba_wasm(data: &[u8], width: usize, height: usize, kernel: &[f32]) -> Result<Vec<u8>, JsError> {
    let input = rgba_view(data, width, height)?;
    Ok(into_flat(open_u8(input, kernel).map_err(to_js_err)?))
}

#[wasm_bindgen]
pub fn open_rgba_f32_wasm(data: &[f32], width: usize, height: usize, kernel: &[f32]) -> Result<Vec<f32>, JsError> {
    let input = rgba_view(data, width, height)?;
    Ok(into_flat(open_f32(input, kernel).map_err(to_js_err)?))
}

#[wasm_bindgen]
pub fn close_rgba_wasm(data: &[u8], width: usize, height: usize, kernel: &[f32]) -> Result<Vec<u8>, JsError> {
    let input = rgba_view(data, width, height)?;
    Ok(into_flat(close_u8(input, kernel).map_err(to_js_err)?))
}

#[wasm_bindgen]
pub fn close_rgba_f32_wasm(data: &[f32], width: usize, height: usize, kernel: &[f32]) -> Result<Vec<f32>, JsError> {
    let input = rgba_view(data, width, height)?;
    Ok(into_flat(close_f32(input, kernel).map_err(to_js_err)?))
}
