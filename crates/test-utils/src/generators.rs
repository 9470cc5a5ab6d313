//! Synthetic raster generators.

use dekad_common::CrsCode;
use raster_store::{GeoRaster, GeoTransform};

/// The fixture grid transform: 1 degree per pixel, origin (30, -15).
///
/// Pixel (col, row) centers are at (30.5 + col, -15.5 - row), which keeps
/// expected coordinates easy to reason about in tests.
pub fn fixture_transform() -> GeoTransform {
    GeoTransform::new(30.0, -15.0, 1.0, -1.0)
}

/// Build a raster on the fixture transform from explicit values.
pub fn test_raster(values: Vec<f32>, width: usize, height: usize) -> GeoRaster {
    GeoRaster::new(
        values,
        width,
        height,
        fixture_transform(),
        CrsCode::Epsg4326,
        Some(-9999.0),
    )
}

/// A width x height grid filled with one value.
pub fn constant_grid(width: usize, height: usize, value: f32) -> GeoRaster {
    test_raster(vec![value; width * height], width, height)
}

/// A grid whose sample at (col, row) is `row * width + col`.
pub fn ramp_grid(width: usize, height: usize) -> GeoRaster {
    test_raster(
        (0..width * height).map(|i| i as f32).collect(),
        width,
        height,
    )
}

/// A constant grid with NaN holes at the given flat indices.
pub fn grid_with_nans(width: usize, height: usize, value: f32, holes: &[usize]) -> GeoRaster {
    let mut raster = constant_grid(width, height, value);
    for &i in holes {
        raster.data[i] = f32::NAN;
    }
    raster
}
