//! Core raster types.

use dekad_common::{BoundingBox, CrsCode};
use serde::{Deserialize, Serialize};

/// Affine pixel-to-geographic transform for a north-up grid.
///
/// `pixel_height` is negative for the usual top-left origin layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner of pixel (0, 0).
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner of pixel (0, 0).
    pub origin_y: f64,
    /// Cell size in X direction.
    pub pixel_width: f64,
    /// Cell size in Y direction (negative for north-up).
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Geographic coordinates of the center of pixel (col, row).
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Pixel indices containing the geographic coordinate, unclamped.
    ///
    /// Returns fractional-floor indices that may be negative or past the
    /// grid edge; the caller bounds-checks against its dimensions.
    pub fn coords_to_pixel(&self, x: f64, y: f64) -> (i64, i64) {
        let col = ((x - self.origin_x) / self.pixel_width).floor() as i64;
        let row = ((y - self.origin_y) / self.pixel_height).floor() as i64;
        (col, row)
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

/// A single-band raster grid with geographic metadata.
///
/// Samples are stored row-major, top row first. By the time a raster
/// leaves the store, its declared no-data sentinel has been substituted
/// by NaN, so numeric code downstream only ever tests `is_nan()`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRaster {
    /// Sample values (row-major, NaN for missing).
    pub data: Vec<f32>,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Affine pixel-to-geographic transform.
    pub transform: GeoTransform,
    /// Coordinate reference of the transform.
    pub crs: CrsCode,
    /// Declared no-data sentinel of the stored artifact, if any.
    ///
    /// Kept for write-side round-tripping; in-memory samples use NaN.
    pub nodata: Option<f32>,
}

impl GeoRaster {
    /// Create a raster, checking that data length matches the dimensions.
    pub fn new(
        data: Vec<f32>,
        width: usize,
        height: usize,
        transform: GeoTransform,
        crs: CrsCode,
        nodata: Option<f32>,
    ) -> Self {
        assert_eq!(
            data.len(),
            width * height,
            "raster data length must equal width * height"
        );
        Self {
            data,
            width,
            height,
            transform,
            crs,
            nodata,
        }
    }

    /// A raster with the same geometry and metadata, filled with `value`.
    pub fn like(&self, value: f32) -> Self {
        Self {
            data: vec![value; self.width * self.height],
            width: self.width,
            height: self.height,
            transform: self.transform,
            crs: self.crs,
            nodata: self.nodata,
        }
    }

    /// Sample at (col, row), or `None` outside the grid.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// Set the sample at (col, row). Panics outside the grid.
    pub fn set(&mut self, col: usize, row: usize, value: f32) {
        assert!(col < self.width && row < self.height);
        self.data[row * self.width + col] = value;
    }

    /// Geographic coordinates of the center of pixel (col, row).
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_center(col, row)
    }

    /// Geographic bounding box of the full grid.
    pub fn bbox(&self) -> BoundingBox {
        let (x0, y0) = (self.transform.origin_x, self.transform.origin_y);
        let x1 = x0 + self.width as f64 * self.transform.pixel_width;
        let y1 = y0 + self.height as f64 * self.transform.pixel_height;
        BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Whether another raster has identical pixel dimensions.
    pub fn same_shape(&self, other: &GeoRaster) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the raster is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
