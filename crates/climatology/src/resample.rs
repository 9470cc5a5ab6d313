//! Nearest-neighbor grid resampling.

use raster_store::{GeoRaster, GeoTransform};

/// Resample a raster to new pixel dimensions by nearest neighbor.
///
/// Nearest preserves the discrete baseline values exactly instead of
/// smoothing across pixel boundaries, which is what anomaly computation
/// needs when the baseline and event grids differ in size. Source
/// pixels are picked center-aligned.
pub fn resample_nearest(src: &GeoRaster, width: usize, height: usize) -> GeoRaster {
    if src.width == width && src.height == height {
        return src.clone();
    }

    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        let src_row = nearest_index(row, height, src.height);
        for col in 0..width {
            let src_col = nearest_index(col, width, src.width);
            data.push(src.data[src_row * src.width + src_col]);
        }
    }

    // Same geographic footprint, rescaled cell size.
    let transform = GeoTransform::new(
        src.transform.origin_x,
        src.transform.origin_y,
        src.transform.pixel_width * src.width as f64 / width as f64,
        src.transform.pixel_height * src.height as f64 / height as f64,
    );

    GeoRaster::new(data, width, height, transform, src.crs, src.nodata)
}

fn nearest_index(i: usize, dst_len: usize, src_len: usize) -> usize {
    let mapped = ((i as f64 + 0.5) * src_len as f64 / dst_len as f64) as usize;
    mapped.min(src_len - 1)
}
