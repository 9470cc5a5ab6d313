//! Pixel masking against region polygons.

use raster_store::GeoRaster;
use region_catalog::Region;

/// Collect the valid (non-NaN) samples whose pixel centers fall inside
/// the region.
///
/// The region is reprojected to the raster's CRS first, then the scan is
/// cropped to the region's bounding envelope before the per-pixel ray
/// cast, so cost is proportional to the envelope, not the full grid.
pub fn valid_values_in_region(raster: &GeoRaster, region: &Region) -> Vec<f32> {
    let region = region.reproject(raster.crs);
    let Some(bbox) = region.bbox() else {
        return Vec::new();
    };

    // Envelope corners in pixel space; rows grow downward for the usual
    // negative pixel_height, so take min/max of both corners.
    let (c0, r0) = raster.transform.coords_to_pixel(bbox.min_x, bbox.max_y);
    let (c1, r1) = raster.transform.coords_to_pixel(bbox.max_x, bbox.min_y);

    let col_min = c0.min(c1).max(0);
    let row_min = r0.min(r1).max(0);
    let col_max = c0.max(c1).min(raster.width as i64 - 1);
    let row_max = r0.max(r1).min(raster.height as i64 - 1);

    if col_min > col_max || row_min > row_max {
        return Vec::new();
    }

    let mut values = Vec::new();
    for row in row_min..=row_max {
        for col in col_min..=col_max {
            let (x, y) = raster.pixel_center(col as usize, row as usize);
            if !region.contains_point(x, y) {
                continue;
            }
            if let Some(v) = raster.get(col as usize, row as usize) {
                if !v.is_nan() {
                    values.push(v);
                }
            }
        }
    }
    values
}
