//! Temp-dir artifact stores and canned catalogs.

use chrono::NaiveDate;
use tempfile::TempDir;

use dekad_common::{DekadSlot, ProductKind};
use raster_store::{GeoRaster, RasterStore, StoreConfig};
use region_catalog::RegionCatalog;

/// Shorthand date constructor for tests.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// A raster store rooted in a temp directory that lives as long as the
/// fixture.
pub struct TestStore {
    _dir: TempDir,
    pub store: RasterStore,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = RasterStore::new(StoreConfig::new(dir.path()));
        Self { _dir: dir, store }
    }

    /// Publish a raw observation artifact.
    pub fn put_raw(&self, date: NaiveDate, raster: &GeoRaster) {
        self.store.write(ProductKind::Raw, date, raster).unwrap();
    }

    /// Publish a baseline artifact.
    pub fn put_lta(&self, slot: DekadSlot, raster: &GeoRaster) {
        self.store.write_lta(slot, raster).unwrap();
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a catalog of axis-aligned square regions through the real
/// GeoJSON loader.
///
/// Each entry is (name, min_x, min_y, max_x, max_y) in EPSG:4326.
pub fn geojson_catalog(regions: &[(&str, f64, f64, f64, f64)]) -> RegionCatalog {
    let features: Vec<String> = regions
        .iter()
        .map(|(name, min_x, min_y, max_x, max_y)| {
            format!(
                r#"{{
                    "type": "Feature",
                    "properties": {{"NAME_1": "{name}"}},
                    "geometry": {{
                        "type": "Polygon",
                        "coordinates": [[
                            [{min_x}, {min_y}], [{max_x}, {min_y}],
                            [{max_x}, {max_y}], [{min_x}, {max_y}],
                            [{min_x}, {min_y}]
                        ]]
                    }}
                }}"#
            )
        })
        .collect();

    let text = format!(
        r#"{{"type": "FeatureCollection", "features": [{}]}}"#,
        features.join(",")
    );
    RegionCatalog::from_geojson_str(&text, "NAME_1").unwrap()
}
