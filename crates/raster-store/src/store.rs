//! Artifact resolution and atomic publication.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;

use dekad_common::{AnalyticsError, AnalyticsResult, Dekad, DekadSlot, ProductKind};

use crate::geotiff;
use crate::types::GeoRaster;

/// Configuration for the raster store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory containing the artifact namespaces.
    pub root: PathBuf,
    /// Product prefix used in artifact filenames (e.g. "gsod").
    pub product: String,
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            product: "gsod".to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `DATA_ROOT` sets the storage root (default `data`);
    /// `PRODUCT_PREFIX` sets the artifact prefix (default `gsod`).
    pub fn from_env() -> Self {
        let mut config = Self::new("data");

        if let Ok(val) = std::env::var("DATA_ROOT") {
            if !val.is_empty() {
                config.root = PathBuf::from(val);
            }
        }
        if let Ok(val) = std::env::var("PRODUCT_PREFIX") {
            if !val.is_empty() {
                config.product = val;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.product.is_empty() {
            return Err("product prefix must not be empty".to_string());
        }
        if self.product.contains(['/', '_']) {
            return Err("product prefix must not contain '/' or '_'".to_string());
        }
        Ok(())
    }
}

/// Filesystem-backed raster artifact store.
///
/// Raw observations are read-only to this store; derived artifacts are
/// written once per key and recomputation overwrites idempotently.
pub struct RasterStore {
    config: StoreConfig,
}

impl RasterStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Path of the date-keyed artifact for (kind, date).
    pub fn artifact_path(&self, kind: ProductKind, date: NaiveDate) -> PathBuf {
        let name = format!(
            "{}_{}{}.tif",
            self.config.product,
            date.format("%Y%m%d"),
            kind.suffix()
        );
        self.config.root.join(kind.dir()).join(name)
    }

    /// Path of the slot-keyed baseline artifact.
    pub fn lta_path(&self, slot: DekadSlot) -> PathBuf {
        let name = format!(
            "{}_{}{}.tif",
            self.config.product,
            slot,
            ProductKind::Lta.suffix()
        );
        self.config.root.join(ProductKind::Lta.dir()).join(name)
    }

    /// Whether the artifact for (kind, date) has been published.
    pub fn exists(&self, kind: ProductKind, date: NaiveDate) -> bool {
        match kind {
            ProductKind::Lta => self.lta_path(Dekad::containing(date).slot()).exists(),
            _ => self.artifact_path(kind, date).exists(),
        }
    }

    /// Open the raster for (kind, date).
    ///
    /// For the LTA namespace the date is resolved to its dekad-of-year
    /// slot. A missing file is `NotFound`; a file that exists but fails
    /// to decode is `CorruptArtifact`.
    pub fn open(&self, kind: ProductKind, date: NaiveDate) -> AnalyticsResult<GeoRaster> {
        match kind {
            ProductKind::Lta => self.open_lta(Dekad::containing(date).slot()),
            _ => self.open_path(&self.artifact_path(kind, date)),
        }
    }

    /// Open the baseline raster for a dekad-of-year slot.
    pub fn open_lta(&self, slot: DekadSlot) -> AnalyticsResult<GeoRaster> {
        self.open_path(&self.lta_path(slot))
    }

    /// Open the event raster for a date: the COG copy when it has been
    /// materialized, the raw observation otherwise.
    pub fn open_event(&self, date: NaiveDate) -> AnalyticsResult<GeoRaster> {
        let cog = self.artifact_path(ProductKind::Cog, date);
        if cog.exists() {
            self.open_path(&cog)
        } else {
            self.open_path(&self.artifact_path(ProductKind::Raw, date))
        }
    }

    fn open_path(&self, path: &Path) -> AnalyticsResult<GeoRaster> {
        if !path.exists() {
            return Err(AnalyticsError::not_found(path.display().to_string()));
        }
        debug!(path = %path.display(), "opening raster");
        geotiff::read(path)
    }

    /// Publish a derived artifact, overwriting any prior one.
    ///
    /// The LTA namespace is slot-keyed, so a date routed there resolves
    /// to its dekad-of-year slot, mirroring [`RasterStore::open`].
    pub fn write(
        &self,
        kind: ProductKind,
        date: NaiveDate,
        raster: &GeoRaster,
    ) -> AnalyticsResult<PathBuf> {
        match kind {
            ProductKind::Lta => self.write_lta(Dekad::containing(date).slot(), raster),
            _ => {
                let path = self.artifact_path(kind, date);
                self.write_atomic(&path, raster)?;
                Ok(path)
            }
        }
    }

    /// Publish a baseline artifact for a slot, overwriting any prior one.
    pub fn write_lta(&self, slot: DekadSlot, raster: &GeoRaster) -> AnalyticsResult<PathBuf> {
        let path = self.lta_path(slot);
        self.write_atomic(&path, raster)?;
        Ok(path)
    }

    /// Write to a temp file in the destination directory, then rename
    /// into place so concurrent readers never observe a partial file.
    fn write_atomic(&self, path: &Path, raster: &GeoRaster) -> AnalyticsResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| AnalyticsError::Storage(format!("no parent dir: {}", path.display())))?;
        fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        geotiff::write_to(tmp.as_file_mut(), raster)?;
        tmp.persist(path)
            .map_err(|e| AnalyticsError::Storage(format!("publish failed: {}", e)))?;

        info!(path = %path.display(), "published raster artifact");
        Ok(())
    }

    /// Dates with a raw observation artifact, sorted ascending.
    pub fn available_dates(&self) -> AnalyticsResult<Vec<NaiveDate>> {
        let raw_dir = self.config.root.join(ProductKind::Raw.dir());
        if !raw_dir.is_dir() {
            return Ok(Vec::new());
        }

        let prefix = format!("{}_", self.config.product);
        let mut dates = Vec::new();

        for entry in WalkDir::new(&raw_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| AnalyticsError::Storage(e.to_string()))?;
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if let Some(date) = parse_raw_file_name(name, &prefix) {
                dates.push(date);
            }
        }

        dates.sort_unstable();
        Ok(dates)
    }
}

/// Parse `prefix_YYYYMMDD.tif` into a date, ignoring anything else.
fn parse_raw_file_name(name: &str, prefix: &str) -> Option<NaiveDate> {
    let stem = name.strip_prefix(prefix)?.strip_suffix(".tif")?;
    NaiveDate::parse_from_str(stem, "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dekad_common::CrsCode;
    use crate::types::GeoTransform;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> (tempfile::TempDir, RasterStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RasterStore::new(StoreConfig::new(dir.path()));
        (dir, store)
    }

    fn raster(values: Vec<f32>, width: usize, height: usize) -> GeoRaster {
        GeoRaster::new(
            values,
            width,
            height,
            GeoTransform::new(30.0, -15.0, 0.1, -0.1),
            CrsCode::Epsg4326,
            Some(-9999.0),
        )
    }

    #[test]
    fn test_artifact_paths() {
        let store = RasterStore::new(StoreConfig::new("/data"));
        let d = date(2002, 3, 21);

        assert_eq!(
            store.artifact_path(ProductKind::Raw, d),
            PathBuf::from("/data/tif/gsod_20020321.tif")
        );
        assert_eq!(
            store.artifact_path(ProductKind::Cog, d),
            PathBuf::from("/data/cog/gsod_20020321_cog.tif")
        );
        assert_eq!(
            store.artifact_path(ProductKind::Anomaly, d),
            PathBuf::from("/data/anom/gsod_20020321_anom.tif")
        );
        assert_eq!(
            store.lta_path(DekadSlot::parse("0321").unwrap()),
            PathBuf::from("/data/lta/gsod_0321_lta.tif")
        );
    }

    #[test]
    fn test_config_validate() {
        assert!(StoreConfig::new("/data").validate().is_ok());

        let mut config = StoreConfig::new("/data");
        config.product = String::new();
        assert!(config.validate().is_err());

        config.product = "a_b".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_write_then_open() {
        let (_dir, store) = store();
        let d = date(2002, 3, 21);

        store
            .write(ProductKind::Anomaly, d, &raster(vec![1.0, 2.0], 2, 1))
            .unwrap();
        let opened = store.open(ProductKind::Anomaly, d).unwrap();
        assert_eq!(opened.data, vec![1.0, 2.0]);
    }

    #[test]
    fn test_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.open(ProductKind::Raw, date(2002, 3, 21)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_overwrite_is_idempotent() {
        let (_dir, store) = store();
        let slot = DekadSlot::parse("0101").unwrap();

        store.write_lta(slot, &raster(vec![1.0], 1, 1)).unwrap();
        store.write_lta(slot, &raster(vec![2.0], 1, 1)).unwrap();

        let opened = store.open_lta(slot).unwrap();
        assert_eq!(opened.data, vec![2.0]);
    }

    #[test]
    fn test_no_temp_residue_after_publish() {
        let (dir, store) = store();
        store
            .write(ProductKind::Cog, date(2002, 1, 1), &raster(vec![1.0], 1, 1))
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("cog"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["gsod_20020101_cog.tif".to_string()]);
    }

    #[test]
    fn test_available_dates_sorted() {
        let (_dir, store) = store();
        for d in [date(2002, 3, 21), date(2001, 1, 1), date(2002, 1, 11)] {
            store.write(ProductKind::Raw, d, &raster(vec![1.0], 1, 1)).unwrap();
        }
        // a stray file that should be ignored
        std::fs::write(
            store.config().root.join("tif").join("notes.txt"),
            b"ignore me",
        )
        .unwrap();

        let dates = store.available_dates().unwrap();
        assert_eq!(
            dates,
            vec![date(2001, 1, 1), date(2002, 1, 11), date(2002, 3, 21)]
        );
    }

    #[test]
    fn test_open_event_prefers_cog() {
        let (_dir, store) = store();
        let d = date(2002, 3, 21);

        store.write(ProductKind::Raw, d, &raster(vec![1.0], 1, 1)).unwrap();
        assert_eq!(store.open_event(d).unwrap().data, vec![1.0]);

        store.write(ProductKind::Cog, d, &raster(vec![7.0], 1, 1)).unwrap();
        assert_eq!(store.open_event(d).unwrap().data, vec![7.0]);
    }
}
