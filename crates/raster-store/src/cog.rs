//! Lazy COG materialization.
//!
//! The optimized namespace is a cache derived from the raw namespace,
//! keyed by source date. Materialization is idempotent: an artifact that
//! is already published is returned untouched, and publication itself
//! goes through the store's temp-then-rename path.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use dekad_common::{AnalyticsResult, ProductKind};

use crate::store::RasterStore;

/// Outcome of a bulk materialization sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CogSweep {
    /// Dates materialized by this sweep.
    pub materialized: usize,
    /// Dates whose artifact already existed.
    pub already_present: usize,
    /// Dates skipped because the raw artifact failed to open.
    pub failed: usize,
}

impl RasterStore {
    /// Materialize the optimized copy of the raw raster for `date`.
    ///
    /// Returns the artifact path. When the copy is already published the
    /// existing artifact is returned without rewriting.
    pub fn ensure_cog(&self, date: NaiveDate) -> AnalyticsResult<PathBuf> {
        let path = self.artifact_path(ProductKind::Cog, date);
        if path.exists() {
            debug!(path = %path.display(), "optimized copy already published");
            return Ok(path);
        }

        let raster = self.open(ProductKind::Raw, date)?;
        let path = self.write(ProductKind::Cog, date, &raster)?;
        info!(date = %date, "materialized optimized copy");
        Ok(path)
    }

    /// Materialize optimized copies for every available raw date.
    ///
    /// A date whose raw artifact fails to open is logged and skipped;
    /// the sweep continues.
    pub fn ensure_all_cogs(&self) -> AnalyticsResult<CogSweep> {
        let mut sweep = CogSweep::default();

        for date in self.available_dates()? {
            if self.exists(ProductKind::Cog, date) {
                sweep.already_present += 1;
                continue;
            }
            match self.ensure_cog(date) {
                Ok(_) => sweep.materialized += 1,
                Err(err) => {
                    warn!(date = %date, error = %err, "skipping date in COG sweep");
                    sweep.failed += 1;
                }
            }
        }

        Ok(sweep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreConfig;
    use crate::types::{GeoRaster, GeoTransform};
    use dekad_common::CrsCode;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store_with_raw(dates: &[NaiveDate]) -> (tempfile::TempDir, RasterStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RasterStore::new(StoreConfig::new(dir.path()));
        for &d in dates {
            let raster = GeoRaster::new(
                vec![3.0, 4.0],
                2,
                1,
                GeoTransform::default(),
                CrsCode::Epsg4326,
                None,
            );
            store.write(ProductKind::Raw, d, &raster).unwrap();
        }
        (dir, store)
    }

    #[test]
    fn test_ensure_cog_materializes_once() {
        let d = date(2002, 3, 21);
        let (_dir, store) = store_with_raw(&[d]);

        let path = store.ensure_cog(d).unwrap();
        assert!(path.exists());
        let first_mtime = std::fs::metadata(&path).unwrap().modified().unwrap();

        // second call must not rewrite the artifact
        store.ensure_cog(d).unwrap();
        let second_mtime = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(first_mtime, second_mtime);
    }

    #[test]
    fn test_ensure_cog_missing_raw() {
        let (_dir, store) = store_with_raw(&[]);
        let err = store.ensure_cog(date(2002, 3, 21)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_sweep_counts() {
        let dates = [date(2002, 1, 1), date(2002, 1, 11)];
        let (_dir, store) = store_with_raw(&dates);

        store.ensure_cog(dates[0]).unwrap();
        let sweep = store.ensure_all_cogs().unwrap();
        assert_eq!(sweep.materialized, 1);
        assert_eq!(sweep.already_present, 1);
        assert_eq!(sweep.failed, 0);
    }
}
