//! Raster artifact store.
//!
//! Resolves (product, date) pairs to GeoTIFF artifacts on a local
//! durable-storage root and exposes typed pixel access with the no-data
//! sentinel already substituted by NaN. Derived artifacts (COG copies,
//! baselines, anomalies) are published with write-to-temp-then-rename so
//! readers never observe partial files.
//!
//! Namespace layout under the store root, for product prefix `gsod`:
//!
//! ```text
//! tif/gsod_20020321.tif        raw observation, date-keyed
//! cog/gsod_20020321_cog.tif    optimized copy, derived lazily
//! lta/gsod_0321_lta.tif        baseline, dekad-of-year keyed
//! anom/gsod_20020321_anom.tif  anomaly, event-date keyed
//! ```

pub mod cog;
pub mod geotiff;
pub mod store;
pub mod types;

pub use store::{RasterStore, StoreConfig};
pub use types::{GeoRaster, GeoTransform};
