//! Shared test fixtures for the dekadal-analytics workspace.

pub mod fixtures;
pub mod generators;

pub use fixtures::{date, geojson_catalog, TestStore};
pub use generators::{constant_grid, grid_with_nans, ramp_grid, test_raster};
