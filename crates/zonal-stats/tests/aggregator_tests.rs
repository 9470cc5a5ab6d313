//! Integration tests for the zonal aggregator against a real on-disk
//! artifact store and the GeoJSON-loaded catalog.

use dekad_common::{AnalyticsError, CancelToken, ProductKind};
use region_catalog::RegionCatalog;
use test_utils::{constant_grid, date, geojson_catalog, ramp_grid, test_raster, TestStore};
use zonal_stats::{RangeOutcome, ZonalAggregator, ZonalOutcome};

/// One square region covering the top-left 2x2 pixels of the fixture
/// grid (pixel centers 30.5/31.5 by -15.5/-16.5).
fn harare_catalog() -> RegionCatalog {
    geojson_catalog(&[("Harare", 30.0, -17.0, 32.0, -15.0)])
}

#[test]
fn test_stats_for_date_scenario() {
    let fixture = TestStore::new();
    let catalog = harare_catalog();

    // in-polygon values 10, 20, 30 and one no-data pixel
    let mut values = vec![0.0f32; 16];
    values[0] = 10.0;
    values[1] = 20.0;
    values[4] = 30.0;
    values[5] = f32::NAN;
    fixture.put_raw(date(2002, 3, 21), &test_raster(values, 4, 4));

    let aggregator = ZonalAggregator::new(&fixture.store, &catalog);
    let outcome = aggregator
        .stats_for_date(ProductKind::Raw, date(2002, 3, 21), "Harare")
        .unwrap();

    let stats = outcome.stats().expect("expected statistics");
    assert!((stats.mean - 20.0).abs() < 1e-9);
    assert_eq!(stats.min, 10.0);
    assert_eq!(stats.max, 30.0);
    assert_eq!(stats.count, 3);
}

#[test]
fn test_all_masked_pixels_is_no_data() {
    let fixture = TestStore::new();
    let catalog = harare_catalog();

    // every in-polygon pixel is NaN
    let mut values = vec![1.0f32; 16];
    for i in [0, 1, 4, 5] {
        values[i] = f32::NAN;
    }
    fixture.put_raw(date(2002, 3, 21), &test_raster(values, 4, 4));

    let aggregator = ZonalAggregator::new(&fixture.store, &catalog);
    let outcome = aggregator
        .stats_for_date(ProductKind::Raw, date(2002, 3, 21), "Harare")
        .unwrap();
    assert_eq!(outcome, ZonalOutcome::NoData);
}

#[test]
fn test_missing_artifact_is_not_found() {
    let fixture = TestStore::new();
    let catalog = harare_catalog();

    let aggregator = ZonalAggregator::new(&fixture.store, &catalog);
    let err = aggregator
        .stats_for_date(ProductKind::Raw, date(2002, 3, 21), "Harare")
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_unknown_region_is_not_found() {
    let fixture = TestStore::new();
    let catalog = harare_catalog();
    fixture.put_raw(date(2002, 3, 21), &ramp_grid(4, 4));

    let aggregator = ZonalAggregator::new(&fixture.store, &catalog);
    let err = aggregator
        .stats_for_date(ProductKind::Raw, date(2002, 3, 21), "Gweru")
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_range_skips_missing_days() {
    let fixture = TestStore::new();
    let catalog = harare_catalog();

    // artifacts on the 1st and 3rd only
    fixture.put_raw(date(2002, 3, 1), &constant_grid(4, 4, 5.0));
    fixture.put_raw(date(2002, 3, 3), &constant_grid(4, 4, 7.0));

    let aggregator = ZonalAggregator::new(&fixture.store, &catalog);
    let outcome = aggregator
        .stats_for_range(
            ProductKind::Raw,
            date(2002, 3, 1),
            date(2002, 3, 3),
            "Harare",
            &CancelToken::new(),
        )
        .unwrap();

    let RangeOutcome::Series { daily, aggregate } = outcome else {
        panic!("expected a series");
    };
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0].date, date(2002, 3, 1));
    assert_eq!(daily[1].date, date(2002, 3, 3));
    assert!((daily[0].stats.mean - 5.0).abs() < 1e-9);

    // pooled population: 4 pixels at 5.0 plus 4 pixels at 7.0
    assert_eq!(aggregate.count, 8);
    assert!((aggregate.mean - 6.0).abs() < 1e-9);
}

#[test]
fn test_range_with_no_artifacts_is_no_data() {
    let fixture = TestStore::new();
    let catalog = harare_catalog();

    let aggregator = ZonalAggregator::new(&fixture.store, &catalog);
    let outcome = aggregator
        .stats_for_range(
            ProductKind::Raw,
            date(2002, 3, 1),
            date(2002, 3, 10),
            "Harare",
            &CancelToken::new(),
        )
        .unwrap();
    assert_eq!(outcome, RangeOutcome::NoData);
}

#[test]
fn test_range_rejects_inverted_dates() {
    let fixture = TestStore::new();
    let catalog = harare_catalog();

    let aggregator = ZonalAggregator::new(&fixture.store, &catalog);
    let err = aggregator
        .stats_for_range(
            ProductKind::Raw,
            date(2002, 3, 10),
            date(2002, 3, 1),
            "Harare",
            &CancelToken::new(),
        )
        .unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidInput(_)));
}

#[test]
fn test_cancelled_range_scan() {
    let fixture = TestStore::new();
    let catalog = harare_catalog();
    fixture.put_raw(date(2002, 3, 1), &constant_grid(4, 4, 5.0));

    let cancel = CancelToken::new();
    cancel.cancel();

    let aggregator = ZonalAggregator::new(&fixture.store, &catalog);
    let err = aggregator
        .stats_for_range(
            ProductKind::Raw,
            date(2002, 3, 1),
            date(2002, 3, 31),
            "Harare",
            &cancel,
        )
        .unwrap_err();
    assert!(matches!(err, AnalyticsError::Cancelled));
}

#[test]
fn test_areal_total_by_region_scenario() {
    let fixture = TestStore::new();
    // second region sits entirely outside the 4x4 fixture grid
    let catalog = geojson_catalog(&[
        ("Harare", 30.0, -17.0, 32.0, -15.0),
        ("Matabeleland", 40.0, -17.0, 42.0, -15.0),
    ]);

    // daily regional means 5.0, (missing), 7.0
    fixture.put_raw(date(2002, 3, 1), &constant_grid(4, 4, 5.0));
    fixture.put_raw(date(2002, 3, 3), &constant_grid(4, 4, 7.0));

    let aggregator = ZonalAggregator::new(&fixture.store, &catalog);
    let totals = aggregator
        .areal_total_by_region(
            ProductKind::Raw,
            date(2002, 3, 1),
            date(2002, 3, 3),
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(totals.len(), 2);

    let harare = &totals[0];
    assert_eq!(harare.region, "Harare");
    assert_eq!(harare.days_used, 2);
    assert!((harare.areal_total.unwrap() - 12.0).abs() < 1e-9);
    assert!((harare.mean_daily_value.unwrap() - 6.0).abs() < 1e-9);

    // a region with zero contributing days reports absence, not zero
    let outside = &totals[1];
    assert_eq!(outside.days_used, 0);
    assert!(outside.areal_total.is_none());
    assert!(outside.mean_daily_value.is_none());
}
