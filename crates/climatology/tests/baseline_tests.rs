//! Integration tests for baseline construction against an on-disk store.

use climatology::{BaselineBuilder, YearRange};
use dekad_common::{AnalyticsError, DekadSlot};
use test_utils::{constant_grid, date, grid_with_nans, test_raster, TestStore};

fn years(start: i32, end: i32) -> YearRange {
    YearRange::new(start, end).unwrap()
}

#[test]
fn test_lta_pixelwise_mean_skips_nodata_years() {
    let fixture = TestStore::new();
    let slot = DekadSlot::parse("0321").unwrap();

    // pixel (0,0) observes 10, 20, nodata across 2001-2003
    fixture.put_raw(date(2001, 3, 21), &constant_grid(2, 2, 10.0));
    fixture.put_raw(date(2002, 3, 21), &constant_grid(2, 2, 20.0));
    fixture.put_raw(date(2003, 3, 21), &grid_with_nans(2, 2, 30.0, &[0]));

    let builder = BaselineBuilder::new(&fixture.store, years(2001, 2003));
    let lta = builder.build_slot(slot).unwrap();

    // pixel (0,0): mean of the two valid years
    assert!((lta.get(0, 0).unwrap() - 15.0).abs() < 1e-6);
    // other pixels: all three years contribute
    assert!((lta.get(1, 1).unwrap() - 20.0).abs() < 1e-6);
}

#[test]
fn test_lta_all_years_invalid_pixel_is_nodata() {
    let fixture = TestStore::new();
    let slot = DekadSlot::parse("0101").unwrap();

    fixture.put_raw(date(2001, 1, 1), &grid_with_nans(2, 1, 5.0, &[1]));
    fixture.put_raw(date(2002, 1, 1), &grid_with_nans(2, 1, 7.0, &[1]));

    let builder = BaselineBuilder::new(&fixture.store, years(2001, 2002));
    let lta = builder.build_slot(slot).unwrap();

    assert!((lta.get(0, 0).unwrap() - 6.0).abs() < 1e-6);
    assert!(lta.get(1, 0).unwrap().is_nan());
}

#[test]
fn test_missing_years_are_skipped() {
    let fixture = TestStore::new();
    let slot = DekadSlot::parse("0311").unwrap();

    // only 2002 exists inside a five-year range
    fixture.put_raw(date(2002, 3, 11), &constant_grid(2, 2, 42.0));

    let builder = BaselineBuilder::new(&fixture.store, years(2000, 2004));
    let lta = builder.build_slot(slot).unwrap();
    assert!((lta.get(0, 0).unwrap() - 42.0).abs() < 1e-6);
}

#[test]
fn test_zero_contributing_years_is_insufficient_data() {
    let fixture = TestStore::new();
    let builder = BaselineBuilder::new(&fixture.store, years(2001, 2003));

    let err = builder
        .build_slot(DekadSlot::parse("0601").unwrap())
        .unwrap_err();
    assert!(matches!(err, AnalyticsError::InsufficientData(_)));
}

#[test]
fn test_rebuild_is_bit_identical() {
    let fixture = TestStore::new();
    let slot = DekadSlot::parse("0321").unwrap();

    fixture.put_raw(date(2001, 3, 21), &test_raster(vec![1.5, 2.5, 3.5, 4.5], 2, 2));
    fixture.put_raw(date(2002, 3, 21), &test_raster(vec![2.5, 3.5, 4.5, 5.5], 2, 2));
    fixture.put_raw(date(2003, 3, 21), &grid_with_nans(2, 2, 9.0, &[2]));

    let builder = BaselineBuilder::new(&fixture.store, years(2001, 2003));
    let first = builder.build_slot(slot).unwrap();
    let second = builder.build_slot(slot).unwrap();

    assert_eq!(first.data.len(), second.data.len());
    for (a, b) in first.data.iter().zip(&second.data) {
        assert_eq!(a.to_bits(), b.to_bits());
    }

    // and the persisted artifact matches what was returned
    let stored = fixture.store.open_lta(slot).unwrap();
    for (a, b) in stored.data.iter().zip(&second.data) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn test_mismatched_dimensions_year_is_skipped() {
    let fixture = TestStore::new();
    let slot = DekadSlot::parse("0111").unwrap();

    fixture.put_raw(date(2001, 1, 11), &constant_grid(2, 2, 10.0));
    // wrong grid size, must not poison the stack
    fixture.put_raw(date(2002, 1, 11), &constant_grid(3, 3, 99.0));

    let builder = BaselineBuilder::new(&fixture.store, years(2001, 2002));
    let lta = builder.build_slot(slot).unwrap();

    assert_eq!(lta.width, 2);
    assert!((lta.get(0, 0).unwrap() - 10.0).abs() < 1e-6);
}

#[test]
fn test_build_all_reports_empty_slots() {
    let fixture = TestStore::new();

    fixture.put_raw(date(2001, 3, 21), &constant_grid(2, 2, 1.0));
    fixture.put_raw(date(2001, 7, 1), &constant_grid(2, 2, 2.0));

    let builder = BaselineBuilder::new(&fixture.store, years(2001, 2001));
    let report = builder.build_all().unwrap();

    assert_eq!(report.built.len(), 2);
    assert!(report.built.contains(&"0321".to_string()));
    assert!(report.built.contains(&"0701".to_string()));
    assert_eq!(report.empty.len(), 34);
}

#[test]
fn test_year_range_validation() {
    assert!(YearRange::new(2005, 2001).is_err());
    assert!(YearRange::new(2001, 2001).is_ok());
}
