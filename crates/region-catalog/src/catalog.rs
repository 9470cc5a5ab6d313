//! Catalog loading and name resolution.

use std::collections::HashMap;
use std::path::Path;

use geojson::{GeoJson, Value};
use tracing::info;

use dekad_common::{AnalyticsError, AnalyticsResult, CrsCode};

use crate::geometry::{Region, RingPolygon};

/// Feature property holding the region name in admin-boundary files.
const DEFAULT_NAME_FIELD: &str = "NAME_1";

/// The set of administrative regions, loaded once and immutable.
///
/// Region names are unique; load fails on duplicates. Iteration order is
/// the feature order of the source file, which keeps catalog-wide
/// aggregations deterministic.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    regions: Vec<Region>,
    by_name: HashMap<String, usize>,
    crs: CrsCode,
}

impl RegionCatalog {
    /// Load the catalog from a GeoJSON FeatureCollection file.
    pub fn load(path: impl AsRef<Path>) -> AnalyticsResult<Self> {
        Self::load_with_name_field(path, DEFAULT_NAME_FIELD)
    }

    /// Load the catalog, taking region names from the given property.
    pub fn load_with_name_field(
        path: impl AsRef<Path>,
        name_field: &str,
    ) -> AnalyticsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AnalyticsError::not_found(path.display().to_string())
            } else {
                AnalyticsError::Storage(e.to_string())
            }
        })?;
        let catalog = Self::from_geojson_str(&text, name_field)?;
        info!(
            path = %path.display(),
            regions = catalog.len(),
            "loaded region catalog"
        );
        Ok(catalog)
    }

    /// Build the catalog from GeoJSON text.
    ///
    /// GeoJSON geographic coordinates are WGS84 by specification, so the
    /// catalog's native reference is EPSG:4326.
    pub fn from_geojson_str(text: &str, name_field: &str) -> AnalyticsResult<Self> {
        let geojson: GeoJson = text
            .parse()
            .map_err(|e| AnalyticsError::invalid_input(format!("invalid GeoJSON: {}", e)))?;

        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(AnalyticsError::invalid_input(
                "region file must be a GeoJSON FeatureCollection",
            ));
        };

        let crs = CrsCode::Epsg4326;
        let mut regions = Vec::with_capacity(collection.features.len());
        let mut by_name = HashMap::new();

        for (index, feature) in collection.features.into_iter().enumerate() {
            let name = feature
                .properties
                .as_ref()
                .and_then(|props| props.get(name_field))
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    AnalyticsError::invalid_input(format!(
                        "feature {} has no string property {:?}",
                        index, name_field
                    ))
                })?
                .to_string();

            let geometry = feature.geometry.ok_or_else(|| {
                AnalyticsError::invalid_input(format!("feature {:?} has no geometry", name))
            })?;

            let polygons = polygons_from_geometry(&name, geometry.value)?;

            if by_name.insert(name.clone(), regions.len()).is_some() {
                return Err(AnalyticsError::invalid_input(format!(
                    "duplicate region name {:?}",
                    name
                )));
            }
            regions.push(Region {
                name,
                polygons,
                crs,
            });
        }

        Ok(Self {
            regions,
            by_name,
            crs,
        })
    }

    /// Resolve a region by exact name.
    pub fn resolve(&self, name: &str) -> AnalyticsResult<&Region> {
        self.by_name
            .get(name)
            .map(|&i| &self.regions[i])
            .ok_or_else(|| AnalyticsError::not_found(format!("region {:?}", name)))
    }

    /// All regions in source-file order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// Native coordinate reference of the catalog geometries.
    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn polygons_from_geometry(name: &str, value: Value) -> AnalyticsResult<Vec<RingPolygon>> {
    match value {
        Value::Polygon(rings) => Ok(vec![rings_to_polygon(rings)]),
        Value::MultiPolygon(parts) => Ok(parts.into_iter().map(rings_to_polygon).collect()),
        other => Err(AnalyticsError::invalid_input(format!(
            "region {:?} has unsupported geometry type {}",
            name,
            geometry_type_name(&other)
        ))),
    }
}

fn geometry_type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn rings_to_polygon(rings: Vec<Vec<Vec<f64>>>) -> RingPolygon {
    let mut iter = rings.into_iter().map(|ring| {
        ring.into_iter()
            .filter(|pos| pos.len() >= 2)
            .map(|pos| (pos[0], pos[1]))
            .collect::<Vec<_>>()
    });

    let exterior = iter.next().unwrap_or_default();
    RingPolygon {
        exterior,
        holes: iter.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_REGIONS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"NAME_1": "Harare"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[30.8, -18.0], [31.3, -18.0], [31.3, -17.6], [30.8, -17.6], [30.8, -18.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"NAME_1": "Bulawayo"},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[28.4, -20.3], [28.7, -20.3], [28.7, -20.0], [28.4, -20.0], [28.4, -20.3]]]
                    ]
                }
            }
        ]
    }"#;

    #[test]
    fn test_load_and_resolve() {
        let catalog = RegionCatalog::from_geojson_str(TWO_REGIONS, "NAME_1").unwrap();
        assert_eq!(catalog.len(), 2);

        let harare = catalog.resolve("Harare").unwrap();
        assert!(harare.contains_point(31.05, -17.83));
        assert!(!harare.contains_point(28.5, -20.1));

        let bulawayo = catalog.resolve("Bulawayo").unwrap();
        assert!(bulawayo.contains_point(28.55, -20.15));
    }

    #[test]
    fn test_unknown_region_is_not_found() {
        let catalog = RegionCatalog::from_geojson_str(TWO_REGIONS, "NAME_1").unwrap();
        let err = catalog.resolve("Gweru").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_iteration_preserves_source_order() {
        let catalog = RegionCatalog::from_geojson_str(TWO_REGIONS, "NAME_1").unwrap();
        let names: Vec<_> = catalog.regions().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Harare", "Bulawayo"]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let duplicated = TWO_REGIONS.replace("Bulawayo", "Harare");
        let err = RegionCatalog::from_geojson_str(&duplicated, "NAME_1").unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidInput(_)));
    }

    #[test]
    fn test_missing_name_property_rejected() {
        let err = RegionCatalog::from_geojson_str(TWO_REGIONS, "PROVINCE").unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidInput(_)));
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let err = RegionCatalog::load("/nonexistent/admin1.geojson").unwrap_err();
        assert!(err.is_not_found());
    }
}
