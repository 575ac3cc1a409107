//! Region boundary loading from GeoJSON.
//!
//! Reads Polygon/MultiPolygon features (GADM level-0 layout), honors the
//! optional `crs` member and reprojects rings to the raster CRS.

use std::path::Path;

use projection::Transformer;
use serde::Deserialize;
use terrain_common::{BoundingBox, CrsCode};
use tracing::{debug, info, warn};

use crate::error::{GridProcessorError, Result};

/// A closed ring of (x, y) vertices.
pub type Ring = Vec<(f64, f64)>;

/// One polygon: the exterior ring followed by any holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    /// Even-odd point-in-polygon over all rings, so holes are excluded.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let mut inside = false;
        for ring in &self.rings {
            if ring.len() < 3 {
                continue;
            }
            let mut j = ring.len() - 1;
            for i in 0..ring.len() {
                let (xi, yi) = ring[i];
                let (xj, yj) = ring[j];
                if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                    inside = !inside;
                }
                j = i;
            }
        }
        inside
    }

    /// Extent of the exterior ring.
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.rings
            .first()
            .and_then(|ring| BoundingBox::from_points(ring.iter().copied()))
    }
}

/// A region outline in a known CRS.
#[derive(Debug, Clone)]
pub struct Boundary {
    pub polygons: Vec<Polygon>,
    pub crs: CrsCode,
}

impl Boundary {
    /// Read a boundary file and reproject it to `target`.
    pub fn load_reprojected(path: &Path, target: CrsCode) -> Result<Self> {
        let boundary = Self::load(path)?.to_crs(target)?;
        let bbox = boundary.bbox()?;
        info!(
            path = %path.display(),
            crs = %boundary.crs,
            polygons = boundary.polygons.len(),
            bbox = %bbox,
            "Loaded boundary"
        );
        Ok(boundary)
    }

    /// Read a boundary file in its own CRS.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GridProcessorError::boundary_load(format!("{}: {}", path.display(), e))
        })?;
        Self::from_geojson_str(&text)
            .map_err(|e| match e {
                GridProcessorError::BoundaryLoad(msg) => {
                    GridProcessorError::boundary_load(format!("{}: {}", path.display(), msg))
                }
                other => other,
            })
    }

    /// Parse a GeoJSON FeatureCollection or single Feature.
    pub fn from_geojson_str(text: &str) -> Result<Self> {
        let doc: GeoJson = serde_json::from_str(text)
            .map_err(|e| GridProcessorError::boundary_load(format!("invalid GeoJSON: {}", e)))?;

        let (features, crs) = match doc {
            GeoJson::FeatureCollection { features, crs } => (features, crs),
            GeoJson::Feature(feature) => {
                let crs = feature.crs.clone();
                (vec![feature], crs)
            }
        };

        let crs = match crs {
            Some(named) => CrsCode::parse(&named.properties.name)
                .map_err(|e| GridProcessorError::boundary_load(e.to_string()))?,
            None => CrsCode::Epsg4326,
        };

        let mut polygons = Vec::new();
        for (idx, feature) in features.into_iter().enumerate() {
            match feature.geometry {
                Some(Geometry::Polygon { coordinates }) => {
                    polygons.push(polygon_from_coords(coordinates)?);
                }
                Some(Geometry::MultiPolygon { coordinates }) => {
                    for poly in coordinates {
                        polygons.push(polygon_from_coords(poly)?);
                    }
                }
                Some(Geometry::Unsupported) | None => {
                    warn!(feature = idx, "Skipping feature without polygon geometry");
                }
            }
        }

        if polygons.is_empty() {
            return Err(GridProcessorError::invalid_geometry(
                "boundary contains no polygon features",
            ));
        }

        debug!(polygons = polygons.len(), crs = %crs, "Parsed boundary");
        Ok(Self { polygons, crs })
    }

    /// Reproject every vertex to `target`.
    pub fn to_crs(mut self, target: CrsCode) -> Result<Self> {
        if self.crs == target {
            return Ok(self);
        }
        let transformer = Transformer::new(self.crs, target);
        for polygon in &mut self.polygons {
            for ring in &mut polygon.rings {
                transformer.transform_in_place(ring)?;
            }
        }
        debug!(from = %self.crs, to = %target, "Reprojected boundary");
        self.crs = target;
        Ok(self)
    }

    /// Error unless the boundary is already in `expected`.
    pub fn require_crs(&self, expected: CrsCode) -> Result<()> {
        if self.crs == expected {
            Ok(())
        } else {
            Err(GridProcessorError::CrsMismatch {
                expected,
                actual: self.crs,
            })
        }
    }

    /// Total bounds over all polygons. Always finite with min < max.
    pub fn bbox(&self) -> Result<BoundingBox> {
        let bbox = BoundingBox::from_points(
            self.polygons
                .iter()
                .flat_map(|p| p.rings.iter())
                .flat_map(|r| r.iter().copied()),
        )
        .filter(BoundingBox::is_valid)
        .ok_or_else(|| GridProcessorError::invalid_geometry("boundary has an empty extent"))?;
        Ok(bbox)
    }

    /// True when (x, y) is inside any member polygon.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.polygons.iter().any(|p| p.contains(x, y))
    }

    /// All rings of all polygons.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.polygons.iter().flat_map(|p| p.rings.iter())
    }
}

fn polygon_from_coords(rings: Vec<Vec<Vec<f64>>>) -> Result<Polygon> {
    if rings.is_empty() {
        return Err(GridProcessorError::invalid_geometry("polygon without rings"));
    }

    let rings = rings
        .into_iter()
        .map(|ring| {
            let ring: Ring = ring
                .into_iter()
                .map(|pos| match pos.as_slice() {
                    [x, y, ..] if x.is_finite() && y.is_finite() => Ok((*x, *y)),
                    _ => Err(GridProcessorError::invalid_geometry(format!(
                        "invalid position {:?}",
                        pos
                    ))),
                })
                .collect::<Result<_>>()?;
            if ring.len() < 3 {
                return Err(GridProcessorError::invalid_geometry(format!(
                    "ring has {} vertices, need at least 3",
                    ring.len()
                )));
            }
            Ok(ring)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Polygon { rings })
}

// ============================================================================
// GeoJSON document model
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoJson {
    FeatureCollection {
        features: Vec<Feature>,
        #[serde(default)]
        crs: Option<NamedCrs>,
    },
    Feature(Feature),
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
    #[serde(default)]
    crs: Option<NamedCrs>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
struct NamedCrs {
    properties: NamedCrsProperties,
}

#[derive(Debug, Clone, Deserialize)]
struct NamedCrsProperties {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE_WITH_HOLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"GID_0": "ROU"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [
                    [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                    [[4, 4], [6, 4], [6, 6], [4, 6], [4, 4]]
                ]
            }
        }]
    }"#;

    #[test]
    fn test_parse_polygon_with_hole() {
        let boundary = Boundary::from_geojson_str(SQUARE_WITH_HOLE).unwrap();
        assert_eq!(boundary.crs, CrsCode::Epsg4326);
        assert_eq!(boundary.polygons.len(), 1);
        assert!(boundary.contains(1.0, 1.0));
        assert!(!boundary.contains(5.0, 5.0), "hole must be excluded");
        assert!(!boundary.contains(11.0, 5.0));
        assert_eq!(boundary.bbox().unwrap(), BoundingBox::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_parse_multipolygon_feature_with_crs() {
        let json = r#"{
            "type": "Feature",
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::4326"}},
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [
                    [[[0, 0], [1, 0], [1, 1], [0, 0]]],
                    [[[5, 5], [6, 5], [6, 6], [5, 5]]]
                ]
            }
        }"#;
        let boundary = Boundary::from_geojson_str(json).unwrap();
        assert_eq!(boundary.polygons.len(), 2);
        assert_eq!(boundary.rings().count(), 2);
        assert_eq!(boundary.bbox().unwrap(), BoundingBox::new(0.0, 0.0, 6.0, 6.0));
    }

    #[test]
    fn test_no_polygons_is_invalid_geometry() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 2]}}
        ]}"#;
        assert!(matches!(
            Boundary::from_geojson_str(json),
            Err(GridProcessorError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_boundary_load() {
        assert!(matches!(
            Boundary::from_geojson_str("{not json"),
            Err(GridProcessorError::BoundaryLoad(_))
        ));
    }

    #[test]
    fn test_missing_file_is_boundary_load() {
        let result = Boundary::load(Path::new("/nonexistent/gadm41_ROU_0.json"));
        assert!(matches!(result, Err(GridProcessorError::BoundaryLoad(_))));
    }

    #[test]
    fn test_reproject_from_stereo70() {
        let json = r#"{
            "type": "FeatureCollection",
            "crs": {"type": "name", "properties": {"name": "EPSG:3844"}},
            "features": [{"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [
                [[400000, 400000], [600000, 400000], [600000, 600000], [400000, 600000], [400000, 400000]]
            ]}}]
        }"#;
        let boundary = Boundary::from_geojson_str(json).unwrap();
        assert!(boundary.require_crs(CrsCode::Epsg4326).is_err());

        let boundary = boundary.to_crs(CrsCode::Epsg4326).unwrap();
        boundary.require_crs(CrsCode::Epsg4326).unwrap();

        let bbox = boundary.bbox().unwrap();
        assert!(bbox.is_valid());
        assert!(bbox.contains_point(25.0, 46.0), "bbox {} should contain origin", bbox);
        assert!(bbox.width() < 3.0 && bbox.height() < 2.0);
    }
}
