//! Shapefile polygon input.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::{dbase::{FieldValue, Record}, PolygonRing, Reader, Shape};

use crate::geom::{Crs, PolygonSet};

/// Read the polygons of a `.shp` file.
///
/// Identifiers come from the dBase field `id_field` when given. The CRS is
/// `crs` when given, otherwise guessed from a geographic `.prj` sidecar;
/// projected `.prj` files are not interpreted and leave the CRS unset.
pub fn read_shapefile(path: &Path, id_field: Option<&str>, crs: Option<Crs>) -> Result<PolygonSet> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("[io::shp] Failed to open shapefile: {}", path.display()))?;

    let mut shapes = Vec::with_capacity(reader.shape_count()?);
    let mut ids = Vec::new();
    for (i, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result.context("[io::shp] Error reading shape+record")?;
        shapes.push(shape_to_geo(shape).with_context(|| format!("[io::shp] Invalid shape {i}"))?);
        if let Some(field) = id_field {
            ids.push(record_id(&record, field).with_context(|| format!("[io::shp] Invalid record {i}"))?);
        }
    }

    let crs = crs.or_else(|| crs_from_prj(&path.with_extension("prj")));
    let set = PolygonSet::new(shapes, crs);
    Ok(if id_field.is_some() { set.with_ids(ids)? } else { set })
}

/// Get an identifier from a character or numeric dBase field.
fn record_id(record: &Record, field: &str) -> Result<String> {
    match record.get(field) {
        Some(FieldValue::Character(Some(s))) => Ok(s.trim().to_string()),
        Some(FieldValue::Numeric(Some(n))) => Ok(n.to_string()),
        Some(FieldValue::Integer(n)) => Ok(n.to_string()),
        _ => bail!("missing or invalid identifier field: {field}"),
    }
}

/// Convert a polygon (or null) shape; other shape types are rejected.
fn shape_to_geo(shape: Shape) -> Result<MultiPolygon<f64>> {
    match shape {
        Shape::Polygon(polygon) => Ok(polygon_to_geo(polygon.rings())),
        Shape::NullShape => Ok(MultiPolygon(Vec::new())),
        other => bail!("unsupported shape type {:?}; only polygons are accepted", other.shapetype()),
    }
}

/// Group rings into polygons: each outer ring owns the inner rings that follow it.
fn polygon_to_geo(rings: &[PolygonRing<shapefile::Point>]) -> MultiPolygon<f64> {
    let ring = |points: &[shapefile::Point]| {
        let mut coords = points.iter().map(|p| Coord { x: p.x, y: p.y }).collect::<Vec<_>>();
        if coords.first() != coords.last() {
            coords.push(coords[0]);
        }
        LineString(coords)
    };

    let mut polygons: Vec<Polygon<f64>> = Vec::new();
    for shp_ring in rings {
        match (shp_ring, polygons.last_mut()) {
            (PolygonRing::Inner(points), Some(current)) => current.interiors_push(ring(points.as_slice())),
            // An inner ring with no outer ring before it is treated as an outer ring.
            (PolygonRing::Outer(points) | PolygonRing::Inner(points), _) => {
                polygons.push(Polygon::new(ring(points.as_slice()), Vec::new()))
            }
        }
    }

    MultiPolygon(polygons)
}

/// Recognize the common geographic `.prj` definitions.
fn crs_from_prj(path: &Path) -> Option<Crs> {
    let wkt = fs::read_to_string(path).ok()?;
    if !wkt.trim_start().starts_with("GEOGCS") {
        return None
    }
    if wkt.contains("North_American_1983") {
        Some(Crs::NAD83)
    } else if wkt.contains("WGS_1984") || wkt.contains("WGS 84") {
        Some(Crs::WGS84)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;
    use shapefile::Point;

    fn points(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn rings_are_grouped_into_polygons() {
        let rings = vec![
            PolygonRing::Outer(points(&[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0), (0.0, 0.0)])),
            PolygonRing::Inner(points(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0), (1.0, 1.0)])),
            PolygonRing::Outer(points(&[(10.0, 0.0), (10.0, 1.0), (11.0, 1.0), (11.0, 0.0)])),
        ];
        let shape = polygon_to_geo(&rings);

        assert_eq!(shape.0.len(), 2);
        assert_eq!(shape.0[0].interiors().len(), 1);
        assert!(shape.0[1].exterior().is_closed());
        assert!((shape.unsigned_area() - 16.0).abs() < 1e-12);
    }

    #[test]
    fn orphan_inner_ring_becomes_outer() {
        let rings = vec![PolygonRing::Inner(points(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]))];
        assert_eq!(polygon_to_geo(&rings).0.len(), 1);
    }

    #[test]
    fn null_shape_is_empty() {
        assert!(shape_to_geo(Shape::NullShape).unwrap().0.is_empty());
        assert!(shape_to_geo(Shape::Point(Point::new(0.0, 0.0))).is_err());
    }

    #[test]
    fn geographic_prj_is_recognized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks.prj");

        fs::write(&path, r#"GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#).unwrap();
        assert_eq!(crs_from_prj(&path), Some(Crs::NAD83));

        fs::write(&path, r#"PROJCS["NAD_1983_Contiguous_USA_Albers",GEOGCS["GCS_North_American_1983"]]"#).unwrap();
        assert_eq!(crs_from_prj(&path), None);

        assert_eq!(crs_from_prj(&dir.path().join("missing.prj")), None);
    }
}
