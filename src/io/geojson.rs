//! GeoJSON polygon input and output.

use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use polars::prelude::{DataFrame, DataType};
use serde_json::{json, Map, Value};

use crate::geom::{Crs, PolygonSet};

/// Read a FeatureCollection (or a single Feature) of Polygon/MultiPolygon features.
///
/// Identifiers come from `id_property` when given, otherwise features are
/// numbered by position. The CRS is taken from a legacy `crs` member when
/// present and defaults to WGS84 lon/lat as RFC 7946 prescribes.
pub fn read_geojson(path: &Path, id_property: Option<&str>) -> Result<PolygonSet> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("[io::geojson] Failed to open GeoJSON file: {}", path.display()))?;
    read_geojson_str(&text, id_property)
        .with_context(|| format!("[io::geojson] Failed to read GeoJSON from {}", path.display()))
}

/// Read polygons from a GeoJSON string. See [`read_geojson`].
pub fn read_geojson_str(text: &str, id_property: Option<&str>) -> Result<PolygonSet> {
    let value: Value = serde_json::from_str(text).context("[io::geojson] Failed to parse GeoJSON")?;

    let features = match value["type"].as_str() {
        Some("FeatureCollection") => value["features"].as_array()
            .ok_or_else(|| anyhow!("[io::geojson] FeatureCollection has no `features` array"))?
            .iter().collect::<Vec<_>>(),
        Some("Feature") => vec![&value],
        other => bail!("[io::geojson] Expected a Feature or FeatureCollection, found {other:?}"),
    };

    let shapes = features.iter().enumerate()
        .map(|(i, feature)| parse_geometry(&feature["geometry"])
            .with_context(|| format!("[io::geojson] Invalid geometry in feature {i}")))
        .collect::<Result<Vec<_>>>()?;

    let crs = match value["crs"]["properties"]["name"].as_str() {
        Some(name) => name.parse::<Crs>()?,
        None => Crs::WGS84,
    };
    let set = PolygonSet::new(shapes, Some(crs));

    let Some(property) = id_property else { return Ok(set) };
    let ids = features.iter().enumerate()
        .map(|(i, feature)| property_id(&feature["properties"][property])
            .ok_or_else(|| anyhow!("[io::geojson] Feature {i} has no usable `{property}` property")))
        .collect::<Result<Vec<_>>>()?;
    Ok(set.with_ids(ids)?)
}

/// Render a property value as an identifier; strings as-is, numbers in decimal.
fn property_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a Polygon or MultiPolygon geometry. A null geometry is an empty shape.
fn parse_geometry(geometry: &Value) -> Result<MultiPolygon<f64>> {
    if geometry.is_null() {
        return Ok(MultiPolygon(Vec::new()))
    }

    let coords = geometry["coordinates"].as_array()
        .ok_or_else(|| anyhow!("geometry has no `coordinates` array"))?;
    match geometry["type"].as_str() {
        Some("Polygon") => Ok(MultiPolygon(vec![parse_polygon(coords)?])),
        Some("MultiPolygon") => coords.iter()
            .map(|polygon| polygon.as_array()
                .ok_or_else(|| anyhow!("MultiPolygon member is not an array"))
                .and_then(|rings| parse_polygon(rings)))
            .collect::<Result<Vec<_>>>()
            .map(MultiPolygon),
        other => bail!("unsupported geometry type {other:?}; only Polygon and MultiPolygon are accepted"),
    }
}

/// Parse `[exterior, hole, hole, ...]` ring arrays.
fn parse_polygon(rings: &[Value]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| {
        ring.as_array()
            .ok_or_else(|| anyhow!("ring is not an array"))
            .and_then(|points| parse_ring(points))
    });

    let exterior = rings.next().ok_or_else(|| anyhow!("polygon has no exterior ring"))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Parse `[[x, y], ...]` into a closed ring.
fn parse_ring(points: &[Value]) -> Result<LineString<f64>> {
    let mut coords = points.iter().map(parse_position).collect::<Result<Vec<_>>>()?;

    if coords.first() != coords.last() {
        coords.push(coords[0]);
    }
    Ok(LineString(coords))
}

/// Parse `[x, y]`; any further ordinates are ignored.
fn parse_position(point: &Value) -> Result<Coord<f64>> {
    match point.as_array().map(Vec::as_slice) {
        Some([x, y, ..]) => Ok(Coord {
            x: x.as_f64().ok_or_else(|| anyhow!("coordinate x must be a number"))?,
            y: y.as_f64().ok_or_else(|| anyhow!("coordinate y must be a number"))?,
        }),
        _ => bail!("position must be an array of at least two numbers"),
    }
}

/// Write target polygons with their aggregated values as GeoJSON.
///
/// Row `j` of `values` becomes the properties of feature `j`, alongside the
/// target identifier under `id_property`.
pub fn write_output_geojson(targets: &PolygonSet, values: &DataFrame, id_property: &str, path: &Path) -> Result<()> {
    let bytes = output_geojson_bytes(targets, values, id_property)?;
    fs::write(path, bytes)
        .with_context(|| format!("[io::geojson] Failed to write GeoJSON to {}", path.display()))
}

pub(crate) fn output_geojson_bytes(targets: &PolygonSet, values: &DataFrame, id_property: &str) -> Result<Vec<u8>> {
    if values.height() != targets.len() {
        bail!("[io::geojson] {} output rows for {} targets", values.height(), targets.len());
    }

    let columns = values.get_columns().iter()
        .map(|column| -> Result<(String, Vec<Option<f64>>)> {
            let values = column.cast(&DataType::Float64)?.f64()?.to_vec();
            Ok((column.name().to_string(), values))
        })
        .collect::<Result<Vec<_>>>()?;

    let features = targets.shapes().iter().zip(targets.ids()).enumerate()
        .map(|(j, (shape, id))| {
            let mut properties = Map::new();
            properties.insert(id_property.to_string(), json!(id));
            for (name, column) in &columns {
                properties.insert(name.clone(), json!(column[j]));
            }
            json!({
                "type": "Feature",
                "geometry": multipolygon_json(shape),
                "properties": properties,
            })
        })
        .collect::<Vec<_>>();

    let mut collection = json!({ "type": "FeatureCollection", "features": features });
    if let Some(crs) = targets.crs().filter(|crs| **crs != Crs::WGS84) {
        collection["crs"] = json!({ "type": "name", "properties": { "name": crs.to_string() } });
    }

    serde_json::to_vec(&collection).context("[io::geojson] Failed to serialize GeoJSON")
}

fn multipolygon_json(shape: &MultiPolygon<f64>) -> Value {
    let ring = |ring: &LineString<f64>| ring.coords().map(|c| vec![c.x, c.y]).collect::<Vec<_>>();
    let polygons = shape.0.iter()
        .map(|polygon| std::iter::once(ring(polygon.exterior()))
            .chain(polygon.interiors().iter().map(&ring))
            .collect::<Vec<_>>())
        .collect::<Vec<_>>();
    json!({ "type": "MultiPolygon", "coordinates": polygons })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;
    use polars::prelude::{Column, NamedFrom};

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": { "GEOID": "001", "n": 1 },
              "geometry": { "type": "Polygon", "coordinates": [[[0,0],[2,0],[2,2],[0,2],[0,0]], [[0.5,0.5],[1,0.5],[1,1],[0.5,1]]] } },
            { "type": "Feature", "properties": { "GEOID": "002", "n": 2 },
              "geometry": { "type": "MultiPolygon", "coordinates": [[[[3,0],[4,0],[4,1],[3,1],[3,0]]], [[[5,0],[6,0],[6,1],[5,1],[5,0]]]] } },
            { "type": "Feature", "properties": { "GEOID": "003", "n": 3 }, "geometry": null }
        ]
    }"#;

    #[test]
    fn reads_polygons_multipolygons_and_nulls() {
        let set = read_geojson_str(COLLECTION, None).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.crs(), Some(&Crs::WGS84));
        assert_eq!(set.ids(), &["0", "1", "2"]);

        // Hole ring is closed on read.
        assert!((set.shapes()[0].unsigned_area() - 3.75).abs() < 1e-12);
        assert_eq!(set.shapes()[1].0.len(), 2);
        assert!(set.shapes()[2].0.is_empty());
    }

    #[test]
    fn ids_from_property() {
        let set = read_geojson_str(COLLECTION, Some("GEOID")).unwrap();
        assert_eq!(set.ids(), &["001", "002", "003"]);

        let set = read_geojson_str(COLLECTION, Some("n")).unwrap();
        assert_eq!(set.ids(), &["1", "2", "3"]);

        assert!(read_geojson_str(COLLECTION, Some("missing")).is_err());
    }

    #[test]
    fn legacy_crs_member() {
        let text = r#"{ "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::5070" } },
            "features": [] }"#;
        assert_eq!(read_geojson_str(text, None).unwrap().crs(), Some(&Crs::CONUS_ALBERS));
    }

    #[test]
    fn rejects_other_geometry_types() {
        let text = r#"{ "type": "Feature", "properties": {},
            "geometry": { "type": "LineString", "coordinates": [[0,0],[1,1]] } }"#;
        let err = read_geojson_str(text, None).unwrap_err();
        assert!(format!("{err:#}").contains("LineString"));
    }

    #[test]
    fn output_carries_ids_and_values() {
        let targets = read_geojson_str(COLLECTION, Some("GEOID")).unwrap();
        let values = DataFrame::new(vec![Column::new("pop".into(), &[1.5, 2.5, 0.0])]).unwrap();

        let bytes = output_geojson_bytes(&targets, &values, "GEOID").unwrap();
        let back = read_geojson_str(std::str::from_utf8(&bytes).unwrap(), Some("GEOID")).unwrap();
        assert_eq!(back.ids(), targets.ids());

        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["features"][1]["properties"]["pop"], json!(2.5));
        assert!(value.get("crs").is_none());

        let short = DataFrame::new(vec![Column::new("pop".into(), &[1.0])]).unwrap();
        assert!(output_geojson_bytes(&targets, &short, "GEOID").is_err());
    }
}
