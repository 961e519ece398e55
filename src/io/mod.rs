//! File formats for overlay inputs and outputs.
//!
//! - `geojson` - polygon input (Polygon/MultiPolygon features) and result output
//! - `shp` - Shapefile polygon input
//! - `csv` - attribute tables in, overlay results and crosswalks out

mod csv;
mod geojson;
mod shp;

pub use csv::*;
pub use geojson::{read_geojson, read_geojson_str, write_output_geojson};
pub use shp::read_shapefile;

use std::path::Path;

use anyhow::{bail, Result};

use crate::geom::{Crs, PolygonSet};

/// Read polygons from a GeoJSON or Shapefile path, chosen by extension.
///
/// `crs`, when given, replaces whatever CRS the file declares.
pub fn read_polygons(path: &Path, id_property: Option<&str>, crs: Option<Crs>) -> Result<PolygonSet> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    let set = match extension.as_deref() {
        Some("geojson" | "json") => read_geojson(path, id_property)?,
        Some("shp") => return read_shapefile(path, id_property, crs),
        _ => bail!("[io] Unsupported polygon file {}; expected .geojson, .json or .shp", path.display()),
    };
    Ok(match crs {
        Some(crs) => set.with_crs(crs),
        None => set,
    })
}
