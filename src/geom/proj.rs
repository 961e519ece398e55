use std::{borrow::Cow, fmt, str::FromStr};

use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj as Proj4, transform::transform};
use serde::{Deserialize, Serialize};

use crate::{error::{OverlayError, Result}, geom::PolygonSet};

/// A coordinate reference system, either an EPSG code from the built-in table
/// or a raw PROJ.4 definition.
///
/// Round-trips through strings: `"EPSG:5070"` or `"+proj=aea +lat_1=..."`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    Epsg(u32),
    Proj4(String),
}

impl Crs {
    /// NAD83 / Conus Albers, the default equal-area projection.
    pub const CONUS_ALBERS: Crs = Crs::Epsg(5070);

    /// WGS84 lon/lat, the GeoJSON default.
    pub const WGS84: Crs = Crs::Epsg(4326);

    /// NAD83 lon/lat, used by TIGER/Line shapefiles.
    pub const NAD83: Crs = Crs::Epsg(4269);

    /// PROJ.4 definition for this CRS.
    pub fn proj4(&self) -> Result<Cow<'_, str>> {
        match self {
            Self::Proj4(definition) => Ok(Cow::Borrowed(definition)),
            Self::Epsg(code) => epsg_proj4(*code)
                .map(Cow::Borrowed)
                .ok_or_else(|| OverlayError::UnknownCrs(format!("EPSG:{code} is not in the built-in table"))),
        }
    }

    /// Whether coordinates are lon/lat degrees rather than projected units.
    pub fn is_geographic(&self) -> bool {
        self.proj4().is_ok_and(|definition| definition.split_whitespace()
            .any(|token| matches!(token, "+proj=longlat" | "+proj=latlong" | "+proj=lonlat" | "+proj=latlon")))
    }

    fn build(&self, collection: &'static str) -> Result<Proj4> {
        let definition = self.proj4()?;
        Proj4::from_proj_string(&definition)
            .map_err(|e| OverlayError::Projection {
                collection,
                message: format!("failed to build PROJ.4 `{definition}`: {e}"),
            })
    }
}

/// PROJ.4 strings for the EPSG codes areal knows without a database.
fn epsg_proj4(code: u32) -> Option<&'static str> {
    Some(match code {
        4326 => "+proj=longlat +datum=WGS84 +no_defs",
        4269 => "+proj=longlat +datum=NAD83 +no_defs",
        // NAD83 / Conus Albers
        5070 => "+proj=aea +lat_0=23 +lon_0=-96 +lat_1=29.5 +lat_2=45.5 +x_0=0 +y_0=0 +datum=NAD83 +units=m +no_defs",
        // US National Atlas Equal Area
        2163 | 9311 => "+proj=laea +lat_0=45 +lon_0=-100 +x_0=0 +y_0=0 +ellps=sphere +units=m +no_defs",
        // Alaska Albers
        3338 => "+proj=aea +lat_0=50 +lon_0=-154 +lat_1=55 +lat_2=65 +x_0=0 +y_0=0 +datum=NAD83 +units=m +no_defs",
        // ETRS89-extended / LAEA Europe
        3035 => "+proj=laea +lat_0=52 +lon_0=10 +x_0=4321000 +y_0=3210000 +ellps=GRS80 +units=m +no_defs",
        // WGS 84 / NSIDC EASE-Grid 2.0 Global
        6933 => "+proj=cea +lat_ts=30 +lon_0=0 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs",
        // WGS 84 / Pseudo-Mercator (not equal-area; accepted as an input CRS only)
        3857 => "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs",
        _ => return None,
    })
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epsg(code) => write!(f, "EPSG:{code}"),
            Self::Proj4(definition) => f.write_str(definition),
        }
    }
}

impl FromStr for Crs {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with('+') {
            return Ok(Self::Proj4(s.to_string()))
        }

        // "EPSG:4326", "epsg:4326", "urn:ogc:def:crs:EPSG::4326", or a bare code
        let code = s.rsplit(':').next().unwrap_or(s);
        let is_epsg = !s.contains(':') || s.to_ascii_uppercase().contains("EPSG");
        match code.parse::<u32>() {
            Ok(code) if is_epsg => Ok(Self::Epsg(code)),
            // OGC alias for WGS84 with lon/lat axis order
            _ if s.ends_with("CRS84") => Ok(Self::WGS84),
            _ => Err(OverlayError::UnknownCrs(s.to_string())),
        }
    }
}

impl TryFrom<String> for Crs {
    type Error = OverlayError;

    fn try_from(value: String) -> Result<Self> { value.parse() }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self { crs.to_string() }
}

impl PolygonSet {
    /// Reproject every polygon into `target`, returning a new set.
    /// The set is returned unchanged (cloned) when it is already in `target`.
    pub fn to_crs(&self, target: &Crs, collection: &'static str) -> Result<PolygonSet> {
        let source = self.crs().ok_or(OverlayError::MissingCrs { collection })?;
        if source == target {
            return Ok(self.clone())
        }

        let from = source.build(collection)?;
        let to = target.build(collection)?;
        let (from_degrees, to_degrees) = (source.is_geographic(), target.is_geographic());

        // proj4rs works in radians for geographic systems.
        let project = |coord: Coord<f64>| -> Result<Coord<f64>> {
            let mut point = if from_degrees {
                (coord.x.to_radians(), coord.y.to_radians(), 0.0)
            } else {
                (coord.x, coord.y, 0.0)
            };
            transform(&from, &to, &mut point)
                .map_err(|e| OverlayError::Projection {
                    collection,
                    message: format!("({}, {}) from {source} to {target}: {e}", coord.x, coord.y),
                })?;
            Ok(if to_degrees {
                Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
            } else {
                Coord { x: point.0, y: point.1 }
            })
        };

        let shapes = self.shapes().iter()
            .map(|shape| shape.try_map_coords(project))
            .collect::<Result<Vec<MultiPolygon<f64>>>>()?;

        Ok(self.with_shapes(shapes, target.clone()))
    }
}
