//! Overlay configuration, loadable from JSON.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{geom::Crs, overlay::Mode};

/// Settings for an overlay run. Every field has a default, so a config file
/// only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    /// Mean (scale-invariant) or sum (scale-variant) aggregation.
    pub mode: Mode,
    /// Suppress progress reporting.
    pub quiet: bool,
    /// Equal-area CRS that all areas are computed in.
    pub equal_area: Crs,
    /// Override the CRS read from (or missing in) the source geometry file.
    pub source_crs: Option<Crs>,
    /// Override the CRS read from (or missing in) the target geometry file.
    pub target_crs: Option<Crs>,
    /// Feature property (GeoJSON) or field (Shapefile) holding polygon identifiers.
    pub id_property: Option<String>,
    /// Attribute column holding per-source weights; excluded from aggregation.
    pub weight_column: Option<String>,
    /// Attribute column matched against source identifiers to align rows.
    pub join_column: Option<String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            quiet: false,
            equal_area: Crs::CONUS_ALBERS,
            source_crs: None,
            target_crs: None,
            id_property: None,
            weight_column: None,
            join_column: None,
        }
    }
}

impl OverlayConfig {
    /// Read a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("[config] Failed to read config file: {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("[config] Invalid config file: {}", path.display()))
    }

    /// Parse a config from a JSON string.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("[config] Failed to parse config JSON")
    }
}
