pub mod crosswalk;
pub mod overlay;

use std::path::Path;

use anyhow::Result;
use areal::{io, Crs, OverlayConfig, PolygonSet};
use polars::frame::DataFrame;
use tracing::info;

use crate::cli::GeometryArgs;

/// Config file values with command-line flags applied on top.
pub(crate) fn load_config(args: &GeometryArgs) -> Result<OverlayConfig> {
    let mut config = match &args.config {
        Some(path) => OverlayConfig::from_json_file(path)?,
        None => OverlayConfig::default(),
    };

    config.quiet |= args.quiet;
    if let Some(crs) = &args.equal_area { config.equal_area = crs.clone() }
    if let Some(crs) = &args.source_crs { config.source_crs = Some(crs.clone()) }
    if let Some(crs) = &args.target_crs { config.target_crs = Some(crs.clone()) }
    if let Some(property) = &args.id_property { config.id_property = Some(property.clone()) }

    Ok(config)
}

/// Read the source and target polygon files named by `args`.
pub(crate) fn load_polygons(args: &GeometryArgs, config: &OverlayConfig) -> Result<(PolygonSet, PolygonSet)> {
    let id_property = config.id_property.as_deref();
    let read = |path: &Path, crs: &Option<Crs>, label: &str| -> Result<PolygonSet> {
        info!("[{label}] loading polygons from {}", path.display());
        let set = io::read_polygons(path, id_property, crs.clone())?;
        info!("[{label}] {} polygons, crs {}", set.len(),
            set.crs().map_or_else(|| "unknown".to_string(), |crs| crs.to_string()));
        Ok(set)
    };

    let sources = read(&args.sources, &config.source_crs, "sources")?;
    let targets = read(&args.targets, &config.target_crs, "targets")?;
    Ok((sources, targets))
}

/// Read an attribute table aligned to `sources`, and split off its weights.
pub(crate) fn load_attributes(
    path: &Path,
    sources: &PolygonSet,
    join_column: Option<&str>,
    weights_column: Option<&str>,
) -> Result<(DataFrame, Option<Vec<f64>>)> {
    info!("[attributes] loading {}", path.display());
    let string_columns = join_column.into_iter().collect::<Vec<_>>();
    let mut df = io::read_attributes_csv(path, &string_columns)?;

    if let Some(column) = join_column {
        df = io::align_rows(&df, column, sources.ids())?;
    }

    match weights_column {
        Some(column) => {
            let (df, weights) = io::take_weights(&df, column)?;
            Ok((df, Some(weights)))
        }
        None => Ok((df, None)),
    }
}
