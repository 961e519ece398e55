use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use areal::{io, Overlay};
use tracing::info;

use crate::commands::{load_attributes, load_config, load_polygons};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::OverlayArgs) -> Result<()> {
    let mut config = load_config(&args.geometry)?;
    if let Some(mode) = args.mode { config.mode = mode }
    if let Some(column) = &args.weights_column { config.weight_column = Some(column.clone()) }
    if let Some(column) = &args.join_column { config.join_column = Some(column.clone()) }

    let out_path = args.output.clone().unwrap_or_else(|| PathBuf::from("./overlay.csv"));
    let format = OutputFormat::from_path(&out_path)?;

    let (sources, targets) = load_polygons(&args.geometry, &config)?;
    let (attributes, weights) = load_attributes(
        &args.attributes,
        &sources,
        config.join_column.as_deref(),
        config.weight_column.as_deref(),
    )?;

    info!("[overlay] aggregating {} columns in {} mode", attributes.width(), config.mode);
    let mut overlay = Overlay::from_config(&sources, &targets, &config);
    if let Some(weights) = &weights {
        overlay = overlay.weights(weights);
    }
    let result = overlay.run(&attributes)?;

    info!("[overlay] writing {} rows to {}", result.height(), out_path.display());
    let id_column = config.id_property.as_deref().unwrap_or("id");
    match format {
        OutputFormat::Csv => io::write_output_csv(&targets, &result, id_column, &out_path),
        OutputFormat::GeoJson => io::write_output_geojson(&targets, &result, id_column, &out_path),
    }
}

enum OutputFormat {
    Csv,
    GeoJson,
}

impl OutputFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("geojson" | "json") => Ok(Self::GeoJson),
            _ => bail!("[overlay] Unsupported output file {}; expected .csv or .geojson", path.display()),
        }
    }
}
