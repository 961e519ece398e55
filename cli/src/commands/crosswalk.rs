use std::path::PathBuf;

use anyhow::{bail, Result};
use areal::{io, Overlay};
use tracing::info;

use crate::commands::{load_attributes, load_config, load_polygons};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::CrosswalkArgs) -> Result<()> {
    let mut config = load_config(&args.geometry)?;
    if let Some(column) = &args.weights_column { config.weight_column = Some(column.clone()) }
    if let Some(column) = &args.join_column { config.join_column = Some(column.clone()) }

    let out_path = args.output.clone().unwrap_or_else(|| PathBuf::from("./crosswalk.csv"));
    let (sources, targets) = load_polygons(&args.geometry, &config)?;

    let weights = match &args.weights {
        Some(_) if config.weight_column.is_none() => {
            bail!("[crosswalk] --weights needs a weight column (--weights-column or `weight_column` in the config)")
        }
        Some(path) => load_attributes(
            path,
            &sources,
            config.join_column.as_deref(),
            config.weight_column.as_deref(),
        )?.1,
        None => None,
    };

    let mut overlay = Overlay::from_config(&sources, &targets, &config);
    if let Some(weights) = &weights {
        overlay = overlay.weights(weights);
    }
    let mut pairs = overlay.crosswalk()?;

    info!("[crosswalk] writing {} pairs to {}", pairs.height(), out_path.display());
    io::write_csv(&mut pairs, &out_path)
}
