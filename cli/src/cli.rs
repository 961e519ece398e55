use std::path::PathBuf;

use areal::{Crs, Mode};

/// Areal-weighted overlay of polygon attributes
#[derive(clap::Parser, Debug)]
#[command(name = "areal", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Aggregate source attributes onto target polygons
    Overlay(OverlayArgs),

    /// Write the target/source overlap pairs and their fractions
    Crosswalk(CrosswalkArgs),
}

/// Inputs shared by both subcommands.
#[derive(clap::Args, Debug)]
pub struct GeometryArgs {
    /// Source polygons (.geojson, .json or .shp)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub sources: PathBuf,

    /// Target polygons (.geojson, .json or .shp)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub targets: PathBuf,

    /// JSON config file; flags override its values
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Property (GeoJSON) or field (Shapefile) holding polygon identifiers
    #[arg(long)]
    pub id_property: Option<String>,

    /// CRS of the source polygons, e.g. EPSG:4269
    #[arg(long)]
    pub source_crs: Option<Crs>,

    /// CRS of the target polygons, e.g. EPSG:4326
    #[arg(long)]
    pub target_crs: Option<Crs>,

    /// Equal-area CRS for area computation, defaults to EPSG:5070
    #[arg(long)]
    pub equal_area: Option<Crs>,

    /// Suppress progress reporting
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(clap::Args, Debug)]
pub struct OverlayArgs {
    #[command(flatten)]
    pub geometry: GeometryArgs,

    /// Attribute CSV with one row per source polygon
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub attributes: PathBuf,

    /// Output file (.csv or .geojson), defaults to "./overlay.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Aggregation mode: scale-invariant (mean) or scale-variant (sum), defaults to scale-invariant
    #[arg(short, long)]
    pub mode: Option<Mode>,

    /// Attribute column holding per-source weights
    #[arg(short, long)]
    pub weights_column: Option<String>,

    /// Attribute column matched against source identifiers
    #[arg(short, long)]
    pub join_column: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CrosswalkArgs {
    #[command(flatten)]
    pub geometry: GeometryArgs,

    /// Output CSV, defaults to "./crosswalk.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// CSV with a weight per source polygon
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub weights: Option<PathBuf>,

    /// Weight column of --weights
    #[arg(short, long)]
    pub weights_column: Option<String>,

    /// Column of --weights matched against source identifiers
    #[arg(short, long)]
    pub join_column: Option<String>,
}
