//! CSV reading operations.

use std::{collections::HashMap, fs::File, io::Cursor, path::Path, sync::Arc};

use anyhow::{anyhow, ensure, Context, Result};
use polars::{
    frame::DataFrame,
    io::SerReader,
    prelude::{CsvReadOptions, CsvReader, DataType, Field, IdxCa, IdxSize, Schema},
};

/// Reads an attribute CSV from `path` into a Polars DataFrame.
///
/// Columns named in `string_columns` (identifier columns) are read as strings
/// so that leading zeros survive.
pub fn read_attributes_csv(path: &Path, string_columns: &[&str]) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv::read] Failed to open CSV file: {}", path.display()))?;
    CsvReader::new(file)
        .with_options(read_options(string_columns))
        .finish()
        .with_context(|| format!("[io::csv::read] Failed to read CSV from {:?}", path))
}

/// Reads an attribute CSV from a string. See [`read_attributes_csv`].
pub fn read_attributes_csv_str(csv: &str, string_columns: &[&str]) -> Result<DataFrame> {
    CsvReader::new(Cursor::new(csv.as_bytes()))
        .with_options(read_options(string_columns))
        .finish()
        .context("[io::csv::read] Failed to read CSV from string")
}

fn read_options(string_columns: &[&str]) -> CsvReadOptions {
    let options = CsvReadOptions::default().with_has_header(true);
    if string_columns.is_empty() {
        return options
    }
    options.with_schema_overwrite(Some(Arc::new(Schema::from_iter(
        string_columns.iter().map(|&name| Field::new(name.into(), DataType::String)),
    ))))
}

/// Split the weight column off an attribute table.
pub fn take_weights(df: &DataFrame, column: &str) -> Result<(DataFrame, Vec<f64>)> {
    let weights = df.column(column)
        .with_context(|| format!("[io::csv::read] Weight column `{column}` not found"))?
        .cast(&DataType::Float64)
        .with_context(|| format!("[io::csv::read] Weight column `{column}` is not numeric"))?;
    let weights = weights.f64()?;
    ensure!(weights.null_count() == 0, "[io::csv::read] Weight column `{column}` has {} missing values", weights.null_count());

    Ok((df.drop(column)?, weights.into_no_null_iter().collect()))
}

/// Reorder the rows of `df` so that row `i` is the row whose `join_column`
/// equals `ids[i]`, and drop the join column.
///
/// Every id must match exactly one row and every row must match an id.
pub fn align_rows(df: &DataFrame, join_column: &str, ids: &[String]) -> Result<DataFrame> {
    let keys = df.column(join_column)
        .with_context(|| format!("[io::csv::read] Join column `{join_column}` not found"))?
        .cast(&DataType::String)?;
    let keys = keys.str()?;

    let mut rows = HashMap::with_capacity(keys.len());
    for (row, key) in keys.into_iter().enumerate() {
        let key = key.ok_or_else(|| anyhow!("[io::csv::read] Row {row} has no `{join_column}` value"))?;
        ensure!(rows.insert(key, row as IdxSize).is_none(), "[io::csv::read] Duplicate `{join_column}` value {key}");
    }
    ensure!(rows.len() == ids.len(),
        "[io::csv::read] CSV has {} rows, expected {} (one per source polygon)", rows.len(), ids.len());

    let indices = ids.iter()
        .map(|id| rows.get(id.as_str()).copied()
            .ok_or_else(|| anyhow!("[io::csv::read] No `{join_column}` row for source polygon {id}")))
        .collect::<Result<Vec<_>>>()?;

    Ok(df.drop(join_column)?.take(&IdxCa::from_vec("rows".into(), indices))?)
}
