//! CSV writing operations.

use std::{fs::File, path::Path};

use anyhow::{ensure, Context, Result};
use polars::{frame::DataFrame, io::SerWriter, prelude::{Column, CsvWriter, NamedFrom}};

use crate::geom::PolygonSet;

/// Write a DataFrame to a CSV file.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::csv::write] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .finish(df)
        .with_context(|| format!("[io::csv::write] Failed to write CSV to {:?}", path))
}

/// Prepend the target identifiers to an overlay result as column `id_column`.
pub fn with_target_ids(targets: &PolygonSet, values: &DataFrame, id_column: &str) -> Result<DataFrame> {
    ensure!(values.height() == targets.len(),
        "[io::csv::write] {} output rows for {} targets", values.height(), targets.len());
    ensure!(values.column(id_column).is_err(),
        "[io::csv::write] Output already has a column named `{id_column}`");

    let columns = std::iter::once(Column::new(id_column.into(), targets.ids()))
        .chain(values.get_columns().iter().cloned())
        .collect::<Vec<_>>();
    Ok(DataFrame::new(columns)?)
}

/// Write an overlay result with a leading target identifier column.
pub fn write_output_csv(targets: &PolygonSet, values: &DataFrame, id_column: &str, path: &Path) -> Result<()> {
    write_csv(&mut with_target_ids(targets, values, id_column)?, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{geom::Crs, io::read_attributes_csv};
    use geo::{polygon, Polygon};

    fn targets() -> PolygonSet {
        let square: Polygon<f64> = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)];
        PolygonSet::from_polygons(vec![square.clone(), square], Some(Crs::CONUS_ALBERS))
            .with_ids(vec!["010".into(), "020".into()])
            .unwrap()
    }

    #[test]
    fn ids_lead_the_output() {
        let values = DataFrame::new(vec![Column::new("pop".into(), &[1.5, 2.5])]).unwrap();
        let out = with_target_ids(&targets(), &values, "zone").unwrap();
        assert_eq!(out.get_column_names(), &["zone", "pop"]);

        assert!(with_target_ids(&targets(), &values, "pop").is_err());
        let short = DataFrame::new(vec![Column::new("pop".into(), &[1.5])]).unwrap();
        assert!(with_target_ids(&targets(), &short, "zone").is_err());
    }

    #[test]
    fn writes_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let values = DataFrame::new(vec![Column::new("pop".into(), &[1.5, 2.5])]).unwrap();

        write_output_csv(&targets(), &values, "zone", &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("zone,pop\n010,1.5\n"));
        let back = read_attributes_csv(&path, &["zone"]).unwrap();
        assert_eq!(back.height(), 2);
    }
}
