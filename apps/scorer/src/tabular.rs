//! Delimited-file persistence for `Table`.

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tracing::info;

use crate::errors::AppError;
use crate::models::{Table, ABSTRACT_COLUMN};

/// Reads a delimited file with a header row into memory. The header must name
/// an `Abstract` column. Nothing is returned unless the whole file parses.
pub fn load_table(path: &Path, delimiter: u8) -> Result<Table, AppError> {
    let load_err = |source| AppError::Load {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(load_err)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(load_err)?
        .iter()
        .map(str::to_string)
        .collect();

    if !headers.iter().any(|h| h == ABSTRACT_COLUMN) {
        return Err(AppError::MissingColumn {
            column: ABSTRACT_COLUMN,
        });
    }

    let mut table = Table::new(headers);
    for record in reader.records() {
        let record = record.map_err(load_err)?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        table
            .push_row(record.iter().map(str::to_string).collect())
            .map_err(|source| AppError::MalformedRow {
                path: path.to_path_buf(),
                line,
                source,
            })?;
    }

    info!(
        "Loaded {} rows ({} columns) from {}",
        table.len(),
        table.headers().len(),
        path.display()
    );
    Ok(table)
}

/// Writes the header row then every row, in order. No index column is added.
pub fn save_table(table: &Table, path: &Path, delimiter: u8) -> Result<(), AppError> {
    let save_err = |source| AppError::Save {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(save_err)?;

    writer.write_record(table.headers()).map_err(save_err)?;
    for row in table.rows() {
        writer.write_record(row).map_err(save_err)?;
    }
    writer.flush().map_err(|e| save_err(e.into()))?;

    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}
