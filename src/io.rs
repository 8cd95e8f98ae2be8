//! Tab-separated tables in and out of a [`Dataset`].
//!
//! A column whose non-empty cells all parse as numbers goes to the matrix;
//! any other column goes to the text grid. Empty numeric cells load as NaN,
//! which is how the models see missing data.

use crate::data::{Axis, DataError, Dataset};
use ndarray::Array2;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Failed to open table '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed table: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("Failed to write table: {0}")]
    Write(#[from] std::io::Error),
}

fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        Some(f64::NAN)
    } else {
        cell.parse().ok()
    }
}

/// Reads a headed, tab-separated table.
pub fn parse_table(reader: impl Read) -> Result<Dataset, IoError> {
    let mut csv = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(reader);
    let headers: Vec<String> = csv.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let records = csv.records().collect::<Result<Vec<_>, _>>()?;

    let numeric: Vec<bool> = (0..headers.len())
        .map(|j| records.iter().all(|r| r.get(j).and_then(parse_cell).is_some()))
        .collect();
    let numeric_columns: Vec<usize> = (0..headers.len()).filter(|&j| numeric[j]).collect();
    let text_columns: Vec<usize> = (0..headers.len()).filter(|&j| !numeric[j]).collect();

    let mut data = Dataset::blank();
    if !numeric_columns.is_empty() {
        let mut matrix = Array2::from_elem((records.len(), numeric_columns.len()), f64::NAN);
        for (i, record) in records.iter().enumerate() {
            for (k, &j) in numeric_columns.iter().enumerate() {
                matrix[[i, k]] = record.get(j).and_then(parse_cell).unwrap_or(f64::NAN);
            }
        }
        for &j in &numeric_columns {
            data.names.add(&headers[j], Axis::Columns);
        }
        data.matrix = Some(matrix);
    }
    if !text_columns.is_empty() {
        data.text_alloc(records.len(), text_columns.len());
        for (i, record) in records.iter().enumerate() {
            for (k, &j) in text_columns.iter().enumerate() {
                data.text_add(i, k, record.get(j))?;
            }
        }
        for &j in &text_columns {
            data.names.add(&headers[j], Axis::Text);
        }
    }
    log::debug!(
        "Read a table of {} rows: {} numeric and {} text columns",
        records.len(),
        numeric_columns.len(),
        text_columns.len()
    );
    Ok(data)
}

/// Reads the table at `path`, titling the page after the file stem.
pub fn read_table(path: impl AsRef<Path>) -> Result<Dataset, IoError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IoError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let mut data = parse_table(file)?;
    if let Some(stem) = path.file_stem() {
        data.names.title = stem.to_string_lossy().into_owned();
    }
    Ok(data)
}

/// Writes every page of the chain, each preceded by its title.
pub fn write_chain(mut out: impl Write, data: &Dataset) -> Result<(), IoError> {
    for page in data.pages() {
        if !page.title().is_empty() {
            writeln!(out, "# {}", page.title())?;
        }
        write!(out, "{page}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn numeric_and_text_columns_are_separated() {
        let table = "name\tx\ty\nann\t1.5\t2\nbob\t\t-3\n";
        let data = parse_table(table.as_bytes()).unwrap();
        let matrix = data.matrix.as_ref().unwrap();
        assert_eq!(matrix.dim(), (2, 2));
        assert_eq!(matrix[[0, 0]], 1.5);
        assert!(matrix[[1, 0]].is_nan());
        assert_eq!(matrix.column(1), array![2.0, -3.0]);
        assert_eq!(data.names.axis(Axis::Columns), ["x", "y"]);
        assert_eq!(data.text_column(0), Some(vec!["ann", "bob"]));
        assert_eq!(data.names.axis(Axis::Text), ["name"]);
    }

    #[test]
    fn all_numeric_tables_have_no_text() {
        let data = parse_table("a\n1\n2\n".as_bytes()).unwrap();
        assert_eq!(data.text.dim(), (0, 0));
        assert_eq!(data.matrix, Some(array![[1.0], [2.0]]));
    }

    #[test]
    fn ragged_rows_are_an_error() {
        assert!(matches!(
            parse_table("a\tb\n1\t2\n3\n".as_bytes()),
            Err(IoError::Csv(_))
        ));
    }

    #[test]
    fn chains_print_page_titles() {
        let mut data = Dataset::from(array![[1.0]]);
        data.add_page(Dataset::from(array![2.0]), "Info");
        let mut out = Vec::new();
        write_chain(&mut out, &data).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("# Info"));
    }
}
