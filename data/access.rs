//! Element access by index, by name, or a mix of the two.
//!
//! Column `-1` addresses the vector, as does any column when the page has no
//! matrix.

use super::dataset::INFO_PAGE;
use super::names::Axis;
use super::reshape::resize_matrix;
use super::{DataError, Dataset};
use ndarray::Array2;

/// Where a single numeric element lives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Index(usize, isize),
    Named(&'a str, &'a str),
    RowNamed(&'a str, isize),
    ColumnNamed(usize, &'a str),
}

impl From<(usize, isize)> for Cell<'_> {
    fn from((row, col): (usize, isize)) -> Self {
        Cell::Index(row, col)
    }
}

impl<'a> From<(&'a str, &'a str)> for Cell<'a> {
    fn from((row, col): (&'a str, &'a str)) -> Self {
        Cell::Named(row, col)
    }
}

impl Dataset {
    fn row_index(&self, name: &str) -> Result<usize, DataError> {
        self.names.find(name, Axis::Rows).ok_or_else(|| DataError::NameNotFound {
            name: name.to_string(),
            axis: Axis::Rows,
        })
    }

    /// Resolves a column name, falling back to the vector's name (column -1).
    fn column_index(&self, name: &str) -> Result<isize, DataError> {
        if let Some(j) = self.names.find(name, Axis::Columns) {
            return Ok(j as isize);
        }
        let vector_named = self
            .names
            .vector
            .as_deref()
            .is_some_and(|vector| super::Pattern::new(name).is_match(vector));
        if vector_named {
            return Ok(-1);
        }
        Err(DataError::NameNotFound {
            name: name.to_string(),
            axis: Axis::Columns,
        })
    }

    fn resolve(&self, cell: Cell<'_>) -> Result<(usize, isize), DataError> {
        match cell {
            Cell::Index(row, col) => Ok((row, col)),
            Cell::Named(row, col) => Ok((self.row_index(row)?, self.column_index(col)?)),
            Cell::RowNamed(row, col) => Ok((self.row_index(row)?, col)),
            Cell::ColumnNamed(row, col) => Ok((row, self.column_index(col)?)),
        }
    }

    /// Mutable reference to the element at `(row, col)`.
    pub fn ptr(&mut self, row: usize, col: isize) -> Result<&mut f64, DataError> {
        if col == -1 || self.matrix.is_none() {
            let vector = self.vector.as_mut().ok_or(DataError::NullTarget("vector"))?;
            let len = vector.len();
            return vector.get_mut(row).ok_or(DataError::OutOfBounds {
                row,
                col,
                rows: len,
                cols: 1,
            });
        }
        let matrix = self.matrix.as_mut().ok_or(DataError::NullTarget("matrix"))?;
        let (rows, cols) = matrix.dim();
        if col < 0 {
            return Err(DataError::OutOfBounds { row, col, rows, cols });
        }
        matrix
            .get_mut((row, col as usize))
            .ok_or(DataError::OutOfBounds { row, col, rows, cols })
    }

    pub fn get(&self, row: usize, col: isize) -> Result<f64, DataError> {
        if col == -1 || self.matrix.is_none() {
            let vector = self.vector_or_err()?;
            return vector.get(row).copied().ok_or(DataError::OutOfBounds {
                row,
                col,
                rows: vector.len(),
                cols: 1,
            });
        }
        let matrix = self.matrix_or_err()?;
        let (rows, cols) = matrix.dim();
        usize::try_from(col)
            .ok()
            .and_then(|col| matrix.get((row, col)).copied())
            .ok_or(DataError::OutOfBounds { row, col, rows, cols })
    }

    pub fn set(&mut self, row: usize, col: isize, value: f64) -> Result<(), DataError> {
        *self.ptr(row, col)? = value;
        Ok(())
    }

    pub fn get_cell<'a>(&self, cell: impl Into<Cell<'a>>) -> Result<f64, DataError> {
        let (row, col) = self.resolve(cell.into())?;
        self.get(row, col)
    }

    pub fn set_cell<'a>(&mut self, cell: impl Into<Cell<'a>>, value: f64) -> Result<(), DataError> {
        let (row, col) = self.resolve(cell.into())?;
        self.set(row, col, value)
    }

    pub fn cell_mut<'a>(&mut self, cell: impl Into<Cell<'a>>) -> Result<&mut f64, DataError> {
        let (row, col) = self.resolve(cell.into())?;
        self.ptr(row, col)
    }

    /// Reads a cell from the first page in the chain whose title matches
    /// `page`, or from the `"Info"` page when no title is given.
    pub fn get_on_page<'a>(&self, page: Option<&str>, cell: impl Into<Cell<'a>>) -> Result<f64, DataError> {
        let title = page.unwrap_or(INFO_PAGE);
        self.get_page(title)
            .ok_or_else(|| DataError::PageNotFound(title.to_string()))?
            .get_cell(cell)
    }

    pub fn set_on_page<'a>(
        &mut self,
        page: Option<&str>,
        cell: impl Into<Cell<'a>>,
        value: f64,
    ) -> Result<(), DataError> {
        let title = page.unwrap_or(INFO_PAGE);
        self.get_page_mut(title)
            .ok_or_else(|| DataError::PageNotFound(title.to_string()))?
            .set_cell(cell, value)
    }

    /// Appends a row name and writes `value` into column 0 of that row,
    /// growing the matrix as needed. Names and values go in together, so the
    /// value lands on the row the name just claimed.
    pub fn add_named_element(&mut self, name: &str, value: f64) -> Result<(), DataError> {
        let rows = self.names.rows.len() + 1;
        let matrix = self.matrix.get_or_insert_with(|| Array2::zeros((0, 1)));
        if matrix.nrows() < rows {
            let cols = matrix.ncols().max(1);
            resize_matrix(matrix, rows, cols)?;
        }
        matrix[[rows - 1, 0]] = value;
        self.names.add(name, Axis::Rows);
        Ok(())
    }
}
