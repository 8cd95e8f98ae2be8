//! Structural edits: stacking, splitting, dropping rows and columns, and
//! in-place resizing of the numeric parts.

use super::dataset::{standard_layout, zeros_matrix, zeros_vector};
use super::names::{Axis, Pattern};
use super::{DataError, Dataset};
use ndarray::{Array1, Array2, Axis as NdAxis, concatenate, s};

/// Grows or shrinks an owned vector to `len`, keeping the overlapping prefix.
/// New cells are zero.
pub fn resize_vector(vector: &mut Array1<f64>, len: usize) -> Result<(), DataError> {
    if !vector.is_standard_layout() {
        return Err(DataError::NotResizable);
    }
    if vector.len() == len {
        return Ok(());
    }
    let mut resized = zeros_vector(len)?;
    let keep = len.min(vector.len());
    resized
        .slice_mut(s![..keep])
        .assign(&vector.slice(s![..keep]));
    *vector = resized;
    Ok(())
}

/// Grows or shrinks an owned matrix to `rows x cols`, keeping the overlapping
/// top-left block. New cells are zero.
pub fn resize_matrix(matrix: &mut Array2<f64>, rows: usize, cols: usize) -> Result<(), DataError> {
    if !matrix.is_standard_layout() {
        return Err(DataError::NotResizable);
    }
    if matrix.dim() == (rows, cols) {
        return Ok(());
    }
    let mut resized = zeros_matrix(rows, cols)?;
    let (keep_rows, keep_cols) = (rows.min(matrix.nrows()), cols.min(matrix.ncols()));
    resized
        .slice_mut(s![..keep_rows, ..keep_cols])
        .assign(&matrix.slice(s![..keep_rows, ..keep_cols]));
    *matrix = resized;
    Ok(())
}

fn stack_vectors(
    top: Option<&Array1<f64>>,
    bottom: Option<&Array1<f64>>,
) -> Result<Option<Array1<f64>>, DataError> {
    match (top, bottom) {
        (Some(top), Some(bottom)) => concatenate(NdAxis(0), &[top.view(), bottom.view()])
            .map(Some)
            .map_err(|e| DataError::mismatch("vector stack", top.len(), e)),
        (Some(only), None) | (None, Some(only)) => Ok(Some(only.clone())),
        (None, None) => Ok(None),
    }
}

fn stack_matrices(
    first: Option<&Array2<f64>>,
    second: Option<&Array2<f64>>,
    axis: Axis,
) -> Result<Option<Array2<f64>>, DataError> {
    let (nd_axis, context) = match axis {
        Axis::Rows => (NdAxis(0), "row stack"),
        _ => (NdAxis(1), "column stack"),
    };
    match (first, second) {
        (Some(first), Some(second)) => {
            let shared = |m: &Array2<f64>| if nd_axis.index() == 0 { m.ncols() } else { m.nrows() };
            if shared(first) != shared(second) {
                return Err(DataError::mismatch(context, shared(first), shared(second)));
            }
            concatenate(nd_axis, &[first.view(), second.view()])
                .map(|m| Some(standard_layout(m)))
                .map_err(|e| DataError::mismatch(context, format!("{:?}", first.dim()), e))
        }
        (Some(only), None) | (None, Some(only)) => Ok(Some(only.clone())),
        (None, None) => Ok(None),
    }
}

fn check_stack_axis(axis: Axis) -> Result<(), DataError> {
    if axis == Axis::Text {
        log::warn!("Pages stack along rows or columns, not {axis}.");
        return Err(DataError::InvalidAxis(axis.to_string()));
    }
    Ok(())
}

/// Stacks `second` below (rows) or to the right of (columns) `first`,
/// returning a new page.
///
/// Either side may be absent, in which case the result is a copy of the other;
/// two absent inputs give a blank page. Row stacking also stacks the vectors
/// and weights. Column stacking keeps `first`'s vector and weights and drops
/// `second`'s. Only the first page of each chain is read, and text is taken
/// from `first` untouched.
pub fn stack(
    first: Option<&Dataset>,
    second: Option<&Dataset>,
    axis: Axis,
) -> Result<Dataset, DataError> {
    check_stack_axis(axis)?;
    match (first, second) {
        (Some(first), Some(second)) => {
            let mut out = first.copy_page();
            out.stack_page(second, axis)?;
            Ok(out)
        }
        (Some(only), None) | (None, Some(only)) => Ok(only.copy_page()),
        (None, None) => Ok(Dataset::blank()),
    }
}

impl Dataset {
    /// In-place [`stack`]: extends this page with `other` along `axis`.
    /// On error the page is left as it was.
    pub fn stack_page(&mut self, other: &Dataset, axis: Axis) -> Result<(), DataError> {
        check_stack_axis(axis)?;
        let matrix = stack_matrices(self.matrix.as_ref(), other.matrix.as_ref(), axis)?;
        if axis == Axis::Rows {
            let vector = stack_vectors(self.vector.as_ref(), other.vector.as_ref())?;
            let weights = stack_vectors(self.weights.as_ref(), other.weights.as_ref())?;
            self.vector = vector;
            self.weights = weights;
        }
        self.matrix = matrix;
        self.names.stack(&other.names, axis);
        Ok(())
    }

    /// Splits the page into two new pages at `point` along `axis`.
    ///
    /// `point <= 0` puts everything in the second page and `point` at or past
    /// the extent puts everything in the first. A row split divides vector,
    /// matrix, weights and row names. A column split divides the matrix and
    /// column names, gives the vector to the first page, and copies the weights
    /// into both. Text and later pages are not carried.
    pub fn split(&self, point: isize, axis: Axis) -> Result<(Dataset, Dataset), DataError> {
        let extent = match axis {
            Axis::Rows => {
                let vector_len = self.vector.as_ref().map_or(0, |v| v.len());
                vector_len.max(self.matrix.as_ref().map_or(0, |m| m.nrows()))
            }
            Axis::Columns => self.matrix.as_ref().map_or(0, |m| m.ncols()),
            Axis::Text => {
                log::warn!("Pages split along rows or columns, not {axis}.");
                return Err(DataError::InvalidAxis(axis.to_string()));
            }
        };
        let whole = || {
            let mut page = self.copy_page();
            page.text = Array2::default((0, 0));
            page.names.text.clear();
            page
        };
        if point <= 0 {
            return Ok((Dataset::blank(), whole()));
        }
        let point = point as usize;
        if point >= extent {
            return Ok((whole(), Dataset::blank()));
        }

        let (mut first, mut second) = match axis {
            Axis::Rows => (self.row_range(0, point), self.row_range(point, extent)),
            _ => {
                let matrix = self.matrix_or_err()?;
                let mut left = Dataset::blank();
                left.vector = self.vector.clone();
                left.weights = self.weights.clone();
                left.matrix = Some(standard_layout(matrix.slice(s![.., ..point]).to_owned()));
                let mut right = Dataset::blank();
                right.weights = self.weights.clone();
                right.matrix = Some(standard_layout(matrix.slice(s![.., point..]).to_owned()));
                (left, right)
            }
        };
        for page in [&mut first, &mut second] {
            page.names.title = self.names.title.clone();
            page.names.rows = self.names.rows.clone();
            page.names.columns = self.names.columns.clone();
        }
        first.names.vector = self.names.vector.clone();
        match axis {
            Axis::Rows => {
                second.names.vector = self.names.vector.clone();
                second.names.rows = first.names.split_off(Axis::Rows, point);
            }
            _ => second.names.columns = first.names.split_off(Axis::Columns, point),
        }
        Ok((first, second))
    }

    /// Drops the matrix columns flagged in `drop`, along with their names.
    /// Vector, weights and text are untouched; columns past the mask are kept.
    pub fn remove_columns(&mut self, drop: &[bool]) {
        if let Some(matrix) = self.matrix.as_ref() {
            let kept: Vec<usize> = (0..matrix.ncols())
                .filter(|&j| !drop.get(j).copied().unwrap_or(false))
                .collect();
            let compacted = matrix.select(NdAxis(1), &kept);
            self.matrix = Some(standard_layout(compacted));
        }
        self.names.remove_columns(drop);
    }

    /// Drops the rows flagged in `drop` from vector, matrix, weights, text and
    /// row names together. The mask spans the longest of vector, matrix rows
    /// and text rows; rows past the mask are kept.
    ///
    /// Removing every row leaves the page with no vector, matrix, weights or text.
    pub fn remove_rows(&mut self, drop: &[bool]) {
        let kept: Vec<usize> = (0..self.row_extent())
            .filter(|&i| !drop.get(i).copied().unwrap_or(false))
            .collect();
        if kept.is_empty() {
            self.vector = None;
            self.matrix = None;
            self.weights = None;
            self.text = Array2::default((0, 0));
            self.names.rows.clear();
            return;
        }
        let within = |len: usize| -> Vec<usize> { kept.iter().copied().filter(|&i| i < len).collect() };
        if let Some(vector) = self.vector.as_ref() {
            self.vector = Some(vector.select(NdAxis(0), &within(vector.len())));
        }
        if let Some(weights) = self.weights.as_ref() {
            self.weights = Some(weights.select(NdAxis(0), &within(weights.len())));
        }
        if let Some(matrix) = self.matrix.as_ref() {
            let rows = within(matrix.nrows());
            self.matrix = Some(standard_layout(matrix.select(NdAxis(0), &rows)));
        }
        if self.text.nrows() > 0 {
            self.text = self.text.select(NdAxis(0), &within(self.text.nrows()));
        }
        self.names.retain_rows(&kept);
    }

    /// Keeps only the columns whose names match one of `patterns`, each
    /// pattern claiming the first column it matches that no earlier pattern
    /// claimed. Patterns that match nothing are reported and skipped.
    pub fn prune_columns(&mut self, patterns: &[&str]) {
        let columns = self.matrix.as_ref().map_or(self.names.columns.len(), |m| m.ncols());
        let mut keep = vec![false; columns];
        for &raw in patterns {
            let pattern = Pattern::new(raw);
            let claimed = self
                .names
                .columns
                .iter()
                .enumerate()
                .find(|(j, name)| *j < columns && !keep[*j] && pattern.is_match(name));
            match claimed {
                Some((j, _)) => keep[j] = true,
                None => log::warn!(
                    "You asked to keep column \"{raw}\" but no remaining column matches it. Typo?"
                ),
            }
        }
        let drop: Vec<bool> = keep.iter().map(|k| !k).collect();
        self.remove_columns(&drop);
    }
}
