use super::{DataError, Dataset};
use ndarray::{Array2, s};

impl Dataset {
    /// Reshapes the text grid to exactly `rows x cols`. Cells inside both the
    /// old and new shapes keep their contents; newly exposed cells are empty.
    pub fn text_alloc(&mut self, rows: usize, cols: usize) {
        if self.text.dim() == (rows, cols) {
            return;
        }
        let mut grid: Array2<String> = Array2::default((rows, cols));
        let keep_rows = rows.min(self.text.nrows());
        let keep_cols = cols.min(self.text.ncols());
        for i in 0..keep_rows {
            for j in 0..keep_cols {
                grid[[i, j]] = std::mem::take(&mut self.text[[i, j]]);
            }
        }
        self.text = grid;
        self.names.text.truncate(cols);
    }

    /// Writes one text cell. The grid never grows implicitly, so an
    /// out-of-range cell is an error. `None` writes `"NaN"`.
    pub fn text_add(&mut self, row: usize, col: usize, text: Option<&str>) -> Result<(), DataError> {
        let (rows, cols) = self.text.dim();
        let cell = self.text.get_mut((row, col)).ok_or(DataError::OutOfBounds {
            row,
            col: col as isize,
            rows,
            cols,
        })?;
        *cell = text.unwrap_or("NaN").to_string();
        Ok(())
    }

    /// Text column `col`, if the grid has one.
    pub fn text_column(&self, col: usize) -> Option<Vec<&str>> {
        (col < self.text.ncols())
            .then(|| self.text.slice(s![.., col]).into_iter().map(String::as_str).collect())
    }
}
