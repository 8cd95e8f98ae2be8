use super::names::{Axis, Names, Pattern};
use super::DataError;
use ndarray::{Array1, Array2, ArrayView1, s};
use std::fmt;

/// Title of the page estimation routines use for auxiliary results
/// (log likelihood, iteration counts, ...).
pub const INFO_PAGE: &str = "Info";

/// One page of a data set.
///
/// `vector` is conventionally aligned with the rows of `matrix` and is
/// addressed as column `-1`. The text grid keeps its own shape and may differ
/// from the numeric parts. Further pages hang off `next`; the head owns the
/// whole chain, so a page can never be its own successor.
#[derive(PartialEq)]
pub struct Dataset {
    pub vector: Option<Array1<f64>>,
    pub matrix: Option<Array2<f64>>,
    pub weights: Option<Array1<f64>>,
    pub text: Array2<String>,
    pub names: Names,
    pub(crate) next: Option<Box<Dataset>>,
}

pub(crate) fn try_zeros(elements: usize) -> Result<Vec<f64>, DataError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(elements)
        .map_err(|_| DataError::Allocation { elements })?;
    buffer.resize(elements, 0.0);
    Ok(buffer)
}

pub(crate) fn zeros_vector(len: usize) -> Result<Array1<f64>, DataError> {
    Ok(Array1::from_vec(try_zeros(len)?))
}

pub(crate) fn zeros_matrix(rows: usize, cols: usize) -> Result<Array2<f64>, DataError> {
    let elements = rows
        .checked_mul(cols)
        .ok_or(DataError::Allocation { elements: usize::MAX })?;
    Array2::from_shape_vec((rows, cols), try_zeros(elements)?)
        .map_err(|e| DataError::mismatch("matrix allocation", format!("{rows} x {cols}"), e))
}

/// Forces standard (row-major, contiguous) layout so the array stays resizable.
pub(crate) fn standard_layout(matrix: Array2<f64>) -> Array2<f64> {
    if matrix.is_standard_layout() {
        matrix
    } else {
        matrix.as_standard_layout().into_owned()
    }
}

impl Dataset {
    /// A page with no vector, matrix, weights or text and empty names.
    pub fn blank() -> Self {
        Self {
            vector: None,
            matrix: None,
            weights: None,
            text: Array2::default((0, 0)),
            names: Names::new(),
            next: None,
        }
    }

    /// Allocates a zero-filled page: a vector of `vector_len` (none when zero)
    /// and a `rows x cols` matrix (none when either is zero).
    pub fn alloc(vector_len: usize, rows: usize, cols: usize) -> Result<Self, DataError> {
        let mut page = Self::blank();
        if rows > 0 && cols > 0 {
            page.matrix = Some(zeros_matrix(rows, cols)?);
        }
        if vector_len > 0 {
            page.vector = Some(zeros_vector(vector_len)?);
        }
        Ok(page)
    }

    /// A vector-only page.
    pub fn with_vector(len: usize) -> Result<Self, DataError> {
        Self::alloc(len, 0, 0)
    }

    /// A matrix-only page.
    pub fn with_matrix(rows: usize, cols: usize) -> Result<Self, DataError> {
        Self::alloc(0, rows, cols)
    }

    pub fn title(&self) -> &str {
        &self.names.title
    }

    pub fn next_page(&self) -> Option<&Dataset> {
        self.next.as_deref()
    }

    pub fn next_page_mut(&mut self) -> Option<&mut Dataset> {
        self.next.as_deref_mut()
    }

    /// This page followed by every page chained after it.
    pub fn pages(&self) -> impl Iterator<Item = &Dataset> {
        std::iter::successors(Some(self), |page| page.next.as_deref())
    }

    /// Rows spanned by this page: the longest of vector, matrix rows and text rows.
    pub fn row_extent(&self) -> usize {
        let vector_len = self.vector.as_ref().map_or(0, |v| v.len());
        let matrix_rows = self.matrix.as_ref().map_or(0, |m| m.nrows());
        vector_len.max(matrix_rows).max(self.text.nrows())
    }

    pub fn matrix_or_err(&self) -> Result<&Array2<f64>, DataError> {
        self.matrix.as_ref().ok_or(DataError::NullTarget("matrix"))
    }

    pub fn vector_or_err(&self) -> Result<&Array1<f64>, DataError> {
        self.vector.as_ref().ok_or(DataError::NullTarget("vector"))
    }

    /// Duplicates this page only: numeric parts, text and names, but not the chain.
    pub fn copy_page(&self) -> Dataset {
        Dataset {
            vector: self.vector.clone(),
            matrix: self.matrix.clone(),
            weights: self.weights.clone(),
            text: self.text.clone(),
            names: self.names.clone(),
            next: None,
        }
    }

    /// Copies this page's contents into `out`, which must already have the same
    /// vector, matrix and weights shapes. Names and text are replaced.
    ///
    /// All shapes are checked before anything is written, so a mismatch leaves
    /// `out` untouched.
    pub fn copy_into(&self, out: &mut Dataset) -> Result<(), DataError> {
        fn vector_len(v: &Option<Array1<f64>>) -> Option<usize> {
            v.as_ref().map(|v| v.len())
        }
        if let Some(matrix) = &self.matrix {
            let target = out.matrix.as_ref().map(|m| m.dim());
            if target != Some(matrix.dim()) {
                let err = DataError::mismatch("page copy (matrix)", format!("{:?}", matrix.dim()), format!("{target:?}"));
                log::warn!("{err} Returning without copying.");
                return Err(err);
            }
        }
        for (label, source, target) in [
            ("page copy (vector)", &self.vector, &out.vector),
            ("page copy (weights)", &self.weights, &out.weights),
        ] {
            if source.is_some() && vector_len(source) != vector_len(target) {
                let err = DataError::mismatch(label, format!("{:?}", vector_len(source)), format!("{:?}", vector_len(target)));
                log::warn!("{err} Returning without copying.");
                return Err(err);
            }
        }

        if let (Some(source), Some(target)) = (&self.matrix, out.matrix.as_mut()) {
            target.assign(source);
        }
        if let (Some(source), Some(target)) = (&self.vector, out.vector.as_mut()) {
            target.assign(source);
        }
        if let (Some(source), Some(target)) = (&self.weights, out.weights.as_mut()) {
            target.assign(source);
        }
        let mut names = Names::new();
        names.title = self.names.title.clone();
        names.vector = self.names.vector.clone();
        for axis in [Axis::Rows, Axis::Columns, Axis::Text] {
            names.stack(&self.names, axis);
        }
        out.names = names;
        out.text = self.text.clone();
        Ok(())
    }

    /// Finds the first page in the chain, starting with this one, whose title
    /// matches `title` case-insensitively.
    pub fn get_page(&self, title: &str) -> Option<&Dataset> {
        let pattern = Pattern::new(title);
        self.pages().find(|page| pattern.is_match(&page.names.title))
    }

    pub fn get_page_mut(&mut self, title: &str) -> Option<&mut Dataset> {
        let pattern = Pattern::new(title);
        let mut page = Some(self);
        while let Some(current) = page {
            if pattern.is_match(&current.names.title) {
                return Some(current);
            }
            page = current.next.as_deref_mut();
        }
        None
    }

    /// Titles `page` and appends it after the last page of the chain.
    /// Returns the appended page.
    pub fn add_page(&mut self, mut page: Dataset, title: &str) -> &mut Dataset {
        page.names.title = title.to_string();
        let mut link = &mut self.next;
        while let Some(next) = link {
            link = &mut next.next;
        }
        &mut **link.insert(Box::new(page))
    }

    /// Unlinks the first page after the head whose title matches `title`.
    ///
    /// The head is never removed. The removed page comes back detached from
    /// the rest of the chain; dropping it frees it.
    pub fn remove_page(&mut self, title: &str) -> Option<Dataset> {
        let pattern = Pattern::new(title);
        let mut current = self;
        loop {
            let matches = match current.next.as_deref() {
                Some(next) => pattern.is_match(&next.names.title),
                None => {
                    log::warn!("Asked to remove page '{title}', but no page matches it.");
                    return None;
                }
            };
            if matches {
                let mut removed = current.next.take()?;
                current.next = removed.next.take();
                return Some(*removed);
            }
            current = current.next.as_deref_mut()?;
        }
    }

    /// Flattens the vector and then the matrix (row-major) into one array.
    pub fn pack(&self) -> Array1<f64> {
        let vector = self.vector.iter().flat_map(|v| v.iter().copied());
        let matrix = self.matrix.iter().flat_map(|m| m.iter().copied());
        vector.chain(matrix).collect()
    }

    /// Rebuilds a page from a packed array, the inverse of [`Dataset::pack`].
    pub fn unpack(
        packed: ArrayView1<f64>,
        vector_len: usize,
        rows: usize,
        cols: usize,
    ) -> Result<Dataset, DataError> {
        let mut page = Dataset::alloc(vector_len, rows, cols)?;
        page.fill(&packed.to_vec())?;
        Ok(page)
    }

    /// Writes `values` into the existing vector and matrix, in pack order.
    pub fn fill(&mut self, values: &[f64]) -> Result<(), DataError> {
        let vector_len = self.vector.as_ref().map_or(0, |v| v.len());
        let matrix_len = self.matrix.as_ref().map_or(0, |m| m.len());
        if values.len() != vector_len + matrix_len {
            return Err(DataError::mismatch(
                "fill",
                vector_len + matrix_len,
                values.len(),
            ));
        }
        if let Some(vector) = self.vector.as_mut() {
            vector.assign(&ArrayView1::from(&values[..vector_len]));
        }
        if let Some(matrix) = self.matrix.as_mut() {
            for (cell, &value) in matrix.iter_mut().zip(&values[vector_len..]) {
                *cell = value;
            }
        }
        Ok(())
    }

    /// Every numeric cell: the vector first, then the matrix row by row.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        let vector = self.vector.iter().flat_map(|v| v.iter().copied());
        let matrix = self.matrix.iter().flat_map(|m| m.iter().copied());
        vector.chain(matrix)
    }

    /// True when any numeric cell holds NaN, the missing-data marker.
    pub fn has_missing(&self) -> bool {
        self.values().any(f64::is_nan)
    }

    /// A new page holding the transposed matrix with row and column names
    /// swapped. The vector and text are left behind. `None` without a matrix.
    pub fn transpose(&self) -> Option<Dataset> {
        let Some(matrix) = self.matrix.as_ref() else {
            log::warn!("Input page has no matrix element, so there is nothing to transpose.");
            return None;
        };
        let mut out = Dataset::blank();
        out.matrix = Some(standard_layout(matrix.t().to_owned()));
        out.names.cross_stack(&self.names, Axis::Columns, Axis::Rows);
        out.names.cross_stack(&self.names, Axis::Rows, Axis::Columns);
        Some(out)
    }

    /// Rows `[start, end)` of the vector, matrix and weights as a new page.
    pub(crate) fn row_range(&self, start: usize, end: usize) -> Dataset {
        let clip = |len: usize| (start.min(len), end.min(len));
        let mut out = Dataset::blank();
        out.vector = self.vector.as_ref().map(|v| {
            let (lo, hi) = clip(v.len());
            v.slice(s![lo..hi]).to_owned()
        });
        out.weights = self.weights.as_ref().map(|w| {
            let (lo, hi) = clip(w.len());
            w.slice(s![lo..hi]).to_owned()
        });
        out.matrix = self.matrix.as_ref().map(|m| {
            let (lo, hi) = clip(m.nrows());
            standard_layout(m.slice(s![lo..hi, ..]).to_owned())
        });
        out.names.title = self.names.title.clone();
        out
    }
}

impl From<Array1<f64>> for Dataset {
    fn from(vector: Array1<f64>) -> Self {
        let mut page = Dataset::blank();
        page.vector = Some(vector);
        page
    }
}

impl From<Array2<f64>> for Dataset {
    fn from(matrix: Array2<f64>) -> Self {
        let mut page = Dataset::blank();
        page.matrix = Some(standard_layout(matrix));
        page
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::blank()
    }
}

impl Clone for Dataset {
    /// Deep-copies the whole chain, page by page.
    fn clone(&self) -> Self {
        let mut tail: Option<Box<Dataset>> = None;
        let later: Vec<&Dataset> = self.pages().skip(1).collect();
        for page in later.into_iter().rev() {
            let mut copy = page.copy_page();
            copy.next = tail;
            tail = Some(Box::new(copy));
        }
        let mut head = self.copy_page();
        head.next = tail;
        head
    }
}

impl Drop for Dataset {
    // Unlink iteratively so a long chain cannot overflow the stack.
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(mut page) = next {
            next = page.next.take();
        }
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("title", &self.names.title)
            .field("vector", &self.vector)
            .field("matrix", &self.matrix)
            .field("weights", &self.weights)
            .field("text", &self.text.dim())
            .field("names", &self.names)
            .field("pages", &self.pages().count())
            .finish()
    }
}

impl fmt::Display for Dataset {
    /// Tab-separated dump of every page: header of names, then one line per row.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, page) in self.pages().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            if !page.names.title.is_empty() {
                writeln!(f, "{}", page.names.title)?;
            }
            let cols = page.matrix.as_ref().map_or(0, |m| m.ncols());
            let mut header: Vec<String> = Vec::new();
            if page.vector.is_some() {
                header.push(page.names.vector.clone().unwrap_or_default());
            }
            for j in 0..cols {
                header.push(page.names.columns.get(j).cloned().unwrap_or_default());
            }
            header.extend(page.names.text.iter().cloned());
            if header.iter().any(|h| !h.is_empty()) {
                writeln!(f, "\t{}", header.join("\t"))?;
            }
            for i in 0..page.row_extent() {
                let mut line = vec![page.names.rows.get(i).cloned().unwrap_or_default()];
                if let Some(vector) = &page.vector {
                    line.push(vector.get(i).map_or_else(String::new, |v| v.to_string()));
                }
                if let Some(matrix) = &page.matrix {
                    for j in 0..matrix.ncols() {
                        line.push(matrix.get((i, j)).map_or_else(String::new, |v| v.to_string()));
                    }
                }
                for j in 0..page.text.ncols() {
                    line.push(page.text.get((i, j)).cloned().unwrap_or_default());
                }
                writeln!(f, "{}", line.join("\t"))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_page() -> Dataset {
        let mut page = Dataset::alloc(3, 3, 2).unwrap();
        page.vector = Some(array![1.0, 2.0, 3.0]);
        page.matrix = Some(array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        page.weights = Some(array![0.5, 0.25, 0.25]);
        page.names.add("a", Axis::Rows);
        page.names.add("x", Axis::Columns);
        page.text_alloc(2, 2);
        page.text[[1, 1]] = "cell".to_string();
        page
    }

    #[test]
    fn alloc_shapes_follow_the_argument_count() {
        let blank = Dataset::alloc(0, 0, 0).unwrap();
        assert!(blank.vector.is_none() && blank.matrix.is_none());

        let vector_only = Dataset::with_vector(4).unwrap();
        assert_eq!(vector_only.vector.as_ref().unwrap().len(), 4);
        assert!(vector_only.matrix.is_none());

        let matrix_only = Dataset::with_matrix(3, 4).unwrap();
        assert!(matrix_only.vector.is_none());
        assert_eq!(matrix_only.matrix.as_ref().unwrap().dim(), (3, 4));
        assert!(matrix_only.matrix.as_ref().unwrap().iter().all(|&x| x == 0.0));
        assert!(matrix_only.weights.is_none());
        assert!(matrix_only.names.columns.is_empty());

        let both = Dataset::alloc(2, 5, 6).unwrap();
        assert_eq!(both.vector.as_ref().unwrap().len(), 2);
        assert_eq!(both.matrix.as_ref().unwrap().dim(), (5, 6));
    }

    #[test]
    fn impossible_allocation_is_reported() {
        let err = Dataset::with_matrix(usize::MAX, 2).unwrap_err();
        assert!(matches!(err, DataError::Allocation { .. }));
    }

    #[test]
    fn clone_is_deep_and_follows_the_chain() {
        let mut original = sample_page();
        original.add_page(Dataset::with_vector(2).unwrap(), "second");

        let mut copy = original.clone();
        assert_eq!(copy, original);

        copy.set(0, 0, 99.0).unwrap();
        copy.text[[1, 1]] = "changed".to_string();
        copy.get_page_mut("second").unwrap().set(0, -1, 7.0).unwrap();
        assert_eq!(original.get(0, 0).unwrap(), 1.0);
        assert_eq!(original.text[[1, 1]], "cell");
        assert_eq!(original.get_page("second").unwrap().get(0, -1).unwrap(), 0.0);
    }

    #[test]
    fn copy_page_leaves_the_chain_behind() {
        let mut original = sample_page();
        original.add_page(Dataset::blank(), "extra");
        let single = original.copy_page();
        assert!(single.next_page().is_none());
        assert_eq!(single.matrix, original.matrix);
    }

    #[test]
    fn copy_into_rejects_mismatched_shapes_without_writing() {
        let source = sample_page();
        let mut target = Dataset::alloc(3, 2, 2).unwrap();
        let before = target.clone();
        let err = source.copy_into(&mut target).unwrap_err();
        assert!(matches!(err, DataError::DimensionMismatch { .. }));
        assert_eq!(target, before);
    }

    #[test]
    fn copy_into_writes_values_names_and_text() {
        let source = sample_page();
        let mut target = Dataset::alloc(3, 3, 2).unwrap();
        target.weights = Some(Array1::zeros(3));
        source.copy_into(&mut target).unwrap();
        assert_eq!(target.matrix, source.matrix);
        assert_eq!(target.weights, source.weights);
        assert_eq!(target.names.rows, vec!["a"]);
        assert_eq!(target.text[[1, 1]], "cell");
    }

    #[test]
    fn pages_are_found_added_and_removed_by_pattern() {
        let mut head = Dataset::blank();
        head.names.title = "main".to_string();
        head.add_page(Dataset::with_vector(1).unwrap(), "Info");
        head.add_page(Dataset::with_vector(2).unwrap(), "Covariance");
        head.add_page(Dataset::with_vector(3).unwrap(), "Extra");

        assert_eq!(head.pages().count(), 4);
        assert_eq!(head.get_page("^cov").unwrap().vector.as_ref().unwrap().len(), 2);
        assert!(head.get_page("missing").is_none());
        assert_eq!(head.get_page("MAIN").unwrap().title(), "main");

        let removed = head.remove_page("covariance").unwrap();
        assert!(removed.next_page().is_none());
        assert_eq!(head.pages().count(), 3);
        assert_eq!(head.get_page("extra").unwrap().vector.as_ref().unwrap().len(), 3);

        // The head page is never a removal candidate.
        assert!(head.remove_page("main").is_none());
        assert_eq!(head.pages().count(), 3);
    }

    #[test]
    fn long_chains_drop_without_recursion() {
        let mut head = Dataset::blank();
        let mut tail = &mut head;
        for _ in 0..100_000 {
            tail = &mut **tail.next.insert(Box::new(Dataset::blank()));
        }
        drop(head);
    }

    #[test]
    fn pack_then_unpack_reproduces_the_page() {
        let mut params = Dataset::alloc(2, 2, 3).unwrap();
        params.fill(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();
        let packed = params.pack();
        assert_eq!(packed.to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);

        let rebuilt = Dataset::unpack(packed.view(), 2, 2, 3).unwrap();
        assert_eq!(rebuilt.vector, params.vector);
        assert_eq!(rebuilt.matrix, params.matrix);
        assert_eq!(rebuilt.matrix.as_ref().unwrap()[[1, 0]], 6.0);
    }

    #[test]
    fn unpack_rejects_wrong_lengths() {
        let packed = array![1.0, 2.0, 3.0];
        assert!(matches!(
            Dataset::unpack(packed.view(), 1, 1, 1),
            Err(DataError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn transpose_swaps_matrix_and_names() {
        let mut page = Dataset::from(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        page.vector = Some(array![9.0, 9.0]);
        page.names.add("r0", Axis::Rows);
        page.names.add("r1", Axis::Rows);
        page.names.add("c0", Axis::Columns);

        let flipped = page.transpose().unwrap();
        assert_eq!(flipped.matrix.as_ref().unwrap(), &array![[1.0, 4.0], [2.0, 5.0], [3.0, 6.0]]);
        assert!(flipped.matrix.as_ref().unwrap().is_standard_layout());
        assert!(flipped.vector.is_none());
        assert_eq!(flipped.names.rows, vec!["c0"]);
        assert_eq!(flipped.names.columns, vec!["r0", "r1"]);

        assert!(Dataset::with_vector(3).unwrap().transpose().is_none());
    }

    #[test]
    fn display_lists_names_and_values() {
        let page = sample_page();
        let shown = page.to_string();
        assert!(shown.contains("\tx"));
        assert!(shown.starts_with("\t\tx"));
        assert!(shown.contains("a\t1\t1\t2"));
    }
}
