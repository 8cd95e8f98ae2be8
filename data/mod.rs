//! # Paged Data Sets
//!
//! A [`Dataset`] page bundles an optional numeric vector, an optional numeric
//! matrix, an optional weights vector, a grid of text, and a [`Names`] table.
//! Pages chain through an owned `next` link, and callers find a page by
//! matching its title against a pattern.
//!
//! The vector is addressed as column `-1` of the matrix, so a regression's
//! dependent variable can ride alongside its predictors.

use thiserror::Error;

pub mod access;
pub mod dataset;
pub mod names;
pub mod reshape;
pub mod text;

pub use access::Cell;
pub use dataset::{Dataset, INFO_PAGE};
pub use names::{Axis, Names, Pattern};
pub use reshape::{resize_matrix, resize_vector};

/// Every way a structural operation on a [`Dataset`] can fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Could not allocate storage for {elements} elements.")]
    Allocation { elements: usize },

    #[error("Dimension mismatch in {context}: expected {expected}, found {found}.")]
    DimensionMismatch {
        context: &'static str,
        expected: String,
        found: String,
    },

    #[error("Couldn't find '{name}' amongst the {axis} names.")]
    NameNotFound { name: String, axis: Axis },

    #[error("No page has a title matching '{0}'.")]
    PageNotFound(String),

    #[error("Axis '{0}' is not valid here; use rows or columns.")]
    InvalidAxis(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("The {0} this operation needs is absent.")]
    NullTarget(&'static str),

    #[error("Only owned, contiguous arrays can be resized; this one is a strided view of its storage.")]
    NotResizable,

    #[error("Index ({row}, {col}) is outside a {rows} x {cols} target.")]
    OutOfBounds {
        row: usize,
        col: isize,
        rows: usize,
        cols: usize,
    },
}

impl DataError {
    pub(crate) fn mismatch(
        context: &'static str,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        DataError::DimensionMismatch {
            context,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
