use super::lifecycle::{Model, Shape};
use super::ModelError;
use crate::data::Dataset;
use ndarray::Array1;
use rand::RngCore;
use std::fmt;

/// The behaviors a family of models may provide.
///
/// Every optional behavior returns `None` when the family does not implement
/// it, and the dispatch layer on [`Model`] then substitutes its generic
/// fallback. A family only writes the methods it knows in closed form.
pub trait ModelFamily: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn shape(&self) -> Shape;

    /// Custom preparation, replacing [`Model::clear`].
    fn prepare(&self, _: &Dataset, _: &mut Model) -> Option<Result<(), ModelError>> {
        None
    }

    /// Fits `model`, which is already prepared against `data`, in place.
    fn estimate(&self, _: &Dataset, _: &mut Model) -> Option<Result<(), ModelError>> {
        None
    }

    fn p(&self, _: &Dataset, _: &Model) -> Option<Result<f64, ModelError>> {
        None
    }

    fn log_likelihood(&self, _: &Dataset, _: &Model) -> Option<Result<f64, ModelError>> {
        None
    }

    /// Gradient of the log likelihood with respect to the packed parameters.
    fn score(&self, _: &Dataset, _: &Model) -> Option<Result<Array1<f64>, ModelError>> {
        None
    }

    /// Moves infeasible parameters onto the feasible region and returns the
    /// penalty for having been outside it (zero when already feasible).
    fn constraint(&self, _: &Dataset, _: &mut Model) -> Option<f64> {
        None
    }

    /// One draw, as a packed parameter-shaped or data-shaped row.
    fn draw(&self, _: &mut dyn RngCore, _: &Model) -> Option<Result<Vec<f64>, ModelError>> {
        None
    }

    fn predict(&self, _: &Dataset, _: &Model) -> Option<Result<Dataset, ModelError>> {
        None
    }

    fn cdf(&self, _: &Dataset, _: &Model) -> Option<Result<f64, ModelError>> {
        None
    }

    /// A prepared model of this family with the given packed parameters.
    fn with(self, parameters: &[f64]) -> Result<Model, ModelError>
    where
        Self: Sized + 'static,
    {
        Model::new(self).with_parameters(parameters)
    }
}
