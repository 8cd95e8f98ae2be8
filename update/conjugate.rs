//! Closed-form posteriors for the conjugate pairs the crate knows.

use crate::data::Dataset;
use crate::model::Model;
use crate::model::families::{
    BERNOULLI_NAME, BETA_NAME, BINOMIAL_NAME, EXPONENTIAL_NAME, GAMMA_NAME, POISSON_NAME,
};
use super::UpdateError;

/// Sufficient statistics of the observed cells: the matrix when there is
/// one, the vector otherwise.
struct Tally {
    cells: f64,
    sum: f64,
    nonzero: f64,
}

impl Tally {
    fn of(data: &Dataset) -> Self {
        let cells: Vec<f64> = match (&data.matrix, &data.vector) {
            (Some(matrix), _) => matrix.iter().copied().collect(),
            (None, Some(vector)) => vector.to_vec(),
            (None, None) => Vec::new(),
        };
        Self {
            cells: cells.len() as f64,
            sum: cells.iter().sum(),
            nonzero: cells.iter().filter(|&&x| x != 0.0).count() as f64,
        }
    }
}

/// Increments the prior's first two parameters by `(first, second)`.
fn incremented(prior: &Model, first: f64, second: f64) -> Result<Model, UpdateError> {
    let mut posterior = prior.clone();
    let parameters = posterior.parameters_mut()?;
    let a = parameters.get(0, -1)?;
    let b = parameters.get(1, -1)?;
    parameters.set(0, -1, a + first)?;
    parameters.set(1, -1, b + second)?;
    posterior.log_likelihood = None;
    Ok(posterior)
}

/// The posterior for a known conjugate `(prior, likelihood)` pair, or
/// `None` when the pair has no closed form here.
pub fn conjugate_posterior(
    data: &Dataset,
    prior: &Model,
    likelihood: &Model,
) -> Option<Result<Model, UpdateError>> {
    let tally = Tally::of(data);
    let increments = match (prior.name.as_str(), likelihood.name.as_str()) {
        (GAMMA_NAME, EXPONENTIAL_NAME) => (tally.cells, tally.sum),
        (GAMMA_NAME, POISSON_NAME) => (tally.sum, tally.cells),
        (BETA_NAME, BINOMIAL_NAME) => (tally.sum, tally.cells - tally.sum),
        (BETA_NAME, BERNOULLI_NAME) => (tally.nonzero, tally.cells - tally.nonzero),
        _ => return None,
    };
    log::info!(
        "{} prior with {} likelihood is conjugate; updating in closed form.",
        prior.name,
        likelihood.name
    );
    Some(incremented(prior, increments.0, increments.1))
}
