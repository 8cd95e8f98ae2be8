//! Metropolis-Hastings updating for pairs without a closed form.
//!
//! Candidates are drawn from the prior and accepted on the likelihood ratio,
//! so the chain's stationary distribution is the posterior. Every period past
//! the burn-in records the chain's current state, in chain order.

use super::conjugate::conjugate_posterior;
use super::{UpdateError, UpdateSettings};
use crate::data::{DataError, Dataset};
use crate::model::histogram;
use crate::model::{Model, ModelError};
use ndarray::Array2;
use rand::{Rng, RngCore};

/// The recorded part of one chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Walk {
    /// One packed parameter vector per recorded period.
    pub samples: Array2<f64>,
    pub accepted: usize,
    pub periods: usize,
}

impl Walk {
    pub fn acceptance_rate(&self) -> f64 {
        if self.periods == 0 {
            0.0
        } else {
            self.accepted as f64 / self.periods as f64
        }
    }
}

/// Log likelihood of `data` under `model`, with parameters the family
/// rejects counted as impossible.
fn chain_log_likelihood(data: &Dataset, model: &Model) -> Result<f64, UpdateError> {
    match model.log_likelihood(data) {
        Ok(ll) => Ok(ll),
        Err(ModelError::InvalidParameters { .. }) => Ok(f64::NEG_INFINITY),
        Err(e) => Err(e.into()),
    }
}

fn first_value(model: &Model) -> f64 {
    model
        .parameters()
        .ok()
        .and_then(|p| p.values().next())
        .unwrap_or(f64::NAN)
}

/// Runs the chain. The current state starts at `starting_point`, or all ones,
/// in the likelihood's parameter shape for `data`.
pub fn walk(
    data: &Dataset,
    prior: &Model,
    likelihood: &Model,
    starting_point: Option<&Dataset>,
    rng: &mut dyn RngCore,
    settings: &UpdateSettings,
) -> Result<Walk, UpdateError> {
    if !(0.0..=1.0).contains(&settings.burn_in) {
        return Err(ModelError::InvalidArgument(format!(
            "burn-in must be a fraction between zero and one, got {}",
            settings.burn_in
        ))
        .into());
    }
    let mut prior = prior.clone();
    let mut current = likelihood.clone();
    current.prepare(data)?;
    {
        let parameters = current.parameters_mut()?;
        match starting_point {
            Some(start) => start.copy_into(parameters)?,
            None => {
                let size = parameters.pack().len();
                parameters.fill(&vec![1.0; size])?;
            }
        }
    }
    let size = current.parameters()?.pack().len();
    let mut candidate = current.clone();
    let mut current_ll = chain_log_likelihood(data, &current)?;

    let first = settings.first_recorded().min(settings.periods);
    let mut samples = Array2::zeros((settings.periods - first, size));
    let mut accepted = 0usize;
    log::debug!(
        "Walking {} periods for the {} likelihood under the {} prior, recording from period {first}",
        settings.periods,
        current.name,
        prior.name
    );

    for period in 0..settings.periods {
        let draw = prior.draw(rng)?;
        if draw.len() != size {
            return Err(DataError::mismatch("prior draw", size, draw.len()).into());
        }
        candidate.parameters_mut()?.fill(&draw)?;
        let candidate_ll = chain_log_likelihood(data, &candidate)?;
        let ratio = candidate_ll - current_ll;
        if ratio.is_nan() {
            return Err(UpdateError::NumericInstability {
                current: first_value(&current),
                candidate: first_value(&candidate),
            });
        }
        if ratio >= 0.0 || rng.r#gen::<f64>().ln() < ratio {
            std::mem::swap(&mut current, &mut candidate);
            current_ll = candidate_ll;
            accepted += 1;
        }
        if period >= first {
            samples.row_mut(period - first).assign(&current.parameters()?.pack());
        }
    }

    let walk = Walk {
        samples,
        accepted,
        periods: settings.periods,
    };
    log::info!(
        "Metropolis walk accepted {accepted} of {} candidates ({:.1}%)",
        settings.periods,
        100.0 * walk.acceptance_rate()
    );
    Ok(walk)
}

/// The posterior of `prior` after observing `data` under `likelihood`.
///
/// Conjugate pairs come back as an updated copy of the prior without
/// touching `rng`. Anything else is a histogram of a Metropolis walk.
pub fn update(
    data: &Dataset,
    prior: &Model,
    likelihood: &Model,
    starting_point: Option<&Dataset>,
    rng: &mut dyn RngCore,
    settings: &UpdateSettings,
) -> Result<Model, UpdateError> {
    if let Some(posterior) = conjugate_posterior(data, prior, likelihood) {
        return posterior;
    }
    let chain = walk(data, prior, likelihood, starting_point, rng, settings)?;
    if chain.samples.nrows() == 0 {
        return Err(UpdateError::EmptySample {
            periods: settings.periods,
            burn_in: settings.burn_in,
        });
    }
    Ok(histogram::from_samples(&chain.samples, settings.histogram_bins)?)
}
