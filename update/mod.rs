//! # Bayesian Updating
//!
//! [`update`] turns a prior and a likelihood into a posterior. Known
//! conjugate pairs are updated in closed form ([`conjugate`]); every other
//! pair goes through a Metropolis-Hastings walk ([`metropolis`]) whose
//! samples become a histogram model.

use crate::data::DataError;
use crate::model::ModelError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod conjugate;
pub mod metropolis;

pub use conjugate::conjugate_posterior;
pub use metropolis::{Walk, update, walk};

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(
        "Trouble evaluating the likelihood at the parameters starting with {current} (current) or {candidate} (candidate). Try another starting point."
    )]
    NumericInstability { current: f64, candidate: f64 },

    #[error("The walk recorded no samples: {periods} periods with a burn-in of {burn_in} leaves nothing to keep.")]
    EmptySample { periods: usize, burn_in: f64 },
}

/// Length and shape of a Metropolis-Hastings run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateSettings {
    pub periods: usize,
    /// Leading fraction of the periods that is walked but not recorded.
    pub burn_in: f64,
    /// Bins per dimension of the histogram posterior.
    pub histogram_bins: usize,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            periods: 6000,
            burn_in: 0.05,
            histogram_bins: 100,
        }
    }
}

impl UpdateSettings {
    /// First period whose state is recorded.
    pub fn first_recorded(&self) -> usize {
        (self.periods as f64 * self.burn_in).ceil().max(0.0) as usize
    }
}
