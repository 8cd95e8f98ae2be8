//! # Models
//!
//! A [`Model`] couples a parameter [`Dataset`](crate::data::Dataset) with a
//! [`ModelFamily`] that supplies whichever behaviors the family knows in
//! closed form. Everything a family leaves out is filled in at call time:
//!
//! - `estimate` falls back to maximum likelihood ([`mle`]).
//! - `p` and `log_likelihood` are derived from one another.
//! - `score` falls back to a numeric gradient.
//! - `draw` falls back to an adaptive rejection sampler ([`arms`]).
//! - `cdf` falls back to counting draws.
//! - `predict` falls back to missing-data imputation ([`impute`]).

use crate::data::DataError;
use thiserror::Error;

pub mod arms;
pub mod dispatch;
pub mod families;
pub mod family;
pub mod histogram;
pub mod impute;
pub mod lifecycle;
pub mod mle;
pub mod settings;

pub use family::ModelFamily;
pub use lifecycle::{Base, Model, Shape};
pub use settings::{ArmsSettings, CdfSettings, Group, MleSettings, Settings};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("The {0} model has neither a probability nor a log likelihood function.")]
    NoLikelihoodDefined(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Parameters of the {model} model are unusable: {reason}")]
    InvalidParameters { model: String, reason: String },

    #[error("The settings group '{0}' is already registered with another type.")]
    SettingsCollision(&'static str),

    #[error("Optimization failed: {0}")]
    Optimization(String),

    #[error("The sampler for the {model} model gave up after {attempts} attempts without accepting a draw.")]
    SamplerExhausted { model: String, attempts: usize },
}
