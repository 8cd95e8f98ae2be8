//! Concrete distribution families.
//!
//! Each takes every numeric cell of the data page as one observation and
//! keeps its parameters in the parameter vector. A family implements only
//! what it has in closed form; the rest goes through the generic fallbacks.

use super::ModelError;
use super::dispatch::query_point;
use super::family::ModelFamily;
use super::lifecycle::{Model, Shape};
use crate::data::Dataset;
use ndarray::{Array1, array};
use rand::RngCore;
use rand::distributions::{Bernoulli as BernoulliDraw, Distribution};
use rand_distr::{
    Beta as BetaDraw, Binomial as BinomialDraw, Exp, Gamma as GammaDraw, Normal as NormalDraw,
    Poisson as PoissonDraw,
};
use statrs::distribution::{ContinuousCDF, DiscreteCDF, Exp as ExpCdf, Poisson as PoissonCdf};
use statrs::function::beta::ln_beta;
use statrs::function::gamma::ln_gamma;
use std::f64::consts::PI;

pub const NORMAL_NAME: &str = "Normal distribution";
pub const GAMMA_NAME: &str = "Gamma distribution";
pub const EXPONENTIAL_NAME: &str = "Exponential distribution";
pub const BETA_NAME: &str = "Beta distribution";
pub const BERNOULLI_NAME: &str = "Bernoulli distribution";
pub const BINOMIAL_NAME: &str = "Binomial distribution";
pub const POISSON_NAME: &str = "Poisson distribution";

/// Smallest value a strictly positive parameter is pushed back to.
const FLOOR: f64 = 1e-8;

fn parameters<const N: usize>(model: &Model) -> Result<[f64; N], ModelError> {
    let vector = model.parameters()?.vector_or_err()?;
    if vector.len() != N {
        return Err(ModelError::InvalidParameters {
            model: model.name.clone(),
            reason: format!("expected {N} parameters, found {}", vector.len()),
        });
    }
    let mut out = [0.0; N];
    for (slot, &value) in out.iter_mut().zip(vector) {
        *slot = value;
    }
    Ok(out)
}

fn invalid(model: &Model, reason: impl Into<String>) -> ModelError {
    ModelError::InvalidParameters {
        model: model.name.clone(),
        reason: reason.into(),
    }
}

fn observations(data: &Dataset) -> Vec<f64> {
    data.values().collect()
}

/// Clamps parameter `index` into `[low, high]`, returning how far it moved.
fn clamp_parameter(model: &mut Model, index: usize, low: f64, high: f64) -> f64 {
    let Ok(parameters) = model.parameters_mut() else {
        return 0.0;
    };
    let Ok(cell) = parameters.ptr(index, -1) else {
        return 0.0;
    };
    let clamped = cell.clamp(low, high);
    let moved = (clamped - *cell).abs();
    *cell = clamped;
    moved
}

/// First coordinate of the CDF query point; NaN is refused.
fn cdf_point(data: &Dataset, model: &Model) -> Result<f64, ModelError> {
    let x = query_point(data)?[0];
    if x.is_nan() {
        return Err(invalid(model, "the CDF is undefined at NaN"));
    }
    Ok(x)
}

fn set_estimates(model: &mut Model, values: &[f64], data: &Dataset) -> Result<(), ModelError> {
    model.parameters_mut()?.fill(values)?;
    model.log_likelihood = Some(model.log_likelihood(data)?);
    Ok(())
}

/// Parameters `[mu, sigma]`.
#[derive(Debug, Clone, Copy)]
pub struct Normal;

impl Normal {
    fn ll(data: &Dataset, model: &Model) -> Result<f64, ModelError> {
        let [mu, sigma] = parameters(model)?;
        if !(sigma > 0.0) {
            return Err(invalid(model, format!("sigma must be positive, got {sigma}")));
        }
        let norm = -0.5 * (2.0 * PI).ln() - sigma.ln();
        Ok(data
            .values()
            .map(|x| norm - (x - mu).powi(2) / (2.0 * sigma * sigma))
            .sum())
    }

    fn gradient(data: &Dataset, model: &Model) -> Result<Array1<f64>, ModelError> {
        let [mu, sigma] = parameters(model)?;
        let (mut d_mu, mut d_sigma) = (0.0, 0.0);
        for x in data.values() {
            let dev = x - mu;
            d_mu += dev / (sigma * sigma);
            d_sigma += dev * dev / sigma.powi(3) - 1.0 / sigma;
        }
        Ok(array![d_mu, d_sigma])
    }

    fn fit(data: &Dataset, model: &mut Model) -> Result<(), ModelError> {
        let xs = observations(data);
        if xs.is_empty() {
            return Err(ModelError::InvalidArgument("no observations to estimate from".to_string()));
        }
        let n = xs.len() as f64;
        let mean = xs.iter().sum::<f64>() / n;
        let variance = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        set_estimates(model, &[mean, variance.sqrt()], data)
    }
}

impl ModelFamily for Normal {
    fn name(&self) -> &str {
        NORMAL_NAME
    }
    fn shape(&self) -> Shape {
        Shape::vector(2)
    }
    fn estimate(&self, data: &Dataset, model: &mut Model) -> Option<Result<(), ModelError>> {
        Some(Normal::fit(data, model))
    }
    fn log_likelihood(&self, data: &Dataset, model: &Model) -> Option<Result<f64, ModelError>> {
        Some(Normal::ll(data, model))
    }
    fn score(&self, data: &Dataset, model: &Model) -> Option<Result<Array1<f64>, ModelError>> {
        Some(Normal::gradient(data, model))
    }
    fn constraint(&self, _: &Dataset, model: &mut Model) -> Option<f64> {
        Some(clamp_parameter(model, 1, FLOOR, f64::INFINITY))
    }
    fn draw(&self, rng: &mut dyn RngCore, model: &Model) -> Option<Result<Vec<f64>, ModelError>> {
        Some(parameters(model).and_then(|[mu, sigma]| {
            let normal = NormalDraw::new(mu, sigma).map_err(|e| invalid(model, e.to_string()))?;
            Ok(vec![normal.sample(rng)])
        }))
    }
}

/// Parameters `[shape, rate]`.
#[derive(Debug, Clone, Copy)]
pub struct Gamma;

impl Gamma {
    fn ll(data: &Dataset, model: &Model) -> Result<f64, ModelError> {
        let [shape, rate] = parameters(model)?;
        if !(shape > 0.0 && rate > 0.0) {
            return Err(invalid(model, format!("shape and rate must be positive, got {shape} and {rate}")));
        }
        let norm = shape * rate.ln() - ln_gamma(shape);
        Ok(data
            .values()
            .map(|x| {
                if x > 0.0 {
                    norm + (shape - 1.0) * x.ln() - rate * x
                } else {
                    f64::NEG_INFINITY
                }
            })
            .sum())
    }
}

impl ModelFamily for Gamma {
    fn name(&self) -> &str {
        GAMMA_NAME
    }
    fn shape(&self) -> Shape {
        Shape::vector(2)
    }
    fn log_likelihood(&self, data: &Dataset, model: &Model) -> Option<Result<f64, ModelError>> {
        Some(Gamma::ll(data, model))
    }
    fn constraint(&self, _: &Dataset, model: &mut Model) -> Option<f64> {
        Some(clamp_parameter(model, 0, FLOOR, f64::INFINITY) + clamp_parameter(model, 1, FLOOR, f64::INFINITY))
    }
    fn draw(&self, rng: &mut dyn RngCore, model: &Model) -> Option<Result<Vec<f64>, ModelError>> {
        Some(parameters(model).and_then(|[shape, rate]| {
            let gamma = GammaDraw::new(shape, 1.0 / rate).map_err(|e| invalid(model, e.to_string()))?;
            Ok(vec![gamma.sample(rng)])
        }))
    }
}

/// Parameter `[rate]`.
#[derive(Debug, Clone, Copy)]
pub struct Exponential;

impl Exponential {
    fn ll(data: &Dataset, model: &Model) -> Result<f64, ModelError> {
        let [rate] = parameters(model)?;
        if !(rate > 0.0) {
            return Err(invalid(model, format!("rate must be positive, got {rate}")));
        }
        Ok(data
            .values()
            .map(|x| if x >= 0.0 { rate.ln() - rate * x } else { f64::NEG_INFINITY })
            .sum())
    }
}

impl ModelFamily for Exponential {
    fn name(&self) -> &str {
        EXPONENTIAL_NAME
    }
    fn shape(&self) -> Shape {
        Shape::vector(1)
    }
    fn estimate(&self, data: &Dataset, model: &mut Model) -> Option<Result<(), ModelError>> {
        let xs = observations(data);
        let total: f64 = xs.iter().sum();
        if xs.is_empty() || !(total > 0.0) {
            return Some(Err(ModelError::InvalidArgument(
                "the exponential rate needs observations with a positive sum".to_string(),
            )));
        }
        Some(set_estimates(model, &[xs.len() as f64 / total], data))
    }
    fn log_likelihood(&self, data: &Dataset, model: &Model) -> Option<Result<f64, ModelError>> {
        Some(Exponential::ll(data, model))
    }
    fn score(&self, data: &Dataset, model: &Model) -> Option<Result<Array1<f64>, ModelError>> {
        Some(parameters(model).map(|[rate]| {
            let xs = observations(data);
            array![xs.len() as f64 / rate - xs.iter().sum::<f64>()]
        }))
    }
    fn constraint(&self, _: &Dataset, model: &mut Model) -> Option<f64> {
        Some(clamp_parameter(model, 0, FLOOR, f64::INFINITY))
    }
    fn draw(&self, rng: &mut dyn RngCore, model: &Model) -> Option<Result<Vec<f64>, ModelError>> {
        Some(parameters(model).and_then(|[rate]| {
            let exp = Exp::new(rate).map_err(|e| invalid(model, e.to_string()))?;
            Ok(vec![exp.sample(rng)])
        }))
    }
    /// Evaluated at the first coordinate of the query point.
    fn cdf(&self, data: &Dataset, model: &Model) -> Option<Result<f64, ModelError>> {
        Some(parameters(model).and_then(|[rate]| {
            let x = cdf_point(data, model)?;
            let exp = ExpCdf::new(rate).map_err(|e| invalid(model, e.to_string()))?;
            Ok(exp.cdf(x))
        }))
    }
}

/// Parameters `[alpha, beta]`.
#[derive(Debug, Clone, Copy)]
pub struct Beta;

impl Beta {
    fn ll(data: &Dataset, model: &Model) -> Result<f64, ModelError> {
        let [alpha, beta] = parameters(model)?;
        if !(alpha > 0.0 && beta > 0.0) {
            return Err(invalid(model, format!("alpha and beta must be positive, got {alpha} and {beta}")));
        }
        let norm = ln_beta(alpha, beta);
        Ok(data
            .values()
            .map(|x| {
                if x > 0.0 && x < 1.0 {
                    (alpha - 1.0) * x.ln() + (beta - 1.0) * (1.0 - x).ln() - norm
                } else {
                    f64::NEG_INFINITY
                }
            })
            .sum())
    }
}

impl ModelFamily for Beta {
    fn name(&self) -> &str {
        BETA_NAME
    }
    fn shape(&self) -> Shape {
        Shape::vector(2)
    }
    fn log_likelihood(&self, data: &Dataset, model: &Model) -> Option<Result<f64, ModelError>> {
        Some(Beta::ll(data, model))
    }
    fn constraint(&self, _: &Dataset, model: &mut Model) -> Option<f64> {
        Some(clamp_parameter(model, 0, FLOOR, f64::INFINITY) + clamp_parameter(model, 1, FLOOR, f64::INFINITY))
    }
    fn draw(&self, rng: &mut dyn RngCore, model: &Model) -> Option<Result<Vec<f64>, ModelError>> {
        Some(parameters(model).and_then(|[alpha, beta]| {
            let draw = BetaDraw::new(alpha, beta).map_err(|e| invalid(model, e.to_string()))?;
            Ok(vec![draw.sample(rng)])
        }))
    }
}

/// Counts cells that are nonzero (hits) and the total number of cells.
fn hits_and_trials(data: &Dataset) -> (f64, f64) {
    data.values().fold((0.0, 0.0), |(hits, trials), x| {
        (hits + if x != 0.0 { 1.0 } else { 0.0 }, trials + 1.0)
    })
}

fn check_probability(model: &Model, p: f64) -> Result<(), ModelError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(invalid(model, format!("p must lie in [0, 1], got {p}")))
    }
}

/// Parameter `[p]`. Any nonzero cell is a success.
#[derive(Debug, Clone, Copy)]
pub struct Bernoulli;

impl ModelFamily for Bernoulli {
    fn name(&self) -> &str {
        BERNOULLI_NAME
    }
    fn shape(&self) -> Shape {
        Shape::vector(1)
    }
    fn estimate(&self, data: &Dataset, model: &mut Model) -> Option<Result<(), ModelError>> {
        let (hits, trials) = hits_and_trials(data);
        if trials == 0.0 {
            return Some(Err(ModelError::InvalidArgument("no observations to estimate from".to_string())));
        }
        Some(set_estimates(model, &[hits / trials], data))
    }
    fn log_likelihood(&self, data: &Dataset, model: &Model) -> Option<Result<f64, ModelError>> {
        Some(parameters(model).and_then(|[p]| {
            check_probability(model, p)?;
            let (hits, trials) = hits_and_trials(data);
            Ok(xlogy(hits, p) + xlogy(trials - hits, 1.0 - p))
        }))
    }
    fn constraint(&self, _: &Dataset, model: &mut Model) -> Option<f64> {
        Some(clamp_parameter(model, 0, 0.0, 1.0))
    }
    fn draw(&self, rng: &mut dyn RngCore, model: &Model) -> Option<Result<Vec<f64>, ModelError>> {
        Some(parameters(model).and_then(|[p]| {
            let coin = BernoulliDraw::new(p).map_err(|e| invalid(model, e.to_string()))?;
            Ok(vec![if coin.sample(rng) { 1.0 } else { 0.0 }])
        }))
    }
}

/// `k ln p`, taken as zero when `k` is zero so that certain outcomes are finite.
fn xlogy(k: f64, p: f64) -> f64 {
    if k == 0.0 { 0.0 } else { k * p.ln() }
}

/// Parameters `[n, p]`. Cells are individual trials; a nonzero cell is a
/// success. A draw is the success count of `n` trials.
#[derive(Debug, Clone, Copy)]
pub struct Binomial;

impl ModelFamily for Binomial {
    fn name(&self) -> &str {
        BINOMIAL_NAME
    }
    fn shape(&self) -> Shape {
        Shape::vector(2)
    }
    fn estimate(&self, data: &Dataset, model: &mut Model) -> Option<Result<(), ModelError>> {
        let (hits, trials) = hits_and_trials(data);
        if trials == 0.0 {
            return Some(Err(ModelError::InvalidArgument("no observations to estimate from".to_string())));
        }
        Some(set_estimates(model, &[trials, hits / trials], data))
    }
    fn log_likelihood(&self, data: &Dataset, model: &Model) -> Option<Result<f64, ModelError>> {
        Some(parameters(model).and_then(|[_, p]| {
            check_probability(model, p)?;
            let (hits, trials) = hits_and_trials(data);
            let choose = ln_gamma(trials + 1.0) - ln_gamma(hits + 1.0) - ln_gamma(trials - hits + 1.0);
            Ok(choose + xlogy(hits, p) + xlogy(trials - hits, 1.0 - p))
        }))
    }
    fn constraint(&self, _: &Dataset, model: &mut Model) -> Option<f64> {
        Some(clamp_parameter(model, 0, 0.0, f64::INFINITY) + clamp_parameter(model, 1, 0.0, 1.0))
    }
    fn draw(&self, rng: &mut dyn RngCore, model: &Model) -> Option<Result<Vec<f64>, ModelError>> {
        Some(parameters(model).and_then(|[n, p]| {
            if !(n >= 0.0) {
                return Err(invalid(model, format!("n must be nonnegative, got {n}")));
            }
            let draw = BinomialDraw::new(n.round() as u64, p).map_err(|e| invalid(model, e.to_string()))?;
            Ok(vec![draw.sample(rng) as f64])
        }))
    }
}

/// Parameter `[lambda]`.
#[derive(Debug, Clone, Copy)]
pub struct Poisson;

impl Poisson {
    fn ll(data: &Dataset, model: &Model) -> Result<f64, ModelError> {
        let [lambda] = parameters(model)?;
        if !(lambda > 0.0) {
            return Err(invalid(model, format!("lambda must be positive, got {lambda}")));
        }
        Ok(data
            .values()
            .map(|x| {
                if x >= 0.0 && x.fract() == 0.0 {
                    x * lambda.ln() - lambda - ln_gamma(x + 1.0)
                } else {
                    f64::NEG_INFINITY
                }
            })
            .sum())
    }
}

impl ModelFamily for Poisson {
    fn name(&self) -> &str {
        POISSON_NAME
    }
    fn shape(&self) -> Shape {
        Shape::vector(1)
    }
    fn estimate(&self, data: &Dataset, model: &mut Model) -> Option<Result<(), ModelError>> {
        let xs = observations(data);
        if xs.is_empty() {
            return Some(Err(ModelError::InvalidArgument("no observations to estimate from".to_string())));
        }
        Some(set_estimates(model, &[xs.iter().sum::<f64>() / xs.len() as f64], data))
    }
    fn log_likelihood(&self, data: &Dataset, model: &Model) -> Option<Result<f64, ModelError>> {
        Some(Poisson::ll(data, model))
    }
    fn score(&self, data: &Dataset, model: &Model) -> Option<Result<Array1<f64>, ModelError>> {
        Some(parameters(model).map(|[lambda]| {
            let xs = observations(data);
            array![xs.iter().sum::<f64>() / lambda - xs.len() as f64]
        }))
    }
    fn constraint(&self, _: &Dataset, model: &mut Model) -> Option<f64> {
        Some(clamp_parameter(model, 0, FLOOR, f64::INFINITY))
    }
    fn draw(&self, rng: &mut dyn RngCore, model: &Model) -> Option<Result<Vec<f64>, ModelError>> {
        Some(parameters(model).and_then(|[lambda]| {
            let poisson = PoissonDraw::new(lambda).map_err(|e| invalid(model, e.to_string()))?;
            let count: f64 = poisson.sample(rng);
            Ok(vec![count])
        }))
    }
    /// Evaluated at the first coordinate of the query point.
    fn cdf(&self, data: &Dataset, model: &Model) -> Option<Result<f64, ModelError>> {
        Some(parameters(model).and_then(|[lambda]| {
            let x = cdf_point(data, model)?;
            let poisson = PoissonCdf::new(lambda).map_err(|e| invalid(model, e.to_string()))?;
            Ok(if x < 0.0 {
                0.0
            } else if x >= u64::MAX as f64 {
                1.0
            } else {
                poisson.cdf(x.floor() as u64)
            })
        }))
    }
}

/// A fresh, unparameterized model of the family named `name`
/// (case-insensitive; the trailing " distribution" is optional).
pub fn by_name(name: &str) -> Option<Model> {
    let key = name.trim().to_ascii_lowercase();
    let key = key.strip_suffix(" distribution").unwrap_or(&key);
    let model = match key {
        "normal" | "gaussian" => Model::new(Normal),
        "gamma" => Model::new(Gamma),
        "exponential" => Model::new(Exponential),
        "beta" => Model::new(Beta),
        "bernoulli" => Model::new(Bernoulli),
        "binomial" => Model::new(Binomial),
        "poisson" => Model::new(Poisson),
        _ => return None,
    };
    Some(model)
}

/// Parses `name` or `name:p1,p2,...`. With parameters, the model comes back
/// prepared and filled; without, it is unparameterized.
pub fn from_descriptor(descriptor: &str) -> Result<Model, ModelError> {
    let (name, values) = match descriptor.split_once(':') {
        Some((name, values)) => (name, Some(values)),
        None => (descriptor, None),
    };
    let model = by_name(name)
        .ok_or_else(|| ModelError::InvalidArgument(format!("unknown model '{name}'")))?;
    let Some(values) = values else {
        return Ok(model);
    };
    let parsed = values
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|e| ModelError::InvalidArgument(format!("bad parameter list '{values}': {e}")))?;
    model.with_parameters(&parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn poisson_cdf_holds_for_large_rates_and_far_points() {
        let mut options = crate::config::Options::default();
        let mut large = Poisson.with(&[1000.0]).unwrap();
        let at_mean = large.cdf(&Dataset::from(ndarray::array![1000.0]), &mut options).unwrap();
        assert!(at_mean > 0.5 && at_mean < 0.52, "P(X <= 1000) = {at_mean}");

        let mut small = Poisson.with(&[2.0]).unwrap();
        let far = small.cdf(&Dataset::from(ndarray::array![2e9]), &mut options).unwrap();
        assert_abs_diff_eq!(far, 1.0, epsilon = 1e-12);
        let everywhere = small.cdf(&Dataset::from(ndarray::array![f64::INFINITY]), &mut options).unwrap();
        assert_eq!(everywhere, 1.0);
        let two = small.cdf(&Dataset::from(ndarray::array![2.5]), &mut options).unwrap();
        assert_abs_diff_eq!(two, (-2.0f64).exp() * (1.0 + 2.0 + 2.0), epsilon = 1e-10);
        assert_eq!(small.cdf(&Dataset::from(ndarray::array![-1.0]), &mut options).unwrap(), 0.0);
        assert!(matches!(
            small.cdf(&Dataset::from(ndarray::array![f64::NAN]), &mut options),
            Err(ModelError::InvalidParameters { .. })
        ));
        assert!(small.settings.get::<crate::model::CdfSettings>().is_none());
    }

    #[test]
    fn exponential_cdf_is_closed_form() {
        let mut options = crate::config::Options::default();
        let mut exponential = Exponential.with(&[0.5]).unwrap();
        let at_two = exponential.cdf(&Dataset::from(ndarray::array![2.0]), &mut options).unwrap();
        assert_abs_diff_eq!(at_two, 1.0 - (-1.0f64).exp(), epsilon = 1e-12);
        assert_eq!(exponential.cdf(&Dataset::from(ndarray::array![-3.0]), &mut options).unwrap(), 0.0);
        assert_eq!(exponential.cdf(&Dataset::from(ndarray::array![f64::INFINITY]), &mut options).unwrap(), 1.0);
    }

    #[test]
    fn closed_form_estimates() {
        let data = Dataset::from(ndarray::array![[1.0, 2.0], [3.0, 6.0]]);
        let normal = Model::new(Normal).estimate(&data).unwrap();
        assert_abs_diff_eq!(normal.parameter(0).unwrap(), 3.0);
        assert_abs_diff_eq!(normal.parameter(1).unwrap(), 3.5f64.sqrt(), epsilon = 1e-12);
        assert!(normal.log_likelihood.is_some());

        let exponential = Model::new(Exponential).estimate(&data).unwrap();
        assert_abs_diff_eq!(exponential.parameter(0).unwrap(), 4.0 / 12.0, epsilon = 1e-12);

        let poisson = Model::new(Poisson).estimate(&data).unwrap();
        assert_abs_diff_eq!(poisson.parameter(0).unwrap(), 3.0);

        let coins = Dataset::from(ndarray::array![1.0, 0.0, 1.0, 1.0]);
        let bernoulli = Model::new(Bernoulli).estimate(&coins).unwrap();
        assert_abs_diff_eq!(bernoulli.parameter(0).unwrap(), 0.75);
        let binomial = Model::new(Binomial).estimate(&coins).unwrap();
        assert_abs_diff_eq!(binomial.parameter(0).unwrap(), 4.0);
        assert_abs_diff_eq!(binomial.parameter(1).unwrap(), 0.75);
    }

    #[test]
    fn likelihoods_agree_with_hand_computation() {
        let data = Dataset::from(ndarray::array![0.5, 2.0]);
        let gamma = Gamma.with(&[2.0, 1.5]).unwrap();
        let by_hand: f64 = [0.5f64, 2.0]
            .iter()
            .map(|x| 2.0 * 1.5f64.ln() + x.ln() - 1.5 * x)
            .sum();
        assert_abs_diff_eq!(gamma.log_likelihood(&data).unwrap(), by_hand, epsilon = 1e-10);

        let beta = Beta.with(&[1.0, 1.0]).unwrap();
        assert_abs_diff_eq!(beta.p(&Dataset::from(ndarray::array![0.3])).unwrap(), 1.0, epsilon = 1e-10);
        assert_eq!(beta.p(&Dataset::from(ndarray::array![1.3])).unwrap(), 0.0);

        let poisson = Poisson.with(&[2.0]).unwrap();
        assert_abs_diff_eq!(
            poisson.p(&Dataset::from(ndarray::array![3.0])).unwrap(),
            (-2.0f64).exp() * 8.0 / 6.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn poisson_cdf_sums_the_mass() {
        let mut options = crate::config::Options::default();
        let mut poisson = Poisson.with(&[1.0]).unwrap();
        let cdf = poisson.cdf(&Dataset::from(ndarray::array![1.0]), &mut options).unwrap();
        assert_abs_diff_eq!(cdf, 2.0 * (-1.0f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn constraints_pull_parameters_back() {
        let data = Dataset::from(ndarray::array![1.0]);
        let mut gamma = Gamma.with(&[-1.0, 2.0]).unwrap();
        let penalty = gamma.constraint(&data);
        assert_abs_diff_eq!(penalty, 1.0 + FLOOR, epsilon = 1e-12);
        assert_abs_diff_eq!(gamma.parameter(0).unwrap(), FLOOR);
        let mut bernoulli = Bernoulli.with(&[0.5]).unwrap();
        assert_eq!(bernoulli.constraint(&data), 0.0);
    }

    #[test]
    fn family_samplers_respect_their_support() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut beta = Beta.with(&[2.0, 5.0]).unwrap();
        let mut binomial = Binomial.with(&[10.0, 0.3]).unwrap();
        let mut poisson = Poisson.with(&[4.0]).unwrap();
        for _ in 0..100 {
            let b = beta.draw(&mut rng).unwrap()[0];
            assert!((0.0..=1.0).contains(&b));
            let k = binomial.draw(&mut rng).unwrap()[0];
            assert!((0.0..=10.0).contains(&k) && k.fract() == 0.0);
            let c = poisson.draw(&mut rng).unwrap()[0];
            assert!(c >= 0.0 && c.fract() == 0.0);
        }
    }

    #[test]
    fn specs_parse_names_and_parameters() {
        let gamma = from_descriptor("Gamma:2, 0.5").unwrap();
        assert_eq!(gamma.name, GAMMA_NAME);
        assert_eq!(gamma.parameter(1).unwrap(), 0.5);
        assert!(!from_descriptor("exponential distribution").unwrap().prepared);
        assert!(from_descriptor("zipf").is_err());
        assert!(from_descriptor("normal:1,x").is_err());
    }
}
