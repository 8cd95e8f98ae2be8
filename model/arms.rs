//! Adaptive rejection sampling for univariate densities.
//!
//! The envelope is piecewise constant over `[lower, upper]`. It starts at the
//! largest density seen on each segment's edges and midpoint, and is raised
//! whenever a proposal lands above it, so the sampler learns the shape of
//! the density as it runs. The envelope is kept in the model's
//! [`ArmsSettings`] between draws.

use super::lifecycle::Model;
use super::settings::ArmsSettings;
use super::ModelError;
use crate::data::Dataset;
use ndarray::array;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, RngCore};

const MAX_ATTEMPTS: usize = 100_000;
/// Head room added when an envelope segment is set or raised.
const SLACK: f64 = 1.2;

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub lower: f64,
    pub width: f64,
    pub heights: Vec<f64>,
}

impl Envelope {
    fn build(model: &Model, settings: &ArmsSettings) -> Result<Self, ModelError> {
        if !(settings.upper > settings.lower) || settings.segments == 0 {
            return Err(ModelError::InvalidArgument(format!(
                "rejection sampling needs lower < upper and at least one segment, got [{}, {}] with {} segments",
                settings.lower, settings.upper, settings.segments
            )));
        }
        let width = (settings.upper - settings.lower) / settings.segments as f64;
        let heights = (0..settings.segments)
            .map(|k| {
                let left = settings.lower + k as f64 * width;
                let probes = [left, left + 0.5 * width, left + width];
                let mut height = 0.0f64;
                for x in probes {
                    height = height.max(density(model, x)?);
                }
                Ok(height * SLACK)
            })
            .collect::<Result<Vec<f64>, ModelError>>()?;
        if heights.iter().all(|&h| h <= 0.0) {
            return Err(ModelError::InvalidParameters {
                model: model.name.clone(),
                reason: format!(
                    "the density is zero everywhere on [{}, {}]",
                    settings.lower, settings.upper
                ),
            });
        }
        Ok(Self {
            lower: settings.lower,
            width,
            heights,
        })
    }
}

fn density(model: &Model, x: f64) -> Result<f64, ModelError> {
    let p = model.p(&Dataset::from(array![[x]]))?;
    if p.is_nan() || p < 0.0 {
        return Err(ModelError::InvalidParameters {
            model: model.name.clone(),
            reason: format!("the density at {x} is {p}; rejection sampling needs a nonnegative density"),
        });
    }
    Ok(p)
}

/// One draw from `model`'s univariate density.
pub fn draw(rng: &mut dyn RngCore, model: &mut Model) -> Result<Vec<f64>, ModelError> {
    let mut settings = model.settings.get::<ArmsSettings>().cloned().unwrap_or_default();
    let mut envelope = match settings.envelope.take() {
        Some(envelope) => envelope,
        None => Envelope::build(model, &settings)?,
    };

    let weights = |envelope: &Envelope| {
        WeightedIndex::new(&envelope.heights)
            .map_err(|e| ModelError::Optimization(format!("envelope weights are unusable: {e}")))
    };
    let mut segments = weights(&envelope)?;
    let mut accepted = None;
    for _ in 0..MAX_ATTEMPTS {
        let k = segments.sample(rng);
        let x = envelope.lower + (k as f64 + rng.r#gen::<f64>()) * envelope.width;
        let p = density(model, x)?;
        if p > envelope.heights[k] {
            log::debug!("Raising envelope segment {k} from {} to {}", envelope.heights[k], p * SLACK);
            envelope.heights[k] = p * SLACK;
            segments = weights(&envelope)?;
            continue;
        }
        if rng.r#gen::<f64>() * envelope.heights[k] < p {
            accepted = Some(x);
            break;
        }
    }

    settings.envelope = Some(envelope);
    model.settings.insert(settings);
    match accepted {
        Some(x) => Ok(vec![x]),
        None => Err(ModelError::SamplerExhausted {
            model: model.name.clone(),
            attempts: MAX_ATTEMPTS,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::families::Normal;
    use crate::model::{ModelFamily, Shape};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[derive(Debug)]
    struct Triangle;

    impl ModelFamily for Triangle {
        fn name(&self) -> &str {
            "triangle"
        }
        fn shape(&self) -> Shape {
            Shape::vector(0)
        }
        fn p(&self, data: &Dataset, _: &Model) -> Option<Result<f64, ModelError>> {
            Some(Ok(data.values().map(|x| (1.0 - x.abs()).max(0.0)).product()))
        }
    }

    #[test]
    fn samples_stay_on_the_support_and_match_the_mean() {
        let mut model = Triangle.with(&[]).unwrap();
        model.settings.insert(ArmsSettings {
            lower: -1.0,
            upper: 1.0,
            segments: 16,
            envelope: None,
        });
        let mut rng = StdRng::seed_from_u64(3);
        let draws: Vec<f64> = (0..4000).map(|_| draw(&mut rng, &mut model).unwrap()[0]).collect();
        assert!(draws.iter().all(|x| x.abs() <= 1.0));
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        assert!(mean.abs() < 0.03, "mean {mean}");
        let inner = draws.iter().filter(|x| x.abs() < 0.5).count() as f64 / draws.len() as f64;
        assert!((inner - 0.75).abs() < 0.03, "inner mass {inner}");
    }

    #[test]
    fn envelope_is_cached_between_draws() {
        let mut model = Normal.with(&[0.0, 1.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        draw(&mut rng, &mut model).unwrap();
        let envelope = model.settings.get::<ArmsSettings>().and_then(|a| a.envelope.clone());
        assert_eq!(envelope.map(|e| e.heights.len()), Some(400));
    }

    #[test]
    fn zero_density_is_reported() {
        let mut model = Triangle.with(&[]).unwrap();
        model.settings.insert(ArmsSettings {
            lower: 5.0,
            upper: 6.0,
            ..ArmsSettings::default()
        });
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            draw(&mut rng, &mut model),
            Err(ModelError::InvalidParameters { .. })
        ));
    }
}
