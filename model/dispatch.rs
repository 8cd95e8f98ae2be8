//! Calls into a model's family, with the generic fallback for every behavior
//! the family leaves out.

use super::lifecycle::Model;
use super::settings::{CdfSettings, MleSettings};
use super::{ModelError, arms, impute, mle};
use crate::config::Options;
use crate::data::{DataError, Dataset};
use ndarray::{Array1, s};
use rand::RngCore;
use std::sync::Arc;

impl Model {
    /// Fits a copy of this model to `data`, preparing it first if needed.
    /// Families without their own estimator go through maximum likelihood.
    pub fn estimate(&self, data: &Dataset) -> Result<Model, ModelError> {
        let mut out = self.clone();
        out.prepare(data)?;
        let family = Arc::clone(&out.family);
        match family.estimate(data, &mut out) {
            Some(result) => result?,
            None => {
                log::debug!("{} has no closed-form estimator; maximizing the likelihood.", out.name);
                mle::maximum_likelihood(data, &mut out)?
            }
        }
        Ok(out)
    }

    pub fn p(&self, data: &Dataset) -> Result<f64, ModelError> {
        if let Some(p) = self.family.p(data, self) {
            return p;
        }
        match self.family.log_likelihood(data, self) {
            Some(ll) => ll.map(f64::exp),
            None => Err(ModelError::NoLikelihoodDefined(self.name.clone())),
        }
    }

    pub fn log_likelihood(&self, data: &Dataset) -> Result<f64, ModelError> {
        if let Some(ll) = self.family.log_likelihood(data, self) {
            return ll;
        }
        match self.family.p(data, self) {
            Some(p) => p.map(f64::ln),
            None => Err(ModelError::NoLikelihoodDefined(self.name.clone())),
        }
    }

    /// Gradient of the log likelihood at the current parameters, in pack order.
    pub fn score(&self, data: &Dataset) -> Result<Array1<f64>, ModelError> {
        if let Some(score) = self.family.score(data, self) {
            return score;
        }
        let delta = self
            .settings
            .get::<MleSettings>()
            .map_or_else(|| MleSettings::default().delta, |mle| mle.delta);
        mle::numeric_gradient(data, self, delta)
    }

    /// [`Model::score`] written into an already-shaped page.
    pub fn score_into(&self, data: &Dataset, out: &mut Dataset) -> Result<(), ModelError> {
        let gradient = self.score(data)?;
        out.fill(&gradient.to_vec())?;
        Ok(())
    }

    /// Applies the family's constraint, returning its penalty. Unconstrained
    /// families always return zero.
    pub fn constraint(&mut self, data: &Dataset) -> f64 {
        let family = Arc::clone(&self.family);
        family.constraint(data, self).unwrap_or(0.0)
    }

    /// One draw from the model. Without a family sampler this runs adaptive
    /// rejection sampling on the model's density, which must be univariate.
    pub fn draw(&mut self, rng: &mut dyn RngCore) -> Result<Vec<f64>, ModelError> {
        if let Some(draw) = self.family.draw(rng, self) {
            return draw;
        }
        arms::draw(rng, self)
    }

    /// Probability that a draw is component-wise at or below the point in
    /// `data`. Without a family CDF this counts draws, using a generator and
    /// draw count cached on the model and seeded from `options`.
    pub fn cdf(&mut self, data: &Dataset, options: &mut Options) -> Result<f64, ModelError> {
        if let Some(cdf) = self.family.cdf(data, self) {
            return cdf;
        }
        let query = query_point(data)?;
        let (draws, mut rng) = {
            let group = self
                .settings
                .get_or_insert_with(|| CdfSettings::new(options.cdf_draws, options.next_seed()))?;
            (group.draws, group.rng.clone())
        };
        if draws == 0 {
            return Err(ModelError::InvalidArgument("the CDF needs at least one draw".to_string()));
        }
        let mut below = 0usize;
        for _ in 0..draws {
            let draw = self.draw(&mut rng)?;
            if draw.len() != query.len() {
                return Err(DataError::mismatch("CDF query point", draw.len(), query.len()).into());
            }
            if draw.iter().zip(&query).all(|(d, q)| d <= q) {
                below += 1;
            }
        }
        if let Some(group) = self.settings.get_mut::<CdfSettings>() {
            group.rng = rng;
        }
        Ok(below as f64 / draws as f64)
    }

    /// Fills in `data`'s missing values. Without a family predictor, data with
    /// nothing missing has its first column (the vector, else matrix column 0)
    /// blanked out, and then every missing cell is imputed under the model.
    pub fn predict(&self, data: &Dataset) -> Result<Dataset, ModelError> {
        if let Some(predicted) = self.family.predict(data, self) {
            return predicted;
        }
        let mut filled = data.copy_page();
        if !filled.has_missing() {
            if let Some(vector) = filled.vector.as_mut() {
                vector.fill(f64::NAN);
            } else if let Some(matrix) = filled.matrix.as_mut() {
                if matrix.ncols() > 0 {
                    matrix.slice_mut(s![.., 0]).fill(f64::NAN);
                }
            }
        }
        impute::impute(&mut filled, self)?;
        Ok(filled)
    }
}

/// The point a CDF is evaluated at: row 0 of the matrix, or the vector when
/// there is no matrix.
pub(crate) fn query_point(data: &Dataset) -> Result<Vec<f64>, ModelError> {
    let point = match (data.matrix.as_ref(), data.vector.as_ref()) {
        (Some(matrix), _) if matrix.nrows() > 0 => matrix.row(0).to_vec(),
        (Some(_), _) => Vec::new(),
        (None, Some(vector)) => vector.to_vec(),
        (None, None) => Vec::new(),
    };
    if point.is_empty() {
        return Err(ModelError::InvalidArgument("the CDF needs a point to evaluate at".to_string()));
    }
    Ok(point)
}
