//! Maximum likelihood by BFGS over the packed parameters, and the
//! central-difference gradient it shares with the score fallback.

use super::lifecycle::Model;
use super::settings::MleSettings;
use super::ModelError;
use crate::data::{Dataset, INFO_PAGE};
use ndarray::Array1;
use wolfe_bfgs::{Bfgs, BfgsSolution};

/// Cost handed to the optimizer in place of a non-finite one.
const WALL: f64 = 1e10;

/// Central differences of `f` at `x` with step `delta`. Non-finite partials
/// come back as zero.
pub(crate) fn central_difference(f: impl Fn(&Array1<f64>) -> f64, x: &Array1<f64>, delta: f64) -> Array1<f64> {
    let mut probe = x.clone();
    Array1::from_iter((0..x.len()).map(|i| {
        probe[i] = x[i] + delta;
        let up = f(&probe);
        probe[i] = x[i] - delta;
        let down = f(&probe);
        probe[i] = x[i];
        let slope = (up - down) / (2.0 * delta);
        if slope.is_finite() { slope } else { 0.0 }
    }))
}

fn with_packed(model: &Model, packed: &Array1<f64>) -> Result<Model, ModelError> {
    let mut trial = model.clone();
    trial.parameters_mut()?.fill(&packed.to_vec())?;
    Ok(trial)
}

/// Numeric gradient of the log likelihood with respect to the packed parameters.
pub fn numeric_gradient(data: &Dataset, model: &Model, delta: f64) -> Result<Array1<f64>, ModelError> {
    let start = model.parameters()?.pack();
    // Surface a missing likelihood as an error rather than a zero gradient.
    model.log_likelihood(data)?;
    let ll = |packed: &Array1<f64>| {
        with_packed(model, packed)
            .and_then(|trial| trial.log_likelihood(data))
            .unwrap_or(f64::NAN)
    };
    Ok(central_difference(ll, &start, delta))
}

/// Negative log likelihood plus the family's constraint penalty.
fn penalized_cost(data: &Dataset, model: &Model, packed: &Array1<f64>) -> f64 {
    let Ok(mut trial) = with_packed(model, packed) else {
        return f64::INFINITY;
    };
    let penalty = trial.constraint(data);
    match trial.log_likelihood(data) {
        Ok(ll) if ll.is_finite() => penalty - ll,
        _ => f64::INFINITY,
    }
}

/// Fits `model`, already prepared against `data`, by minimizing the
/// penalized negative log likelihood. Records the result in the model's
/// log-likelihood cache and on an `"Info"` page of its parameters.
pub fn maximum_likelihood(data: &Dataset, model: &mut Model) -> Result<(), ModelError> {
    let settings = model.settings.get::<MleSettings>().cloned().unwrap_or_default();
    let size = model.parameters()?.pack().len();
    let start = match &settings.starting_point {
        Some(point) if point.len() == size => Array1::from_vec(point.clone()),
        Some(point) => {
            return Err(ModelError::InvalidArgument(format!(
                "starting point has {} values but the {} model has {size} parameters",
                point.len(),
                model.name
            )));
        }
        None => Array1::ones(size),
    };

    let (final_point, iterations) = if size == 0 {
        (start, 0)
    } else {
        let template = model.clone();
        let initial_cost = penalized_cost(data, &template, &start);
        if !initial_cost.is_finite() {
            return Err(ModelError::Optimization(format!(
                "the {} model's likelihood is not finite at the starting point {:?}",
                model.name,
                start.to_vec()
            )));
        }
        log::debug!("Initial penalized cost for {}: {initial_cost:.6}", model.name);

        let cost_and_grad = |x: &Array1<f64>| -> (f64, Array1<f64>) {
            let cost = penalized_cost(data, &template, x);
            let cost = if cost.is_finite() { cost } else { WALL };
            let grad = central_difference(|p| penalized_cost(data, &template, p), x, settings.delta);
            (cost, grad)
        };
        let BfgsSolution {
            final_point,
            final_value,
            iterations,
            ..
        } = Bfgs::new(start, cost_and_grad)
            .with_tolerance(settings.tolerance)
            .with_max_iterations(settings.max_iterations)
            .run()
            .map_err(|e| ModelError::Optimization(format!("BFGS failed for the {} model: {e:?}", model.name)))?;
        log::info!(
            "{}: BFGS finished in {iterations} iterations with cost {final_value:.6}",
            model.name
        );
        (final_point, iterations)
    };

    model.parameters_mut()?.fill(&final_point.to_vec())?;
    model.constraint(data);
    let ll = model.log_likelihood(data)?;
    model.log_likelihood = Some(ll);

    let parameters = model.parameters_mut()?;
    parameters.remove_page(INFO_PAGE);
    let mut info = Dataset::blank();
    info.add_named_element("log likelihood", ll)?;
    info.add_named_element("iterations", iterations as f64)?;
    parameters.add_page(info, INFO_PAGE);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;
    use crate::model::families::{Gamma, Normal};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn central_difference_of_a_quadratic() {
        let x = array![1.0, -2.0];
        let grad = central_difference(|p| p[0] * p[0] + 3.0 * p[1], &x, 1e-4);
        assert_abs_diff_eq!(grad, array![2.0, 3.0], epsilon = 1e-6);
    }

    #[test]
    fn generic_mle_recovers_gamma_parameters() {
        let data = Dataset::from(array![[1.2], [0.7], [2.3], [1.9], [0.4], [1.1], [3.0], [1.6]]);
        let fitted = maximum_likelihood_of(&data);
        let shape = fitted.parameter(0).unwrap();
        let rate = fitted.parameter(1).unwrap();
        // At the optimum the rate equals shape / mean.
        let mean = data.values().sum::<f64>() / 8.0;
        assert_abs_diff_eq!(rate, shape / mean, epsilon = 1e-2);
        assert!(shape > 0.0 && rate > 0.0);

        let info = fitted.parameters().unwrap().get_page(INFO_PAGE).unwrap();
        let recorded = info.get_cell(Cell::RowNamed("log likelihood", 0)).unwrap();
        assert_abs_diff_eq!(recorded, fitted.log_likelihood.unwrap(), epsilon = 1e-12);
    }

    fn maximum_likelihood_of(data: &Dataset) -> Model {
        let mut model = Model::new(Gamma);
        model.prepare(data).unwrap();
        maximum_likelihood(data, &mut model).unwrap();
        model
    }

    #[test]
    fn starting_point_must_match_the_parameter_count() {
        let data = Dataset::from(array![[1.0], [2.0]]);
        let mut model = Model::new(Normal);
        model.prepare(&data).unwrap();
        model.settings.insert(MleSettings {
            starting_point: Some(vec![1.0]),
            ..MleSettings::default()
        });
        assert!(matches!(
            maximum_likelihood(&data, &mut model),
            Err(ModelError::InvalidArgument(_))
        ));
    }
}
