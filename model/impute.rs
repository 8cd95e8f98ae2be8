//! Maximum-likelihood imputation: the missing (NaN) cells of a page are
//! chosen to maximize the model's log likelihood of the completed page.

use super::lifecycle::Model;
use super::mle::central_difference;
use super::settings::MleSettings;
use super::ModelError;
use crate::data::Dataset;
use ndarray::Array1;
use wolfe_bfgs::{Bfgs, BfgsSolution};

fn completed(data: &Dataset, missing: &[usize], guesses: &Array1<f64>) -> Result<Dataset, ModelError> {
    let mut values: Vec<f64> = data.values().collect();
    for (&slot, &guess) in missing.iter().zip(guesses) {
        values[slot] = guess;
    }
    let mut filled = data.copy_page();
    filled.fill(&values)?;
    Ok(filled)
}

/// Replaces every NaN in `data`'s vector and matrix with its
/// maximum-likelihood value under `model`. Searches start from the mean of
/// the observed cells.
pub fn impute(data: &mut Dataset, model: &Model) -> Result<(), ModelError> {
    let values: Vec<f64> = data.values().collect();
    let missing: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_nan()).collect();
    if missing.is_empty() {
        return Ok(());
    }
    let observed: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let centre = if observed.is_empty() {
        0.0
    } else {
        observed.iter().sum::<f64>() / observed.len() as f64
    };
    let settings = model.settings.get::<MleSettings>().cloned().unwrap_or_default();
    log::debug!("Imputing {} missing cells under the {} model", missing.len(), model.name);

    let snapshot = data.copy_page();
    let cost = |guesses: &Array1<f64>| -> f64 {
        completed(&snapshot, &missing, guesses)
            .and_then(|filled| model.log_likelihood(&filled))
            .map_or(f64::INFINITY, |ll| if ll.is_finite() { -ll } else { f64::INFINITY })
    };
    let start = Array1::from_elem(missing.len(), centre);
    if !cost(&start).is_finite() {
        return Err(ModelError::Optimization(format!(
            "the {} model gives no finite likelihood with the missing cells at {centre}",
            model.name
        )));
    }
    let cost_and_grad = |x: &Array1<f64>| -> (f64, Array1<f64>) {
        let value = cost(x);
        let value = if value.is_finite() { value } else { 1e10 };
        (value, central_difference(cost, x, settings.delta))
    };
    let BfgsSolution {
        final_point,
        iterations,
        ..
    } = Bfgs::new(start, cost_and_grad)
        .with_tolerance(settings.tolerance)
        .with_max_iterations(settings.max_iterations)
        .run()
        .map_err(|e| ModelError::Optimization(format!("imputation failed: {e:?}")))?;
    log::debug!("Imputation converged in {iterations} iterations");

    let filled = completed(&snapshot, &missing, &final_point)?;
    filled.copy_into(data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelFamily;
    use crate::model::families::Normal;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn missing_cells_move_to_the_mode() {
        let model = Normal.with(&[2.0, 0.5]).unwrap();
        let mut data = Dataset::from(array![[1.0, f64::NAN], [f64::NAN, 4.0]]);
        impute(&mut data, &model).unwrap();
        assert!(!data.has_missing());
        assert_abs_diff_eq!(data.get(0, 1).unwrap(), 2.0, epsilon = 1e-3);
        assert_abs_diff_eq!(data.get(1, 0).unwrap(), 2.0, epsilon = 1e-3);
        assert_eq!(data.get(1, 1).unwrap(), 4.0);
    }

    #[test]
    fn complete_data_is_left_alone() {
        let model = Normal.with(&[0.0, 1.0]).unwrap();
        let mut data = Dataset::from(array![1.0, 2.0]);
        impute(&mut data, &model).unwrap();
        assert_eq!(data.vector, Some(array![1.0, 2.0]));
    }
}
