//! Empirical distribution over equal-width bins, the output model of the
//! Metropolis-Hastings walk.
//!
//! Parameters hold one row per occupied cell: the cell's midpoint in the
//! matrix and its probability mass in the vector. The bin layout itself
//! lives in the model's [`HistogramSettings`] group.

use super::family::ModelFamily;
use super::lifecycle::{Base, Model, Shape};
use super::settings::Group;
use super::ModelError;
use crate::data::{Axis, Dataset};
use ndarray::{Array1, Array2, ArrayView1, Axis as NdAxis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, RngCore};
use std::collections::BTreeMap;

pub const HISTOGRAM_NAME: &str = "Histogram";

/// Bin layout: per-dimension origin and width, and the bin count per dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSettings {
    pub bins: usize,
    pub lower: Vec<f64>,
    pub width: Vec<f64>,
}

impl Group for HistogramSettings {
    const NAME: &'static str = "histogram";
}

impl HistogramSettings {
    fn cell_of(&self, point: ArrayView1<f64>) -> Option<Vec<usize>> {
        if point.len() != self.lower.len() {
            return None;
        }
        point
            .iter()
            .zip(self.lower.iter().zip(&self.width))
            .map(|(&x, (&lower, &width))| {
                let offset = (x - lower) / width;
                // The top edge belongs to the last bin, with room for rounding.
                if !(offset >= 0.0) || offset > self.bins as f64 * (1.0 + 1e-9) {
                    return None;
                }
                Some((offset.floor() as usize).min(self.bins - 1))
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct Histogram;

/// Bins the rows of `samples` into `bins` equal-width bins per column.
pub fn from_samples(samples: &Array2<f64>, bins: usize) -> Result<Model, ModelError> {
    if bins == 0 {
        return Err(ModelError::InvalidArgument("a histogram needs at least one bin".to_string()));
    }
    if samples.nrows() == 0 || samples.ncols() == 0 {
        return Err(ModelError::InvalidArgument("a histogram needs at least one sample".to_string()));
    }
    let mut lower = Vec::with_capacity(samples.ncols());
    let mut width = Vec::with_capacity(samples.ncols());
    for column in samples.axis_iter(NdAxis(1)) {
        let min = column.iter().copied().fold(f64::INFINITY, f64::min);
        let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() || !max.is_finite() {
            return Err(ModelError::InvalidArgument("histogram samples must be finite".to_string()));
        }
        // A constant column still gets a unit-wide bin around its value.
        if max > min {
            lower.push(min);
            width.push((max - min) / bins as f64);
        } else {
            lower.push(min - 0.5);
            width.push(1.0 / bins as f64);
        }
    }
    let layout = HistogramSettings { bins, lower, width };

    let mut counts: BTreeMap<Vec<usize>, usize> = BTreeMap::new();
    for row in samples.rows() {
        if let Some(cell) = layout.cell_of(row) {
            *counts.entry(cell).or_default() += 1;
        }
    }
    let total = samples.nrows() as f64;
    let dims = samples.ncols();
    let mut midpoints = Array2::zeros((counts.len(), dims));
    let mut mass = Array1::zeros(counts.len());
    for (i, (cell, count)) in counts.iter().enumerate() {
        for (j, &bin) in cell.iter().enumerate() {
            midpoints[[i, j]] = layout.lower[j] + (bin as f64 + 0.5) * layout.width[j];
        }
        mass[i] = *count as f64 / total;
    }

    let mut parameters = Dataset::blank();
    parameters.names.title = format!("{HISTOGRAM_NAME} parameters");
    parameters.names.vector = Some("mass".to_string());
    for j in 0..dims {
        parameters.names.add(&format!("dimension {j}"), Axis::Columns);
    }
    parameters.vector = Some(mass);
    parameters.matrix = Some(midpoints);

    let mut model = Model::new(Histogram);
    model.parameters = Some(parameters);
    model.data_dims = Some((0, samples.nrows(), dims));
    model.prepared = true;
    model.settings.insert(layout);
    Ok(model)
}

fn layout(model: &Model) -> Result<&HistogramSettings, ModelError> {
    model.settings.get::<HistogramSettings>().ok_or_else(|| ModelError::InvalidParameters {
        model: model.name.clone(),
        reason: "the histogram has no bin layout".to_string(),
    })
}

impl Histogram {
    fn mass_at(model: &Model, point: ArrayView1<f64>) -> Result<f64, ModelError> {
        let layout = layout(model)?;
        let parameters = model.parameters()?;
        let (mass, midpoints) = (parameters.vector_or_err()?, parameters.matrix_or_err()?);
        let Some(cell) = layout.cell_of(point) else {
            return Ok(0.0);
        };
        let found = midpoints.rows().into_iter().position(|midpoint| {
            layout.cell_of(midpoint).as_deref() == Some(cell.as_slice())
        });
        Ok(found.map_or(0.0, |i| mass[i]))
    }

    /// Picks a cell by mass, then a point uniformly within it.
    fn draw_point(rng: &mut dyn RngCore, model: &Model) -> Result<Vec<f64>, ModelError> {
        let layout = layout(model)?;
        let parameters = model.parameters()?;
        let (mass, midpoints) = (parameters.vector_or_err()?, parameters.matrix_or_err()?);
        let cells = WeightedIndex::new(mass.iter()).map_err(|e| ModelError::InvalidParameters {
            model: model.name.clone(),
            reason: format!("bin masses are unusable: {e}"),
        })?;
        let cell = cells.sample(rng);
        Ok(midpoints
            .row(cell)
            .iter()
            .zip(&layout.width)
            .map(|(&mid, &width)| mid + (rng.r#gen::<f64>() - 0.5) * width)
            .collect())
    }
}

impl ModelFamily for Histogram {
    fn name(&self) -> &str {
        HISTOGRAM_NAME
    }

    fn shape(&self) -> Shape {
        Shape {
            vector: Base::FromData,
            rows: Base::FromData,
            cols: Base::FromData,
        }
    }

    /// Parameters come from the binned samples, never from a blank allocation.
    fn prepare(&self, _: &Dataset, model: &mut Model) -> Option<Result<(), ModelError>> {
        Some(model.parameters().map(|_| ()))
    }

    /// Re-bins `data`'s matrix rows, keeping the bin count.
    fn estimate(&self, data: &Dataset, model: &mut Model) -> Option<Result<(), ModelError>> {
        let bins = match layout(model) {
            Ok(layout) => layout.bins,
            Err(e) => return Some(Err(e)),
        };
        let rebinned = data
            .matrix_or_err()
            .map_err(ModelError::from)
            .and_then(|samples| from_samples(samples, bins));
        Some(rebinned.map(|fresh| *model = fresh))
    }

    /// Product over the rows of `data` of the mass of the cell each row falls in.
    fn p(&self, data: &Dataset, model: &Model) -> Option<Result<f64, ModelError>> {
        let points = match (&data.matrix, &data.vector) {
            (Some(matrix), _) => matrix.clone(),
            (None, Some(vector)) => vector.clone().insert_axis(NdAxis(1)),
            (None, None) => return Some(Err(ModelError::from(crate::data::DataError::NullTarget("matrix")))),
        };
        let mut p = 1.0;
        for row in points.rows() {
            match Histogram::mass_at(model, row) {
                Ok(mass) => p *= mass,
                Err(e) => return Some(Err(e)),
            }
        }
        Some(Ok(p))
    }

    fn draw(&self, rng: &mut dyn RngCore, model: &Model) -> Option<Result<Vec<f64>, ModelError>> {
        Some(Histogram::draw_point(rng, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn masses_sum_to_one_and_midpoints_sit_in_their_bins() {
        let samples = array![[0.0], [0.1], [0.9], [1.0], [0.45]];
        let model = from_samples(&samples, 2).unwrap();
        let parameters = model.parameters().unwrap();
        assert_eq!(parameters.vector, Some(array![0.6, 0.4]));
        assert_eq!(parameters.matrix, Some(array![[0.25], [0.75]]));
    }

    #[test]
    fn probability_is_the_mass_of_the_cell() {
        let samples = array![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 1.0]];
        let model = from_samples(&samples, 2).unwrap();
        assert_abs_diff_eq!(model.p(&Dataset::from(array![[0.9, 0.9]])).unwrap(), 0.5);
        assert_abs_diff_eq!(model.p(&Dataset::from(array![[0.1, 0.1]])).unwrap(), 0.25);
        assert_abs_diff_eq!(model.p(&Dataset::from(array![[0.9, 0.1]])).unwrap(), 0.0);
        assert_abs_diff_eq!(model.p(&Dataset::from(array![[5.0, 0.1]])).unwrap(), 0.0);
    }

    #[test]
    fn draws_land_in_occupied_cells() {
        let samples = array![[0.0], [0.2], [3.8], [4.0]];
        let mut model = from_samples(&samples, 4).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let x = model.draw(&mut rng).unwrap()[0];
            assert!((0.0..=1.0).contains(&x) || (3.0..=4.0).contains(&x), "{x}");
        }
    }

    #[test]
    fn estimate_rebins_new_data() {
        let model = from_samples(&array![[0.0], [1.0]], 3).unwrap();
        let refit = model.estimate(&Dataset::from(array![[5.0], [5.0], [7.0]])).unwrap();
        let layout = refit.settings.get::<HistogramSettings>().unwrap();
        assert_eq!(layout.bins, 3);
        assert_eq!(layout.lower, vec![5.0]);
        assert_abs_diff_eq!(refit.parameters().unwrap().vector.as_ref().unwrap().sum(), 1.0);
    }

    #[test]
    fn constant_columns_still_bin() {
        let model = from_samples(&array![[2.0], [2.0]], 5).unwrap();
        assert_eq!(model.parameters().unwrap().vector, Some(array![1.0]));
    }
}
