use super::family::ModelFamily;
use super::settings::Settings;
use super::ModelError;
use crate::data::Dataset;
use std::fmt;
use std::sync::Arc;

/// One declared parameter dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    Fixed(usize),
    /// Take the calibrating data's matrix column count.
    FromData,
}

impl Base {
    fn resolve(self, data_columns: usize) -> usize {
        match self {
            Base::Fixed(n) => n,
            Base::FromData => data_columns,
        }
    }
}

/// Declared shape of a model's parameters: vector length and matrix size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub vector: Base,
    pub rows: Base,
    pub cols: Base,
}

impl Shape {
    pub const fn vector(len: usize) -> Self {
        Self {
            vector: Base::Fixed(len),
            rows: Base::Fixed(0),
            cols: Base::Fixed(0),
        }
    }

    pub fn is_fixed(&self) -> bool {
        [self.vector, self.rows, self.cols]
            .iter()
            .all(|base| matches!(base, Base::Fixed(_)))
    }

    /// Concrete `(vector, rows, cols)` for data with `data_columns` matrix columns.
    pub fn resolve(&self, data_columns: usize) -> (usize, usize, usize) {
        (
            self.vector.resolve(data_columns),
            self.rows.resolve(data_columns),
            self.cols.resolve(data_columns),
        )
    }
}

/// A parametric model: metadata, parameters and settings, with its
/// behaviors supplied by a shared [`ModelFamily`].
///
/// Cloning deep-copies parameters, auxiliary pages and settings, while the
/// family stays shared.
#[derive(Clone)]
pub struct Model {
    pub name: String,
    pub shape: Shape,
    pub parameters: Option<Dataset>,
    pub expected: Option<Dataset>,
    pub covariance: Option<Dataset>,
    /// Log likelihood at the current parameters, once an estimator has computed it.
    pub log_likelihood: Option<f64>,
    pub prepared: bool,
    /// `(vector length, matrix rows, matrix columns)` of the calibrating data.
    pub data_dims: Option<(usize, usize, usize)>,
    pub settings: Settings,
    pub(crate) family: Arc<dyn ModelFamily>,
}

impl Model {
    /// An unprepared model of `family`, named and shaped as the family declares.
    pub fn new(family: impl ModelFamily + 'static) -> Self {
        let family: Arc<dyn ModelFamily> = Arc::new(family);
        Self {
            name: family.name().to_string(),
            shape: family.shape(),
            parameters: None,
            expected: None,
            covariance: None,
            log_likelihood: None,
            prepared: false,
            data_dims: None,
            settings: Settings::new(),
            family,
        }
    }

    pub fn family(&self) -> &dyn ModelFamily {
        self.family.as_ref()
    }

    /// A prepared copy of this fixed-shape model holding `values` as its
    /// packed parameters.
    pub fn with_parameters(&self, values: &[f64]) -> Result<Model, ModelError> {
        if !self.shape.is_fixed() {
            return Err(ModelError::InvalidArgument(format!(
                "The {} model's parameter shape depends on the data, so it can't be set from a list of values.",
                self.name
            )));
        }
        let mut out = self.clone();
        out.prepared = false;
        out.prepare(&Dataset::blank())?;
        out.parameters_mut()?.fill(values)?;
        Ok(out)
    }

    /// Prepares the model against `data` unless it already is: runs the
    /// family's own preparation when it has one, the default [`Model::clear`]
    /// otherwise.
    pub fn prepare(&mut self, data: &Dataset) -> Result<(), ModelError> {
        if self.prepared {
            return Ok(());
        }
        let family = Arc::clone(&self.family);
        match family.prepare(data, self) {
            Some(result) => result?,
            None => self.clear(data)?,
        }
        self.prepared = true;
        Ok(())
    }

    /// The default preparation: allocates zeroed parameters in the declared
    /// shape and records the calibrating data's dimensions.
    pub fn clear(&mut self, data: &Dataset) -> Result<(), ModelError> {
        let columns = data.matrix.as_ref().map_or(0, |m| m.ncols());
        let (vector_len, rows, cols) = self.shape.resolve(columns);
        let mut parameters = Dataset::alloc(vector_len, rows, cols)?;
        parameters.names.title = format!("{} parameters", self.name);
        self.parameters = Some(parameters);
        self.data_dims = Some((
            data.vector.as_ref().map_or(0, |v| v.len()),
            data.matrix.as_ref().map_or(0, |m| m.nrows()),
            columns,
        ));
        self.prepared = true;
        Ok(())
    }

    pub fn parameters(&self) -> Result<&Dataset, ModelError> {
        self.parameters.as_ref().ok_or_else(|| self.unparameterized())
    }

    pub fn parameters_mut(&mut self) -> Result<&mut Dataset, ModelError> {
        match self.parameters.as_mut() {
            Some(parameters) => Ok(parameters),
            None => Err(ModelError::InvalidParameters {
                model: self.name.clone(),
                reason: "the model has not been given parameters".to_string(),
            }),
        }
    }

    /// Parameter `index` of the parameter vector.
    pub fn parameter(&self, index: usize) -> Result<f64, ModelError> {
        Ok(self.parameters()?.get(index, -1)?)
    }

    fn unparameterized(&self) -> ModelError {
        ModelError::InvalidParameters {
            model: self.name.clone(),
            reason: "the model has not been given parameters".to_string(),
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("parameters", &self.parameters)
            .field("log_likelihood", &self.log_likelihood)
            .field("prepared", &self.prepared)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        match &self.parameters {
            Some(parameters) => write!(f, "{parameters}"),
            None => writeln!(f, "(no parameters)"),
        }
    }
}
