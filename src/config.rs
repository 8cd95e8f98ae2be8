//! Run-wide options, read from TOML.

use crate::model::MleSettings;
use crate::update::UpdateSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read options file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse options: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Invalid option: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// 0 prints errors only, 1 adds warnings, 2 adds progress, 3 and up debugging.
    pub verbosity: u8,
    /// Base seed; each generator created lazily takes the next one.
    pub rng_seed: u64,
    /// Draws used by the CDF of a model without a closed form.
    pub cdf_draws: usize,
    pub mle: MleSettings,
    pub update: UpdateSettings,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            verbosity: 1,
            rng_seed: 479_001_599,
            cdf_draws: 10_000,
            mle: MleSettings::default(),
            update: UpdateSettings::default(),
        }
    }
}

impl Options {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let options: Options = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Advances the seed counter and returns the new seed.
    pub fn next_seed(&mut self) -> u64 {
        self.rng_seed = self.rng_seed.wrapping_add(1);
        self.rng_seed
    }

    /// The `log` filter matching `verbosity`.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbosity {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.update.burn_in) {
            return Err(ConfigError::Invalid(format!(
                "update.burn_in must lie in [0, 1], got {}",
                self.update.burn_in
            )));
        }
        if self.update.histogram_bins == 0 {
            return Err(ConfigError::Invalid("update.histogram_bins must be at least 1".to_string()));
        }
        if !(self.mle.delta > 0.0) {
            return Err(ConfigError::Invalid(format!("mle.delta must be positive, got {}", self.mle.delta)));
        }
        Ok(())
    }
}
