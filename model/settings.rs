//! Per-model settings groups.
//!
//! Each group is a typed value filed under a fixed name, at most one per
//! name. Groups carry their own cloning, so copying a model copies its
//! settings without knowing what they hold.

use super::ModelError;
use super::arms::Envelope;
use ahash::AHashMap;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::hash_map::Entry;
use std::fmt;

/// A settings group type and the name it is filed under.
pub trait Group: Any + Clone + fmt::Debug + Send + Sync {
    const NAME: &'static str;
}

trait Stored: Any + fmt::Debug + Send + Sync {
    fn clone_box(&self) -> Box<dyn Stored>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Group> Stored for T {
    fn clone_box(&self) -> Box<dyn Stored> {
        Box::new(self.clone())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Clone for Box<dyn Stored> {
    fn clone(&self) -> Self {
        self.as_ref().clone_box()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Settings {
    groups: AHashMap<String, Box<dyn Stored>>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The group filed under `T::NAME`, if one is registered with that type.
    pub fn get<T: Group>(&self) -> Option<&T> {
        self.groups.get(T::NAME)?.as_any().downcast_ref()
    }

    pub fn get_mut<T: Group>(&mut self) -> Option<&mut T> {
        self.groups.get_mut(T::NAME)?.as_any_mut().downcast_mut()
    }

    /// Files `group` under its name, returning whatever was there before.
    pub fn insert<T: Group>(&mut self, group: T) -> Option<T> {
        let previous = self.groups.insert(T::NAME.to_string(), Box::new(group))?;
        previous.as_any().downcast_ref::<T>().cloned()
    }

    /// The existing group, or a new one built by `create`. Fails when the
    /// name is already taken by a group of another type.
    pub fn get_or_insert_with<T: Group>(&mut self, create: impl FnOnce() -> T) -> Result<&mut T, ModelError> {
        let slot = match self.groups.entry(T::NAME.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(Box::new(create())),
        };
        slot.as_any_mut()
            .downcast_mut()
            .ok_or(ModelError::SettingsCollision(T::NAME))
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.groups.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Draw count and generator for the draw-counting CDF. Created on first use,
/// seeded from the run's options.
#[derive(Debug, Clone)]
pub struct CdfSettings {
    pub draws: usize,
    pub rng: StdRng,
}

impl Group for CdfSettings {
    const NAME: &'static str = "cdf";
}

impl CdfSettings {
    pub fn new(draws: usize, seed: u64) -> Self {
        Self {
            draws,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

/// Controls for the maximum-likelihood fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MleSettings {
    /// Packed parameters to start from; all ones when absent.
    pub starting_point: Option<Vec<f64>>,
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Step for central-difference gradients.
    pub delta: f64,
}

impl Default for MleSettings {
    fn default() -> Self {
        Self {
            starting_point: None,
            tolerance: 1e-6,
            max_iterations: 500,
            delta: 1e-4,
        }
    }
}

impl Group for MleSettings {
    const NAME: &'static str = "mle";
}

/// Support and resolution of the adaptive rejection sampler, plus the
/// envelope it has learned so far.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmsSettings {
    pub lower: f64,
    pub upper: f64,
    pub segments: usize,
    pub envelope: Option<Envelope>,
}

impl Default for ArmsSettings {
    fn default() -> Self {
        Self {
            lower: -10.0,
            upper: 10.0,
            segments: 400,
            envelope: None,
        }
    }
}

impl Group for ArmsSettings {
    const NAME: &'static str = "arms";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_group_per_name_and_absent_lookups_are_none() {
        let mut settings = Settings::new();
        assert!(settings.get::<MleSettings>().is_none());

        settings.insert(MleSettings::default());
        let previous = settings.insert(MleSettings {
            tolerance: 1e-3,
            ..MleSettings::default()
        });
        assert_eq!(previous.map(|p| p.tolerance), Some(1e-6));
        assert_eq!(settings.names().count(), 1);
        assert_eq!(settings.get::<MleSettings>().map(|m| m.tolerance), Some(1e-3));
    }

    #[test]
    fn get_or_insert_creates_once() {
        let mut settings = Settings::new();
        settings.get_or_insert_with(|| CdfSettings::new(10, 1)).unwrap().draws = 25;
        let draws = settings.get_or_insert_with(|| CdfSettings::new(10, 2)).unwrap().draws;
        assert_eq!(draws, 25);
        assert!(settings.contains("cdf"));
        assert!(settings.remove("cdf"));
        assert!(settings.is_empty());
    }

    #[derive(Debug, Clone)]
    struct Impostor;

    impl Group for Impostor {
        const NAME: &'static str = "cdf";
    }

    #[test]
    fn a_taken_name_is_not_overwritten() {
        let mut settings = Settings::new();
        settings.insert(CdfSettings::new(10, 1));
        assert!(matches!(
            settings.get_or_insert_with(|| Impostor),
            Err(ModelError::SettingsCollision("cdf"))
        ));
        assert_eq!(settings.get::<CdfSettings>().map(|c| c.draws), Some(10));
    }

    #[test]
    fn cloned_registries_are_independent() {
        let mut original = Settings::new();
        original.insert(ArmsSettings::default());
        let mut copy = original.clone();
        if let Some(arms) = copy.get_mut::<ArmsSettings>() {
            arms.segments = 3;
        }
        assert_eq!(original.get::<ArmsSettings>().map(|a| a.segments), Some(400));
        assert_eq!(copy.get::<ArmsSettings>().map(|a| a.segments), Some(3));
    }
}
