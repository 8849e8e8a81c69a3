//! Hyperparameter grids and their Cartesian expansion.
//!
//! A [`HyperGrid`] maps parameter names to candidate-value lists; insertion
//! order defines enumeration order. [`HyperGrid::expand`] produces every
//! concrete [`ParamSet`] in standard odometer order (last parameter varies
//! fastest), so two libraries given the same grid enumerate identical
//! work lists.

use std::collections::HashSet;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{MedirError, Result};

/// A concrete parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl ParamValue {
    /// Get as f64 if numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as i64 if integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as usize if a non-negative integer.
    #[must_use]
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            Self::Int(v) if *v >= 0 => Some(*v as usize),
            _ => None,
        }
    }

    /// Get as bool.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
        }
    }
}

/// One concrete parameter assignment drawn from a grid.
///
/// Equality depends only on the (name, value) set, never on insertion
/// order, matching the identity-digest contract.
#[derive(Debug, Clone, Default)]
pub struct ParamSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParamSet {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a set from (name, value) pairs, keeping their order.
    #[must_use]
    pub fn from_entries(entries: Vec<(String, ParamValue)>) -> Self {
        Self { entries }
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the set holds no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a value by parameter name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterates (name, value) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Parameter names in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Entries sorted by name, the canonical form fed to the digest.
    #[must_use]
    pub fn sorted_entries(&self) -> Vec<(&str, &ParamValue)> {
        let mut sorted: Vec<_> = self.entries.iter().map(|(n, v)| (n.as_str(), v)).collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        sorted
    }
}

impl PartialEq for ParamSet {
    fn eq(&self, other: &Self) -> bool {
        self.sorted_entries() == other.sorted_entries()
    }
}

/// An insertion-ordered mapping of parameter name to candidate values.
///
/// # Examples
///
/// ```
/// use medir::grid::HyperGrid;
///
/// let grid = HyperGrid::new()
///     .with("alpha", [0.1, 1.0])
///     .with("tol", [0.001]);
/// let combos = grid.expand().unwrap();
/// assert_eq!(combos.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HyperGrid {
    entries: Vec<(String, Vec<ParamValue>)>,
}

impl HyperGrid {
    /// Creates an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter with its candidate values.
    #[must_use]
    pub fn with<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        self.entries
            .push((name.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Number of parameters in the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the grid holds no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates (name, candidates) in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ParamValue])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Mutable access to the candidate lists, for config normalization.
    pub(crate) fn entries_mut(&mut self) -> &mut Vec<(String, Vec<ParamValue>)> {
        &mut self.entries
    }

    /// Checks the grid is well-formed: unique names, no empty candidate list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSpec` on a duplicate name or an empty list.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (name, values) in &self.entries {
            if !seen.insert(name.as_str()) {
                return Err(MedirError::invalid_spec(format!(
                    "duplicate hyperparameter '{name}'"
                )));
            }
            if values.is_empty() {
                return Err(MedirError::invalid_spec(format!(
                    "hyperparameter '{name}' has an empty candidate list"
                )));
            }
        }
        Ok(())
    }

    /// Expands the grid into every concrete combination.
    ///
    /// The empty grid yields exactly one empty combination, so every
    /// estimator is benchmarked at least once. Enumeration is odometer
    /// order over insertion order: the last parameter varies fastest.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSpec` if the grid is not well-formed.
    pub fn expand(&self) -> Result<Vec<ParamSet>> {
        self.validate()?;
        if self.entries.is_empty() {
            return Ok(vec![ParamSet::empty()]);
        }

        let total: usize = self.entries.iter().map(|(_, v)| v.len()).product();
        let mut combos = Vec::with_capacity(total);
        let mut odometer = vec![0usize; self.entries.len()];

        loop {
            let entries = self
                .entries
                .iter()
                .zip(&odometer)
                .map(|((name, values), &i)| (name.clone(), values[i].clone()))
                .collect();
            combos.push(ParamSet::from_entries(entries));

            let mut pos = self.entries.len();
            let rolled_over = loop {
                if pos == 0 {
                    break true;
                }
                pos -= 1;
                odometer[pos] += 1;
                if odometer[pos] < self.entries[pos].1.len() {
                    break false;
                }
                odometer[pos] = 0;
            };
            if rolled_over {
                return Ok(combos);
            }
        }
    }
}

impl Serialize for HyperGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, values) in &self.entries {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for HyperGrid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct GridVisitor;

        impl<'de> Visitor<'de> for GridVisitor {
            type Value = HyperGrid;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a map of parameter name to candidate-value list")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut grid = HyperGrid::new();
                while let Some((name, values)) = map.next_entry::<String, Vec<ParamValue>>()? {
                    grid.entries.push((name, values));
                }
                Ok(grid)
            }
        }

        deserializer.deserialize_map(GridVisitor)
    }
}
