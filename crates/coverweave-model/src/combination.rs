//! Combinations: fixed-length value arrays over the parameters of a model.
//!
//! - A position holding [`WILDCARD`] is unassigned.
//! - A combination without wildcards is *full* and is executable as a test input.
//! - Ordering and hashing are by value, so combinations can key maps and sets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combinator::subsets;

/// Marker for an unassigned position.
pub const WILDCARD: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Combination(Vec<u32>);

impl Combination {
    /// A combination with every position unassigned.
    pub fn empty(parameters: usize) -> Self {
        Self(vec![WILDCARD; parameters])
    }

    /// A combination assigning `tuple` to the `involved` positions and nothing else.
    pub fn from_tuple(parameters: usize, involved: &[usize], tuple: &[u32]) -> Self {
        let mut combination = Self::empty(parameters);
        for (&parameter, &value) in involved.iter().zip(tuple) {
            combination.0[parameter] = value;
        }
        combination
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[u32] {
        &self.0
    }

    /// The assigned value at `parameter`, or `None` for a wildcard.
    pub fn get(&self, parameter: usize) -> Option<u32> {
        match self.0[parameter] {
            WILDCARD => None,
            value => Some(value),
        }
    }

    pub fn is_set(&self, parameter: usize) -> bool {
        self.0[parameter] != WILDCARD
    }

    pub fn set(&mut self, parameter: usize, value: u32) {
        self.0[parameter] = value;
    }

    pub fn clear(&mut self, parameter: usize) {
        self.0[parameter] = WILDCARD;
    }

    /// Copy of `self` with `parameter` set to `value`.
    pub fn with(&self, parameter: usize, value: u32) -> Self {
        let mut extended = self.clone();
        extended.0[parameter] = value;
        extended
    }

    pub fn is_full(&self) -> bool {
        self.0.iter().all(|&v| v != WILDCARD)
    }

    pub fn assigned_count(&self) -> usize {
        self.0.iter().filter(|&&v| v != WILDCARD).count()
    }

    pub fn assigned_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != WILDCARD)
            .map(|(i, _)| i)
    }

    /// No position holds two different assigned values.
    pub fn is_compatible(&self, other: &Combination) -> bool {
        debug_assert_eq!(self.len(), other.len());
        self.0
            .iter()
            .zip(&other.0)
            .all(|(&a, &b)| a == WILDCARD || b == WILDCARD || a == b)
    }

    /// Every assigned position of `sub` holds the same value in `self`.
    pub fn contains(&self, sub: &Combination) -> bool {
        debug_assert_eq!(self.len(), sub.len());
        self.0
            .iter()
            .zip(&sub.0)
            .all(|(&a, &b)| b == WILDCARD || a == b)
    }

    /// Union of both assignments, or `None` when they disagree somewhere.
    pub fn merge(&self, other: &Combination) -> Option<Combination> {
        if !self.is_compatible(other) {
            return None;
        }
        let merged = self
            .0
            .iter()
            .zip(&other.0)
            .map(|(&a, &b)| if a == WILDCARD { b } else { a })
            .collect();
        Some(Self(merged))
    }

    /// True when the `involved` positions hold exactly `tuple`.
    pub fn matches(&self, involved: &[usize], tuple: &[u32]) -> bool {
        involved
            .iter()
            .zip(tuple)
            .all(|(&parameter, &value)| self.0[parameter] == value)
    }

    /// Values at `positions`, in the order given.
    pub fn project(&self, positions: &[usize]) -> Vec<u32> {
        positions.iter().map(|&p| self.0[p]).collect()
    }

    /// Keep only `positions`, clearing everything else.
    pub fn restrict(&self, positions: &[usize]) -> Combination {
        let mut restricted = Self::empty(self.len());
        for &p in positions {
            restricted.0[p] = self.0[p];
        }
        restricted
    }

    /// Every sub-combination assigning between 1 and `max_size` of the
    /// assigned positions, smallest first. `self` is included when it has at
    /// most `max_size` assignments.
    pub fn sub_combinations(&self, max_size: usize) -> Vec<Combination> {
        let positions: Vec<usize> = self.assigned_positions().collect();
        (1..=max_size.min(positions.len()))
            .flat_map(|size| self.sub_combinations_of_size(&positions, size))
            .collect()
    }

    /// Every sub-combination assigning exactly `size` of the assigned positions.
    pub fn sub_combinations_with_size(&self, size: usize) -> Vec<Combination> {
        let positions: Vec<usize> = self.assigned_positions().collect();
        self.sub_combinations_of_size(&positions, size)
    }

    fn sub_combinations_of_size(&self, positions: &[usize], size: usize) -> Vec<Combination> {
        subsets(positions, size)
            .iter()
            .map(|subset| self.restrict(subset))
            .collect()
    }
}

impl From<Vec<u32>> for Combination {
    fn from(values: Vec<u32>) -> Self {
        Self(values)
    }
}

impl From<&[u32]> for Combination {
    fn from(values: &[u32]) -> Self {
        Self(values.to_vec())
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, &value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                WILDCARD => write!(f, "*")?, v => write!(f, "{v}")?,
            }
        }
        write!(f, "]")
    }
}
