//! Core model types: tuple lists and the index-based test model.
//!
//! Both types validate on construction and on deserialization, so every
//! `TestModel` in memory satisfies:
//! - `1 <= strength <= parameter_count`
//! - every domain size is at least 1
//! - tuple list ids are positive and unique across exclusions and errors
//! - every tuple has one in-range value per involved parameter

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combination::{Combination, WILDCARD};
use crate::error::ModelError;

/// Identifier of a tuple list, unique within one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TupleListId(pub u32);

impl fmt::Display for TupleListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A constraint expressed as value tuples over a fixed set of parameters.
///
/// As an exclusion, no test input may contain any of the tuples. As an
/// error list, each tuple is a combination expected to make the system fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TupleListRepr")]
pub struct TupleList {
    id: TupleListId,
    involved: Vec<usize>,
    tuples: Vec<Vec<u32>>,
    marked_as_correct: bool,
}

#[derive(Deserialize)]
struct TupleListRepr {
    id: TupleListId,
    involved: Vec<usize>,
    tuples: Vec<Vec<u32>>,
    #[serde(default)]
    marked_as_correct: bool,
}

impl TryFrom<TupleListRepr> for TupleList {
    type Error = ModelError;

    fn try_from(repr: TupleListRepr) -> Result<Self, Self::Error> {
        let list = TupleList::new(repr.id, repr.involved, repr.tuples)?;
        Ok(if repr.marked_as_correct {
            list.mark_as_correct()
        } else {
            list
        })
    }
}

impl TupleList {
    /// Build a tuple list, checking its shape. Duplicate tuples are dropped.
    pub fn new(
        id: TupleListId,
        involved: Vec<usize>,
        tuples: Vec<Vec<u32>>,
    ) -> Result<Self, ModelError> {
        if id.0 == 0 {
            return Err(ModelError::ZeroTupleListId);
        }
        if involved.is_empty() {
            return Err(ModelError::NoInvolvedParameters { id });
        }
        let mut seen = HashSet::new();
        for &parameter in &involved {
            if !seen.insert(parameter) {
                return Err(ModelError::DuplicateInvolvedParameter { id, parameter });
            }
        }
        if tuples.is_empty() {
            return Err(ModelError::EmptyTupleList { id });
        }
        let mut unique = Vec::with_capacity(tuples.len());
        let mut seen_tuples = HashSet::new();
        for tuple in tuples {
            if tuple.len() != involved.len() {
                return Err(ModelError::TupleLengthMismatch {
                    id,
                    expected: involved.len(),
                    found: tuple.len(),
                });
            }
            if tuple.contains(&WILDCARD) {
                return Err(ModelError::WildcardInTuple { id });
            }
            if seen_tuples.insert(tuple.clone()) {
                unique.push(tuple);
            }
        }
        Ok(Self {
            id,
            involved,
            tuples: unique,
            marked_as_correct: false,
        })
    }

    /// Mark the constraint as known to be correct; diagnosis never relaxes it.
    pub fn mark_as_correct(mut self) -> Self {
        self.marked_as_correct = true;
        self
    }

    pub fn id(&self) -> TupleListId {
        self.id
    }

    pub fn involved(&self) -> &[usize] {
        &self.involved
    }

    pub fn tuples(&self) -> &[Vec<u32>] {
        &self.tuples
    }

    pub fn is_marked_as_correct(&self) -> bool {
        self.marked_as_correct
    }

    /// True when `combination` contains one of the tuples.
    pub fn matches(&self, combination: &Combination) -> bool {
        self.tuples
            .iter()
            .any(|tuple| combination.matches(&self.involved, tuple))
    }

    /// The list without `tuple`, or `None` when nothing would remain.
    pub fn without_tuple(&self, tuple: &[u32]) -> Option<TupleList> {
        let tuples: Vec<Vec<u32>> = self
            .tuples
            .iter()
            .filter(|t| t.as_slice() != tuple)
            .cloned()
            .collect();
        if tuples.is_empty() {
            return None;
        }
        Some(TupleList { tuples, ..self.clone() })
    }
}

/// An index-based combinatorial test model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TestModelRepr")]
pub struct TestModel {
    strength: usize,
    sizes: Vec<u32>,
    exclusions: Vec<TupleList>,
    errors: Vec<TupleList>,
}

#[derive(Deserialize)]
struct TestModelRepr {
    strength: usize,
    sizes: Vec<u32>,
    #[serde(default)]
    exclusions: Vec<TupleList>,
    #[serde(default)]
    errors: Vec<TupleList>,
}

impl TryFrom<TestModelRepr> for TestModel {
    type Error = ModelError;

    fn try_from(repr: TestModelRepr) -> Result<Self, Self::Error> {
        TestModel::new(repr.strength, repr.sizes, repr.exclusions, repr.errors)
    }
}

impl TestModel {
    pub fn new(
        strength: usize,
        sizes: Vec<u32>,
        exclusions: Vec<TupleList>,
        errors: Vec<TupleList>,
    ) -> Result<Self, ModelError> {
        if strength == 0 || strength > sizes.len() {
            return Err(ModelError::InvalidStrength {
                strength,
                parameters: sizes.len(),
            });
        }
        if let Some(parameter) = sizes.iter().position(|&s| s == 0) {
            return Err(ModelError::EmptyDomain { parameter });
        }
        let mut ids = HashSet::new();
        for list in exclusions.iter().chain(&errors) {
            if !ids.insert(list.id) {
                return Err(ModelError::DuplicateTupleListId { id: list.id });
            }
            validate_against_sizes(list, &sizes)?;
        }
        Ok(Self {
            strength,
            sizes,
            exclusions,
            errors,
        })
    }

    /// A model without any constraints.
    pub fn unconstrained(strength: usize, sizes: Vec<u32>) -> Result<Self, ModelError> {
        Self::new(strength, sizes, Vec::new(), Vec::new())
    }

    pub fn strength(&self) -> usize {
        self.strength
    }

    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    pub fn size(&self, parameter: usize) -> u32 {
        self.sizes[parameter]
    }

    pub fn parameter_count(&self) -> usize {
        self.sizes.len()
    }

    pub fn exclusions(&self) -> &[TupleList] {
        &self.exclusions
    }

    pub fn errors(&self) -> &[TupleList] {
        &self.errors
    }

    pub fn error_list(&self, id: TupleListId) -> Option<&TupleList> {
        self.errors.iter().find(|l| l.id == id)
    }

    /// Any tuple list, exclusion or error, by id.
    pub fn tuple_list(&self, id: TupleListId) -> Option<&TupleList> {
        self.exclusions.iter().chain(&self.errors).find(|l| l.id == id)
    }

    pub fn has_constraints(&self) -> bool {
        !self.exclusions.is_empty() || !self.errors.is_empty()
    }

    /// Same strength and sizes with different constraint lists.
    pub fn with_constraints(
        &self,
        exclusions: Vec<TupleList>,
        errors: Vec<TupleList>,
    ) -> Result<Self, ModelError> {
        Self::new(self.strength, self.sizes.clone(), exclusions, errors)
    }
}

fn validate_against_sizes(list: &TupleList, sizes: &[u32]) -> Result<(), ModelError> {
    for &parameter in &list.involved {
        if parameter >= sizes.len() {
            return Err(ModelError::ParameterOutOfRange {
                id: list.id,
                parameter,
                parameters: sizes.len(),
            });
        }
    }
    for tuple in &list.tuples {
        for (&parameter, &value) in list.involved.iter().zip(tuple) {
            if value >= sizes[parameter] {
                return Err(ModelError::ValueOutOfRange {
                    id: list.id,
                    parameter,
                    value,
                    size: sizes[parameter],
                });
            }
        }
    }
    Ok(())
}
