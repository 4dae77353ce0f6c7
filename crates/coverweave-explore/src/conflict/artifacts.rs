//! Conflict detection results.

use std::fmt;

use serde::{Deserialize, Serialize};

use coverweave_model::{ModelError, TestModel, TupleList, TupleListId};

/// One tuple of one constraint. Conflicts and diagnoses are sets of these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiagnosisElement {
    pub list: TupleListId,
    pub involved: Vec<usize>,
    pub values: Vec<u32>,
}

impl fmt::Display for DiagnosisElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}={:?}", self.list, self.involved, self.values)
    }
}

/// Why an error tuple cannot appear in any valid test input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictExplanation {
    /// The constraints marked correct already rule the tuple out.
    InconsistentBackground { background: Vec<DiagnosisElement> },
    /// A minimal set of constraint tuples that together rule the tuple out.
    ConflictSet { conflict: Vec<DiagnosisElement> },
    /// A minimal conflict plus every minimal set of tuples whose removal
    /// makes the error tuple realizable again.
    DiagnosisSets {
        conflict: Vec<DiagnosisElement>,
        diagnoses: Vec<Vec<DiagnosisElement>>,
    },
    /// Explanation was not requested.
    Unknown,
}

/// An error tuple no valid test input can contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingInvalidTuple {
    pub error_list: TupleListId,
    pub involved: Vec<usize>,
    pub values: Vec<u32>,
    pub explanation: ConflictExplanation,
}

impl MissingInvalidTuple {
    /// The tuple itself as a diagnosis element of its own error list.
    pub fn as_element(&self) -> DiagnosisElement {
        DiagnosisElement {
            list: self.error_list,
            involved: self.involved.clone(),
            values: self.values.clone(),
        }
    }
}

/// A set of constraint tuples whose removal resolves every detected conflict.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiagnosisHittingSet {
    pub elements: Vec<DiagnosisElement>,
}

impl DiagnosisHittingSet {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// `model` with every element removed from its tuple list. Lists left
    /// without tuples are dropped.
    pub fn apply(&self, model: &TestModel) -> Result<TestModel, ModelError> {
        let relax = |lists: &[TupleList]| -> Vec<TupleList> {
            lists
                .iter()
                .filter_map(|list| {
                    self.elements
                        .iter()
                        .filter(|e| e.list == list.id())
                        .try_fold(list.clone(), |current, e| current.without_tuple(&e.values))
                })
                .collect()
        };
        model.with_constraints(relax(model.exclusions()), relax(model.errors()))
    }
}

impl fmt::Display for DiagnosisHittingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, e) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{e}")?;
        }
        write!(f, "}}")
    }
}
