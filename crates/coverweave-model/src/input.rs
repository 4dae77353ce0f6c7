//! Named input parameter models.
//!
//! This is the representation test authors write: parameters with typed
//! values and constraints given as predicates over parameter names. The
//! engine never sees it directly; [`crate::convert::IndexModelConverter`]
//! lowers it to a [`crate::TestModel`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A concrete parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Bool(b) => write!(f, "{b}"),
            ParameterValue::Int(i) => write!(f, "{i}"),
            ParameterValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(b: bool) -> Self {
        ParameterValue::Bool(b)
    }
}

impl From<i64> for ParameterValue {
    fn from(i: i64) -> Self {
        ParameterValue::Int(i)
    }
}

impl From<&str> for ParameterValue {
    fn from(s: &str) -> Self {
        ParameterValue::Text(s.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(s: String) -> Self {
        ParameterValue::Text(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub values: Vec<ParameterValue>,
}

impl Parameter {
    pub fn new<V: Into<ParameterValue>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Predicate over the values of a constraint's parameters, in the order the
/// constraint names them. Returns `true` for allowed value combinations.
pub type Predicate = Arc<dyn Fn(&[&ParameterValue]) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct Constraint {
    pub name: String,
    pub parameter_names: Vec<String>,
    pub predicate: Predicate,
    pub marked_as_correct: bool,
}

impl Constraint {
    pub fn new(
        name: impl Into<String>,
        parameter_names: &[&str],
        predicate: impl Fn(&[&ParameterValue]) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_names: parameter_names.iter().map(|s| s.to_string()).collect(),
            predicate: Arc::new(predicate),
            marked_as_correct: false,
        }
    }

    pub fn mark_as_correct(mut self) -> Self {
        self.marked_as_correct = true;
        self
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("name", &self.name)
            .field("parameter_names", &self.parameter_names)
            .field("marked_as_correct", &self.marked_as_correct)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct InputParameterModel {
    pub name: String,
    pub strength: usize,
    pub parameters: Vec<Parameter>,
    pub exclusion_constraints: Vec<Constraint>,
    pub error_constraints: Vec<Constraint>,
}

impl InputParameterModel {
    pub fn new(name: impl Into<String>, strength: usize, parameters: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            strength,
            parameters,
            exclusion_constraints: Vec::new(),
            error_constraints: Vec::new(),
        }
    }

    pub fn with_exclusion(mut self, constraint: Constraint) -> Self {
        self.exclusion_constraints.push(constraint);
        self
    }

    pub fn with_error(mut self, constraint: Constraint) -> Self {
        self.error_constraints.push(constraint);
        self
    }

    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == name)
    }
}

/// A combination expressed with parameter names and values. Unassigned
/// parameters are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NamedCombination {
    pub assignments: Vec<(String, ParameterValue)>,
}

impl NamedCombination {
    pub fn get(&self, parameter: &str) -> Option<&ParameterValue> {
        self.assignments
            .iter()
            .find(|(name, _)| name == parameter)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for NamedCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.assignments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "}}")
    }
}
