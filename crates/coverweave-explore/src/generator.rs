//! Test input groups and the positive t-wise generator.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use coverweave_model::{Combination, Reporter, TestModel, TupleListId};

use crate::checker::{positive_checker, ConstraintChecker, NegatedConstraintChecker};
use crate::error::GenerationError;
use crate::ipog::{IpogAlgorithm, IpogConfig};

/// Identifies a group within one session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupId {
    /// A group without a single error list behind it.
    Named(String),
    /// The negative group isolating one error tuple list.
    ErrorTuples(TupleListId),
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupId::Named(name) => write!(f, "{name}"),
            GroupId::ErrorTuples(id) => write!(f, "negative tuple list {id}"),
        }
    }
}

/// What a fault characterization algorithm needs to know about a group.
#[derive(Debug, Clone)]
pub struct FaultCharacterizationConfig {
    pub model: Arc<TestModel>,
    pub group: GroupId,
    /// The error list the group was generated for, if any.
    pub negated: Option<TupleListId>,
}

impl FaultCharacterizationConfig {
    pub fn new(model: Arc<TestModel>, group: GroupId, negated: Option<TupleListId>) -> Self {
        Self {
            model,
            group,
            negated,
        }
    }

    /// A fresh checker for the constraints the group's inputs obey: the
    /// negated list's checker for negative groups, the positive one otherwise.
    ///
    /// Checkers hold a SAT solver and are not `Send`, so algorithms build one
    /// when they need it instead of storing it.
    pub fn constraint_checker(&self) -> Result<Box<dyn ConstraintChecker>, GenerationError> {
        match self.negated {
            Some(list) => Ok(Box::new(NegatedConstraintChecker::new(&self.model, list)?)),
            None => Ok(positive_checker(&self.model)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestInputGroup {
    pub id: GroupId,
    pub combinations: Vec<Combination>,
    pub characterization: Option<FaultCharacterizationConfig>,
}

/// A source of test input groups for a model.
pub trait TestInputGroupGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn generate(
        &self,
        model: &Arc<TestModel>,
        reporter: &dyn Reporter,
    ) -> Result<Vec<TestInputGroup>, GenerationError>;
}

pub const POSITIVE_GROUP: &str = "positive t-wise";

/// Positive t-wise generation: one group covering every valid t-tuple with
/// inputs that contain neither exclusion nor error tuples.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ipog;

impl TestInputGroupGenerator for Ipog {
    fn name(&self) -> &str {
        "ipog"
    }

    fn generate(
        &self,
        model: &Arc<TestModel>,
        reporter: &dyn Reporter,
    ) -> Result<Vec<TestInputGroup>, GenerationError> {
        let mut checker = positive_checker(model);
        let result =
            IpogAlgorithm::new(model, checker.as_mut(), IpogConfig::default(), reporter).generate();
        info!(
            rows = result.rows.len(),
            uncoverable = result.uncoverable,
            strength = model.strength(),
            "positive group generated"
        );
        let id = GroupId::Named(POSITIVE_GROUP.to_string());
        Ok(vec![TestInputGroup {
            characterization: Some(FaultCharacterizationConfig::new(
                Arc::clone(model),
                id.clone(),
                None,
            )),
            id,
            combinations: result.rows,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverweave_model::{NoopReporter, TupleList};

    fn model() -> Arc<TestModel> {
        let exclusion = TupleList::new(TupleListId(1), vec![0, 1], vec![vec![0, 0]]).unwrap();
        let error = TupleList::new(TupleListId(2), vec![2], vec![vec![1]]).unwrap();
        Arc::new(TestModel::new(2, vec![2, 2, 2], vec![exclusion], vec![error]).unwrap())
    }

    #[test]
    fn test_positive_group_checker_forbids_exclusions_and_errors() {
        let model = model();
        let groups = Ipog.generate(&model, &NoopReporter).unwrap();
        let config = groups[0].characterization.as_ref().unwrap();
        let mut checker = config.constraint_checker().unwrap();
        assert!(!checker.is_valid(&Combination::from(vec![0, 0, 0])));
        assert!(!checker.is_valid(&Combination::from(vec![1, 0, 1])));
        assert!(checker.is_valid(&Combination::from(vec![1, 0, 0])));
    }

    #[test]
    fn test_negative_group_checker_requires_negated_tuple() {
        let config = FaultCharacterizationConfig::new(
            model(),
            GroupId::ErrorTuples(TupleListId(2)),
            Some(TupleListId(2)),
        );
        let mut checker = config.constraint_checker().unwrap();
        assert!(checker.is_valid(&Combination::from(vec![1, 0, 1])));
        assert!(!checker.is_valid(&Combination::from(vec![1, 0, 0])));
        assert!(!checker.is_valid(&Combination::from(vec![0, 0, 1])));
    }

    #[test]
    fn test_unknown_negated_list_is_an_error() {
        let config = FaultCharacterizationConfig::new(
            model(),
            GroupId::Named("x".into()),
            Some(TupleListId(7)),
        );
        assert!(matches!(
            config.constraint_checker(),
            Err(GenerationError::UnknownErrorList { .. })
        ));
    }
}
