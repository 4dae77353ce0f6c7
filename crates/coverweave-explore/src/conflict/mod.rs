//! Detection of error tuples that no valid test input can contain.
//!
//! For every tuple `e` of every error list the detector asks whether some
//! full assignment matches `e` while respecting all other constraints. The
//! analysis per tuple:
//! - **background**: `e` pinned onto its parameters, plus every constraint
//!   marked correct
//! - **relaxable**: every other constraint tuple, except the siblings of `e`
//!   in its own list
//!
//! If background and relaxable constraints are satisfiable together the
//! tuple is fine. Otherwise it is reported, optionally with a minimal
//! conflict and with all minimal diagnoses.

pub mod artifacts;
pub mod diagnosis;
pub mod explain;
pub mod hitting_set;
pub mod model;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use varisat::Lit;

use coverweave_model::{ModelError, TestModel, TupleListId};

use crate::solver::SolverError;

pub use artifacts::{
    ConflictExplanation, DiagnosisElement, DiagnosisHittingSet, MissingInvalidTuple,
};
pub use hitting_set::HittingSetMode;

use diagnosis::diagnose;
use explain::{quick_xplain, Explanation};
use model::{ConflictModel, ConstraintKind};

#[derive(Debug, thiserror::Error)]
pub enum ConflictError {
    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("invalid conflict detection configuration: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error("no diagnosis available for a missing tuple of error list {list}")]
    DiagnosisUnavailable { list: TupleListId },
}

/// Conflict detection options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictDetectionConfig {
    /// Run detection before generating test inputs.
    pub enabled: bool,
    /// Abort generation when any conflict is found.
    pub should_abort: bool,
    /// Compute a minimal conflict for every missing tuple.
    pub explanation_enabled: bool,
    /// Compute all minimal diagnoses (needs explanations).
    pub diagnosis_enabled: bool,
    pub hitting_set_mode: HittingSetMode,
}

impl Default for ConflictDetectionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            should_abort: false,
            explanation_enabled: false,
            diagnosis_enabled: false,
            hitting_set_mode: HittingSetMode::MinimumCardinality,
        }
    }
}

impl ConflictDetectionConfig {
    /// Detection with explanation and diagnosis, not aborting.
    pub fn diagnosing() -> Self {
        Self {
            enabled: true,
            should_abort: false,
            explanation_enabled: true,
            diagnosis_enabled: true,
            hitting_set_mode: HittingSetMode::MinimumCardinality,
        }
    }

    pub fn validate(&self) -> Result<(), ConflictError> {
        if self.explanation_enabled && !self.enabled {
            return Err(ConflictError::InvalidConfig {
                reason: "explanation requires detection",
            });
        }
        if self.diagnosis_enabled && !self.explanation_enabled {
            return Err(ConflictError::InvalidConfig {
                reason: "diagnosis requires explanation",
            });
        }
        if self.should_abort && !self.enabled {
            return Err(ConflictError::InvalidConfig {
                reason: "aborting requires detection",
            });
        }
        Ok(())
    }
}

pub struct ConflictDetectionManager {
    config: ConflictDetectionConfig,
    model: Arc<TestModel>,
}

impl ConflictDetectionManager {
    pub fn new(
        config: ConflictDetectionConfig,
        model: Arc<TestModel>,
    ) -> Result<Self, ConflictError> {
        config.validate()?;
        Ok(Self { config, model })
    }

    pub fn config(&self) -> &ConflictDetectionConfig {
        &self.config
    }

    /// Every error tuple that cannot appear in a valid test input, in
    /// declaration order.
    pub fn detect_missing_invalid_tuples(&self) -> Result<Vec<MissingInvalidTuple>, ConflictError> {
        let mut conflict_model = ConflictModel::new(&self.model);
        let mut missing = Vec::new();

        for index in 0..conflict_model.constraints().len() {
            let constraint = conflict_model.constraint(index);
            if constraint.kind != ConstraintKind::Error {
                continue;
            }
            let Some(pinned) = constraint.negation else {
                continue;
            };
            let own_list = constraint.element.list;

            let mut background: Vec<Lit> = vec![pinned];
            let mut background_constraints = Vec::new();
            let mut relaxable = Vec::new();
            for (other, c) in conflict_model.constraints().iter().enumerate() {
                if other == index || c.element.list == own_list {
                    continue;
                }
                if c.marked_as_correct {
                    background.push(c.selector);
                    background_constraints.push(other);
                } else {
                    relaxable.push(other);
                }
            }

            if conflict_model.is_consistent(&background, &relaxable)? {
                continue;
            }

            let explanation = self.explain(
                &mut conflict_model,
                &background,
                &background_constraints,
                &relaxable,
            )?;
            let element = conflict_model.constraint(index).element.clone();
            debug!(list = %element.list, values = ?element.values, "missing invalid tuple");
            missing.push(MissingInvalidTuple {
                error_list: element.list,
                involved: element.involved,
                values: element.values,
                explanation,
            });
        }

        info!(missing = missing.len(), "conflict detection finished");
        Ok(missing)
    }

    fn explain(
        &self,
        conflict_model: &mut ConflictModel,
        background: &[Lit],
        background_constraints: &[usize],
        relaxable: &[usize],
    ) -> Result<ConflictExplanation, ConflictError> {
        if !self.config.explanation_enabled {
            return Ok(ConflictExplanation::Unknown);
        }
        let explanation = match quick_xplain(conflict_model, background, relaxable)? {
            Explanation::Consistent => ConflictExplanation::Unknown,
            Explanation::InconsistentBackground => ConflictExplanation::InconsistentBackground {
                background: conflict_model.elements(background_constraints),
            },
            Explanation::Conflict(conflict) => {
                if self.config.diagnosis_enabled {
                    let diagnoses = diagnose(conflict_model, background, relaxable, &conflict)?;
                    ConflictExplanation::DiagnosisSets {
                        conflict: conflict_model.elements(&conflict),
                        diagnoses: diagnoses
                            .iter()
                            .map(|d| conflict_model.elements(d))
                            .collect(),
                    }
                } else {
                    ConflictExplanation::ConflictSet {
                        conflict: conflict_model.elements(&conflict),
                    }
                }
            }
        };
        Ok(explanation)
    }

    pub fn compute_minimal_diagnosis_hitting_sets(
        &self,
        missing: &[MissingInvalidTuple],
    ) -> Result<Vec<DiagnosisHittingSet>, ConflictError> {
        hitting_set::minimal_hitting_sets(&self.model, missing, self.config.hitting_set_mode)
    }
}
