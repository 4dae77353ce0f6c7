//! Constraint checking for partial combinations.
//!
//! A partial combination is *valid* when it extends to at least one full
//! combination respecting every hard constraint. Checks run in two stages:
//! - a direct lookup in a [`ConstraintIndex`] rejects combinations that
//!   already contain a forbidden tuple
//! - a varisat solve under assumptions decides extendability, catching
//!   implicit conflicts between constraints
//!
//! Unconstrained models skip both stages through [`NoConstraintChecker`].

use std::collections::HashMap;

use tracing::{debug, warn};
use varisat::Lit;

use coverweave_model::{Combination, TestModel, TupleList, TupleListId};

use crate::error::GenerationError;
use crate::solver::clauses::{forbid_tuple, guarded_require, match_implies};
use crate::solver::counter::SequentialCounter;
use crate::solver::encoding::encode_parameters;
use crate::solver::{SatSession, SolverError};

pub trait ConstraintChecker {
    /// `combination` extends to a full combination satisfying all hard constraints.
    fn is_valid(&mut self, combination: &Combination) -> bool;

    /// Same as [`Self::is_valid`] on `combination` with `parameter` set to `value`.
    fn is_extension_valid(
        &mut self,
        combination: &Combination,
        parameter: usize,
        value: u32,
    ) -> bool {
        self.is_valid(&combination.with(parameter, value))
    }
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstraintChecker;

impl ConstraintChecker for NoConstraintChecker {
    fn is_valid(&mut self, _combination: &Combination) -> bool {
        true
    }
}

/// Tuple lists grouped by involved parameters for direct lookups.
#[derive(Debug, Clone, Default)]
pub struct ConstraintIndex {
    groups: Vec<IndexedGroup>,
}

#[derive(Debug, Clone)]
struct IndexedGroup {
    involved: Vec<usize>,
    tuples: HashMap<Vec<u32>, TupleListId>,
}

impl ConstraintIndex {
    pub fn new<'a>(lists: impl IntoIterator<Item = &'a TupleList>) -> Self {
        let mut groups: Vec<IndexedGroup> = Vec::new();
        for list in lists {
            let position = groups.iter().position(|g| g.involved == list.involved());
            let group = match position {
                Some(i) => &mut groups[i],
                None => {
                    groups.push(IndexedGroup {
                        involved: list.involved().to_vec(),
                        tuples: HashMap::new(),
                    });
                    let last = groups.len() - 1;
                    &mut groups[last]
                }
            };
            for tuple in list.tuples() {
                group.tuples.entry(tuple.clone()).or_insert(list.id());
            }
        }
        Self { groups }
    }

    /// Index over the exclusion lists of `model`.
    pub fn exclusions(model: &TestModel) -> Self {
        Self::new(model.exclusions())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The list owning the first indexed tuple fully contained in `combination`.
    pub fn violation(&self, combination: &Combination) -> Option<TupleListId> {
        self.groups.iter().find_map(|group| {
            if !group.involved.iter().all(|&p| combination.is_set(p)) {
                return None;
            }
            group
                .tuples
                .get(&combination.project(&group.involved))
                .copied()
        })
    }

    pub fn violates(&self, combination: &Combination) -> bool {
        self.violation(combination).is_some()
    }
}

/// True when `combination` contains any exclusion tuple of `model`.
pub fn violates_exclusion(model: &TestModel, combination: &Combination) -> bool {
    model.exclusions().iter().any(|list| list.matches(combination))
}

/// True when `combination` contains one of the tuples of `list`.
pub fn matches_error_tuple(combination: &Combination, list: &TupleList) -> bool {
    list.matches(combination)
}

fn report_solver_failure(error: &SolverError, combination: &Combination) -> bool {
    warn!(
        error = %error,
        combination = %combination,
        "constraint check failed, treating as invalid"
    );
    false
}

/// Checker treating a fixed set of tuple lists as forbidden.
pub struct HardConstraintChecker {
    index: ConstraintIndex,
    session: SatSession,
}

impl HardConstraintChecker {
    pub fn new<'a>(
        model: &TestModel,
        forbidden: impl IntoIterator<Item = &'a TupleList> + Clone,
    ) -> Self {
        let index = ConstraintIndex::new(forbidden.clone());
        let mut session = SatSession::new(encode_parameters(model.sizes()));
        for list in forbidden {
            for tuple in list.tuples() {
                let clause = forbid_tuple(session.encoding(), list.involved(), tuple);
                session.add_clause(&clause);
            }
        }
        Self { index, session }
    }

    /// Exclusions and every error tuple are forbidden: positive test inputs
    /// never trigger a declared failure.
    pub fn positive(model: &TestModel) -> Self {
        Self::new(model, model.exclusions().iter().chain(model.errors()))
    }
}

impl ConstraintChecker for HardConstraintChecker {
    fn is_valid(&mut self, combination: &Combination) -> bool {
        if self.index.violates(combination) {
            return false;
        }
        self.session
            .is_extendable(combination, &[])
            .unwrap_or_else(|e| report_solver_failure(&e, combination))
    }
}

/// Checker for the inputs of one negative group.
///
/// Exclusions are hard, the combination must contain a tuple of the negated
/// list, and every other error list is soft: a combination fixing tuple `e`
/// may match at most `allowance(e)` other error lists, where the allowance is
/// the smallest number any exclusion-respecting completion of `e` has to match.
pub struct NegatedConstraintChecker {
    exclusions: ConstraintIndex,
    negated: TupleList,
    session: SatSession,
    allowances: Vec<Option<usize>>,
}

impl NegatedConstraintChecker {
    pub fn new(model: &TestModel, negated: TupleListId) -> Result<Self, GenerationError> {
        let negated = model
            .error_list(negated)
            .ok_or(GenerationError::UnknownErrorList { id: negated })?
            .clone();

        let mut session = SatSession::new(encode_parameters(model.sizes()));
        for list in model.exclusions() {
            for tuple in list.tuples() {
                let clause = forbid_tuple(session.encoding(), list.involved(), tuple);
                session.add_clause(&clause);
            }
        }

        let selectors: Vec<Lit> = negated
            .tuples()
            .iter()
            .map(|tuple| {
                let selector = session.new_var().positive();
                let clauses =
                    guarded_require(session.encoding(), selector, negated.involved(), tuple);
                session.add_clauses(&clauses);
                selector
            })
            .collect();
        session.add_clause(&selectors);

        let indicators: Vec<Lit> = model
            .errors()
            .iter()
            .filter(|list| list.id() != negated.id())
            .map(|list| {
                let indicator = session.new_var().positive();
                for tuple in list.tuples() {
                    let clause =
                        match_implies(session.encoding(), indicator, list.involved(), tuple);
                    session.add_clause(&clause);
                }
                indicator
            })
            .collect();
        let counter = SequentialCounter::build(&mut session, &indicators);

        let mut allowances = Vec::with_capacity(selectors.len());
        for (tuple, &selector) in negated.tuples().iter().zip(&selectors) {
            let allowance = minimal_allowance(&mut session, &counter, selector)?;
            match allowance {
                Some(k) => {
                    if let Some(bound) = counter.at_most(k) {
                        session.add_clause(&[!selector, bound]);
                    }
                    if k > 0 {
                        debug!(
                            list = %negated.id(),
                            tuple = ?tuple,
                            allowance = k,
                            "error tuple cannot be fully isolated"
                        );
                    }
                }
                None => {
                    session.add_clause(&[!selector]);
                    debug!(list = %negated.id(), tuple = ?tuple, "error tuple is unrealizable");
                }
            }
            allowances.push(allowance);
        }

        Ok(Self {
            exclusions: ConstraintIndex::exclusions(model),
            negated,
            session,
            allowances,
        })
    }

    pub fn negated(&self) -> &TupleList {
        &self.negated
    }

    /// Number of other error lists tuple `index` may match, `None` when the
    /// tuple cannot appear in any valid test input.
    pub fn allowance(&self, index: usize) -> Option<usize> {
        self.allowances.get(index).copied().flatten()
    }

    /// Tuples of the negated list that some test input can realize.
    pub fn realizable_tuples(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.negated
            .tuples()
            .iter()
            .zip(&self.allowances)
            .filter(|(_, a)| a.is_some())
            .map(|(t, _)| t.as_slice())
    }

    fn cannot_match_negated(&self, combination: &Combination) -> bool {
        let involved = self.negated.involved();
        if !involved.iter().all(|&p| combination.is_set(p)) {
            return false;
        }
        let projected = combination.project(involved);
        !self.realizable_tuples().any(|t| t == projected.as_slice())
    }
}

fn minimal_allowance(
    session: &mut SatSession,
    counter: &SequentialCounter,
    selector: Lit,
) -> Result<Option<usize>, SolverError> {
    if !session.solve_under(&[selector])? {
        return Ok(None);
    }
    for k in 0..counter.input_count() {
        let Some(bound) = counter.at_most(k) else {
            break;
        };
        if session.solve_under(&[selector, bound])? {
            return Ok(Some(k));
        }
    }
    Ok(Some(counter.input_count()))
}

impl ConstraintChecker for NegatedConstraintChecker {
    fn is_valid(&mut self, combination: &Combination) -> bool {
        if self.exclusions.violates(combination) || self.cannot_match_negated(combination) {
            return false;
        }
        self.session
            .is_extendable(combination, &[])
            .unwrap_or_else(|e| report_solver_failure(&e, combination))
    }
}

/// Checker for positive generation, skipping SAT for unconstrained models.
pub fn positive_checker(model: &TestModel) -> Box<dyn ConstraintChecker> {
    if model.has_constraints() {
        Box::new(HardConstraintChecker::positive(model))
    } else {
        Box::new(NoConstraintChecker)
    }
}
