//! SAT model for conflict analysis.
//!
//! Every tuple of every constraint becomes its own *expanded constraint*
//! guarded by a selector literal: assuming the selector enables the
//! "forbidden" clause, leaving it out drops the constraint. Error tuples also
//! get a negation literal that forces the tuple onto its parameters, which is
//! how a missing error tuple is pinned during analysis.

use varisat::Lit;

use coverweave_model::TestModel;

use crate::solver::clauses::{guarded_forbid, guarded_require};
use crate::solver::encoding::encode_parameters;
use crate::solver::{SatSession, SolverError};

use super::artifacts::DiagnosisElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Exclusion,
    Error,
}

#[derive(Debug, Clone)]
pub struct ExpandedConstraint {
    pub element: DiagnosisElement,
    pub kind: ConstraintKind,
    pub marked_as_correct: bool,
    pub selector: Lit,
    pub negation: Option<Lit>,
}

pub struct ConflictModel {
    session: SatSession,
    constraints: Vec<ExpandedConstraint>,
}

impl ConflictModel {
    pub fn new(model: &TestModel) -> Self {
        let mut session = SatSession::new(encode_parameters(model.sizes()));
        let mut constraints = Vec::new();

        let lists = model
            .exclusions()
            .iter()
            .map(|l| (l, ConstraintKind::Exclusion))
            .chain(model.errors().iter().map(|l| (l, ConstraintKind::Error)));

        for (list, kind) in lists {
            for tuple in list.tuples() {
                let selector = session.new_var().positive();
                let clause = guarded_forbid(session.encoding(), selector, list.involved(), tuple);
                session.add_clause(&clause);

                let negation = match kind {
                    ConstraintKind::Error => {
                        let negation = session.new_var().positive();
                        let clauses =
                            guarded_require(session.encoding(), negation, list.involved(), tuple);
                        session.add_clauses(&clauses);
                        Some(negation)
                    }
                    ConstraintKind::Exclusion => None,
                };

                constraints.push(ExpandedConstraint {
                    element: DiagnosisElement {
                        list: list.id(),
                        involved: list.involved().to_vec(),
                        values: tuple.clone(),
                    },
                    kind,
                    marked_as_correct: list.is_marked_as_correct(),
                    selector,
                    negation,
                });
            }
        }

        Self {
            session,
            constraints,
        }
    }

    pub fn constraints(&self) -> &[ExpandedConstraint] {
        &self.constraints
    }

    pub fn constraint(&self, index: usize) -> &ExpandedConstraint {
        &self.constraints[index]
    }

    pub fn selector(&self, index: usize) -> Lit {
        self.constraints[index].selector
    }

    /// Background literals plus the selectors of `enabled`.
    pub fn is_consistent(
        &mut self,
        background: &[Lit],
        enabled: &[usize],
    ) -> Result<bool, SolverError> {
        let mut assumptions = background.to_vec();
        assumptions.extend(enabled.iter().map(|&i| self.constraints[i].selector));
        self.session.solve_under(&assumptions)
    }

    pub fn elements(&self, indices: &[usize]) -> Vec<DiagnosisElement> {
        indices
            .iter()
            .map(|&i| self.constraints[i].element.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverweave_model::{TupleList, TupleListId};

    #[test]
    fn test_expands_one_constraint_per_tuple() {
        let exclusion =
            TupleList::new(TupleListId(1), vec![0, 1], vec![vec![0, 0], vec![0, 1]]).unwrap();
        let error = TupleList::new(TupleListId(2), vec![0], vec![vec![0]]).unwrap();
        let model = TestModel::new(1, vec![2, 2], vec![exclusion], vec![error]).unwrap();
        let conflict = ConflictModel::new(&model);
        assert_eq!(conflict.constraints().len(), 3);
        assert!(conflict.constraint(0).negation.is_none());
        assert_eq!(conflict.constraint(2).kind, ConstraintKind::Error);
        assert!(conflict.constraint(2).negation.is_some());
    }

    #[test]
    fn test_selectors_switch_constraints() {
        let exclusion =
            TupleList::new(TupleListId(1), vec![0, 1], vec![vec![0, 0], vec![0, 1]]).unwrap();
        let error = TupleList::new(TupleListId(2), vec![0], vec![vec![0]]).unwrap();
        let model = TestModel::new(1, vec![2, 2], vec![exclusion], vec![error]).unwrap();
        let mut conflict = ConflictModel::new(&model);
        let pinned = conflict.constraint(2).negation.unwrap();

        assert!(!conflict.is_consistent(&[pinned], &[0, 1]).unwrap());
        assert!(conflict.is_consistent(&[pinned], &[0]).unwrap());
        assert!(conflict.is_consistent(&[pinned], &[]).unwrap());
    }
}
