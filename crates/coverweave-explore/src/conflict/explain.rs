//! Minimal conflict extraction (QuickXplain).
//!
//! Given background literals that always hold and a list of relaxable
//! constraints, finds a subset-minimal set of relaxable constraints that is
//! inconsistent together with the background. Splits the candidates in
//! halves and recurses, so a conflict of size `k` among `n` candidates takes
//! `O(k log(n / k))` consistency checks.

use varisat::Lit;

use crate::solver::SolverError;

use super::model::ConflictModel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Explanation {
    /// Background and every relaxable constraint are satisfiable together.
    Consistent,
    /// The background alone is unsatisfiable.
    InconsistentBackground,
    /// Indices of a minimal conflicting subset of the relaxable constraints.
    Conflict(Vec<usize>),
}

pub fn quick_xplain(
    model: &mut ConflictModel,
    background: &[Lit],
    relaxable: &[usize],
) -> Result<Explanation, SolverError> {
    if model.is_consistent(background, relaxable)? {
        return Ok(Explanation::Consistent);
    }
    if !model.is_consistent(background, &[])? {
        return Ok(Explanation::InconsistentBackground);
    }
    let mut conflict = explain(model, background, &[], false, relaxable)?;
    conflict.sort_unstable();
    Ok(Explanation::Conflict(conflict))
}

/// `enabled` are relaxable constraints moved into the background so far;
/// `delta_added` is whether the last step added any.
fn explain(
    model: &mut ConflictModel,
    background: &[Lit],
    enabled: &[usize],
    delta_added: bool,
    candidates: &[usize],
) -> Result<Vec<usize>, SolverError> {
    if delta_added && !model.is_consistent(background, enabled)? {
        return Ok(Vec::new());
    }
    if candidates.len() == 1 {
        return Ok(candidates.to_vec());
    }

    let (first, second) = candidates.split_at(candidates.len() / 2);

    let with_first: Vec<usize> = enabled.iter().chain(first).copied().collect();
    let delta_second = explain(model, background, &with_first, !first.is_empty(), second)?;

    let with_delta: Vec<usize> = enabled.iter().chain(&delta_second).copied().collect();
    let delta_first = explain(model, background, &with_delta, !delta_second.is_empty(), first)?;

    let mut conflict = delta_first;
    conflict.extend(delta_second);
    Ok(conflict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverweave_model::{TestModel, TupleList, TupleListId};

    /// Error p0=0 against exclusions: (0,0) and (0,1) on p0,p1 plus an
    /// unrelated (1,1) on p1,p2.
    fn fixture() -> (ConflictModel, Lit) {
        let exclusions = vec![
            TupleList::new(TupleListId(1), vec![1, 2], vec![vec![1, 1]]).unwrap(),
            TupleList::new(TupleListId(2), vec![0, 1], vec![vec![0, 0], vec![0, 1]]).unwrap(),
        ];
        let errors = vec![TupleList::new(TupleListId(3), vec![0], vec![vec![0]]).unwrap()];
        let model = TestModel::new(1, vec![2, 2, 2], exclusions, errors).unwrap();
        let conflict = ConflictModel::new(&model);
        let pinned = conflict.constraint(3).negation.unwrap();
        (conflict, pinned)
    }

    #[test]
    fn test_finds_minimal_conflict() {
        let (mut model, pinned) = fixture();
        let result = quick_xplain(&mut model, &[pinned], &[0, 1, 2]).unwrap();
        assert_eq!(result, Explanation::Conflict(vec![1, 2]));
    }

    #[test]
    fn test_consistent_when_relaxed() {
        let (mut model, pinned) = fixture();
        let result = quick_xplain(&mut model, &[pinned], &[0, 1]).unwrap();
        assert_eq!(result, Explanation::Consistent);
    }

    #[test]
    fn test_inconsistent_background() {
        let (mut model, pinned) = fixture();
        let s1 = model.selector(1);
        let s2 = model.selector(2);
        let result = quick_xplain(&mut model, &[pinned, s1, s2], &[0]).unwrap();
        assert_eq!(result, Explanation::InconsistentBackground);
    }
}
