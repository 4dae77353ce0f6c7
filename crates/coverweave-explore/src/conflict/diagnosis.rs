//! Minimal diagnoses by breadth-first hitting set tree.
//!
//! A diagnosis is a set of relaxable constraints whose removal makes the
//! background consistent with the rest. Each tree node removes the
//! constraints on its path; an inconsistent node is expanded by the members
//! of a fresh minimal conflict. Breadth-first order visits smaller paths
//! first, so supersets of known diagnoses are pruned on sight.

use std::collections::{BTreeSet, HashSet, VecDeque};

use varisat::Lit;

use crate::solver::SolverError;

use super::explain::{quick_xplain, Explanation};
use super::model::ConflictModel;

pub fn diagnose(
    model: &mut ConflictModel,
    background: &[Lit],
    relaxable: &[usize],
    root_conflict: &[usize],
) -> Result<Vec<Vec<usize>>, SolverError> {
    let mut diagnoses: Vec<BTreeSet<usize>> = Vec::new();
    let mut visited: HashSet<BTreeSet<usize>> = HashSet::new();
    let mut queue: VecDeque<BTreeSet<usize>> = root_conflict
        .iter()
        .map(|&c| BTreeSet::from([c]))
        .collect();

    while let Some(path) = queue.pop_front() {
        if !visited.insert(path.clone()) {
            continue;
        }
        if diagnoses.iter().any(|d| d.is_subset(&path)) {
            continue;
        }
        let remaining: Vec<usize> = relaxable
            .iter()
            .copied()
            .filter(|c| !path.contains(c))
            .collect();
        match quick_xplain(model, background, &remaining)? {
            Explanation::Consistent => diagnoses.push(path),
            Explanation::Conflict(conflict) => {
                for c in conflict {
                    let mut next = path.clone();
                    next.insert(c);
                    queue.push_back(next);
                }
            }
            Explanation::InconsistentBackground => {}
        }
    }

    let mut minimal: Vec<Vec<usize>> = diagnoses
        .iter()
        .filter(|d| !diagnoses.iter().any(|o| o != *d && o.is_subset(d)))
        .map(|d| d.iter().copied().collect())
        .collect();
    minimal.sort();
    Ok(minimal)
}
