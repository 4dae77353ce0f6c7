//! Combining per-tuple diagnoses into hitting sets over all missing tuples.
//!
//! Every missing tuple contributes its candidate repairs: its diagnoses and,
//! unless its own error list is marked correct, dropping the tuple itself.
//! Candidates of all tuples are combined by pairwise union and reduced to the
//! subset-minimal results after every step.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use coverweave_model::TestModel;

use super::artifacts::{
    ConflictExplanation, DiagnosisElement, DiagnosisHittingSet, MissingInvalidTuple,
};
use super::ConflictError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HittingSetMode {
    /// Every subset-minimal hitting set.
    AllMinimal,
    /// Only the hitting sets of the smallest size.
    #[default]
    MinimumCardinality,
}

type ElementSet = BTreeSet<DiagnosisElement>;

pub fn minimal_hitting_sets(
    model: &TestModel,
    missing: &[MissingInvalidTuple],
    mode: HittingSetMode,
) -> Result<Vec<DiagnosisHittingSet>, ConflictError> {
    let mut combined: Option<Vec<ElementSet>> = None;

    for tuple in missing {
        let candidates = candidate_repairs(model, tuple)?;
        if candidates.is_empty() {
            warn!(
                list = %tuple.error_list,
                values = ?tuple.values,
                "missing tuple has no possible repair"
            );
            continue;
        }
        combined = Some(match combined {
            None => minimize(candidates),
            Some(previous) => {
                let unions: Vec<ElementSet> = previous
                    .iter()
                    .flat_map(|a| {
                        candidates
                            .iter()
                            .map(move |b| a.union(b).cloned().collect::<ElementSet>())
                    })
                    .collect();
                minimize(unions)
            }
        });
    }

    let mut sets = combined.unwrap_or_default();
    if mode == HittingSetMode::MinimumCardinality {
        if let Some(smallest) = sets.iter().map(BTreeSet::len).min() {
            sets.retain(|s| s.len() == smallest);
        }
    }
    sets.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    Ok(sets
        .into_iter()
        .map(|s| DiagnosisHittingSet {
            elements: s.into_iter().collect(),
        })
        .collect())
}

fn candidate_repairs(
    model: &TestModel,
    tuple: &MissingInvalidTuple,
) -> Result<Vec<ElementSet>, ConflictError> {
    let mut candidates: Vec<ElementSet> = match &tuple.explanation {
        ConflictExplanation::DiagnosisSets { diagnoses, .. } => diagnoses
            .iter()
            .map(|d| d.iter().cloned().collect())
            .collect(),
        ConflictExplanation::InconsistentBackground { .. } => Vec::new(),
        ConflictExplanation::ConflictSet { .. } | ConflictExplanation::Unknown => {
            return Err(ConflictError::DiagnosisUnavailable {
                list: tuple.error_list,
            });
        }
    };
    let own_list_correct = model
        .error_list(tuple.error_list)
        .map(|l| l.is_marked_as_correct())
        .unwrap_or(false);
    if !own_list_correct {
        candidates.push(BTreeSet::from([tuple.as_element()]));
    }
    Ok(candidates)
}

/// Deduplicate and drop every set that has a proper subset in `sets`.
fn minimize(sets: Vec<ElementSet>) -> Vec<ElementSet> {
    let unique: BTreeSet<ElementSet> = sets.into_iter().collect();
    unique
        .iter()
        .filter(|s| !unique.iter().any(|o| o != *s && o.is_subset(s)))
        .cloned()
        .collect()
}
