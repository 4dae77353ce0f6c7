//! Parameter combinations a newly added parameter must be covered with.

use coverweave_model::combinator::subsets;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CoverageStrategy {
    /// Every `(t-1)`-subset of the processed parameters plus the new one.
    #[default]
    TWise,
    /// The involved parameters of an error tuple list, every `(t-2)`-subset of
    /// the processed parameters outside it, and the new one. Each error tuple
    /// is thereby combined with every `(t-1)`-way combination of the other
    /// parameters.
    ///
    /// `involved` is sorted and `tuples` holds the error tuples to cover, with
    /// values in the order of `involved`. Other assignments of the involved
    /// parameters are no target.
    NegativeTWise {
        involved: Vec<usize>,
        tuples: Vec<Vec<u32>>,
    },
}

impl CoverageStrategy {
    /// Parameter combinations to cover when `parameter` joins `processed`.
    /// The new parameter is always last.
    pub fn parameter_combinations(
        &self,
        processed: &[usize],
        parameter: usize,
        strength: usize,
    ) -> Vec<Vec<usize>> {
        match self {
            CoverageStrategy::TWise => {
                if strength == 0 {
                    return Vec::new();
                }
                subsets(processed, strength - 1)
                    .into_iter()
                    .map(|mut combination| {
                        combination.push(parameter);
                        combination
                    })
                    .collect()
            }
            CoverageStrategy::NegativeTWise { involved, .. } => {
                if strength < 2 {
                    return Vec::new();
                }
                let others: Vec<usize> = processed
                    .iter()
                    .copied()
                    .filter(|p| !involved.contains(p))
                    .collect();
                subsets(&others, strength - 2)
                    .into_iter()
                    .map(|subset| {
                        let mut combination = involved.clone();
                        combination.extend(subset);
                        combination.sort_unstable();
                        combination.push(parameter);
                        combination
                    })
                    .collect()
            }
        }
    }
}

impl CoverageStrategy {
    /// The only value tuples of `positions` worth covering, when the strategy
    /// restricts them.
    pub fn restricted_tuples(&self, positions: &[usize]) -> Option<&[Vec<u32>]> {
        match self {
            CoverageStrategy::NegativeTWise { involved, tuples } if involved == positions => {
                Some(tuples)
            }
            _ => None,
        }
    }
}
