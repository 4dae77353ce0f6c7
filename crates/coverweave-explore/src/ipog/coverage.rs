//! Coverage bookkeeping for one IPOG extension step.
//!
//! Each parameter combination owns a flat coverage vector indexed by the
//! mixed-radix encoding of its value tuple (last parameter varies fastest).
//! The parameter being added is always last in every combination, so the
//! gains of all its values for a row share one base index.

use coverweave_model::Combination;

#[derive(Debug, Clone)]
struct CombinationCoverage {
    parameters: Vec<usize>,
    sizes: Vec<u32>,
    multipliers: Vec<usize>,
    covered: Vec<bool>,
}

impl CombinationCoverage {
    fn new(parameters: Vec<usize>, model_sizes: &[u32]) -> Self {
        let sizes: Vec<u32> = parameters.iter().map(|&p| model_sizes[p]).collect();
        let mut multipliers = vec![1usize; sizes.len()];
        for i in (0..sizes.len().saturating_sub(1)).rev() {
            multipliers[i] = multipliers[i + 1] * sizes[i + 1] as usize;
        }
        let total = sizes.iter().map(|&s| s as usize).product();
        Self {
            parameters,
            sizes,
            multipliers,
            covered: vec![false; total],
        }
    }

    /// Index of the tuple `row` assigns to these parameters, if fully assigned.
    fn index_of(&self, row: &Combination) -> Option<usize> {
        self.parameters
            .iter()
            .zip(&self.multipliers)
            .try_fold(0usize, |acc, (&p, &m)| row.get(p).map(|v| acc + v as usize * m))
    }

    fn value_at(&self, index: usize, position: usize) -> u32 {
        ((index / self.multipliers[position]) % self.sizes[position] as usize) as u32
    }

    fn tuple_at(&self, index: usize, parameter_count: usize) -> Combination {
        let mut combination = Combination::empty(parameter_count);
        for ((&p, &m), &size) in self.parameters.iter().zip(&self.multipliers).zip(&self.sizes) {
            combination.set(p, ((index / m) % size as usize) as u32);
        }
        combination
    }
}

/// Uncovered tuples of all parameter combinations for one new parameter.
#[derive(Debug, Clone)]
pub struct CoverageMap {
    parameter: usize,
    parameter_count: usize,
    combinations: Vec<CombinationCoverage>,
    uncovered: usize,
    cursor: (usize, usize),
}

impl CoverageMap {
    /// `combinations` must each end with `parameter`.
    pub fn new(combinations: Vec<Vec<usize>>, parameter: usize, sizes: &[u32]) -> Self {
        debug_assert!(combinations.iter().all(|c| c.last() == Some(&parameter)));
        let combinations: Vec<CombinationCoverage> = combinations
            .into_iter()
            .map(|c| CombinationCoverage::new(c, sizes))
            .collect();
        let uncovered = combinations.iter().map(|c| c.covered.len()).sum();
        Self {
            parameter,
            parameter_count: sizes.len(),
            combinations,
            uncovered,
            cursor: (0, 0),
        }
    }

    /// Drop every target tuple that assigns all of `involved` but none of
    /// `tuples` (given in the order of `involved`). Dropped tuples are neither
    /// covered nor uncoverable.
    pub fn restrict_to(&mut self, involved: &[usize], tuples: &[Vec<u32>]) {
        for coverage in &mut self.combinations {
            let Some(positions) = involved
                .iter()
                .map(|p| coverage.parameters.iter().position(|q| q == p))
                .collect::<Option<Vec<usize>>>()
            else {
                continue;
            };
            for index in 0..coverage.covered.len() {
                if coverage.covered[index] {
                    continue;
                }
                let wanted = tuples.iter().any(|tuple| {
                    positions
                        .iter()
                        .zip(tuple)
                        .all(|(&position, &value)| coverage.value_at(index, position) == value)
                });
                if !wanted {
                    coverage.covered[index] = true;
                    self.uncovered -= 1;
                }
            }
        }
    }

    pub fn uncovered_count(&self) -> usize {
        self.uncovered
    }

    pub fn has_uncovered(&self) -> bool {
        self.uncovered > 0
    }

    /// For every value of the new parameter, the number of uncovered tuples
    /// `row` would cover with it.
    pub fn gains(&self, row: &Combination, size: u32) -> Vec<usize> {
        let mut gains = vec![0usize; size as usize];
        for coverage in &self.combinations {
            let others = coverage.parameters.len() - 1;
            let base = coverage.parameters[..others]
                .iter()
                .zip(&coverage.multipliers)
                .try_fold(0usize, |acc, (&p, &m)| row.get(p).map(|v| acc + v as usize * m));
            let Some(base) = base else {
                continue;
            };
            // The new parameter is last, so its multiplier is 1.
            for (value, gain) in gains.iter_mut().enumerate() {
                if !coverage.covered[base + value] {
                    *gain += 1;
                }
            }
        }
        gains
    }

    /// Mark every tuple fully assigned by `row` as covered.
    pub fn mark_covered(&mut self, row: &Combination) {
        for coverage in &mut self.combinations {
            if let Some(index) = coverage.index_of(row) {
                if !coverage.covered[index] {
                    coverage.covered[index] = true;
                    self.uncovered -= 1;
                }
            }
        }
    }

    /// Next uncovered tuple as a partial combination, marking it covered.
    ///
    /// Callers either place the tuple in a row or record it as uncoverable, so
    /// each tuple is handed out once.
    pub fn take_uncovered(&mut self) -> Option<Combination> {
        while self.cursor.0 < self.combinations.len() {
            let coverage = &mut self.combinations[self.cursor.0];
            while self.cursor.1 < coverage.covered.len() {
                let index = self.cursor.1;
                self.cursor.1 += 1;
                if !coverage.covered[index] {
                    coverage.covered[index] = true;
                    self.uncovered -= 1;
                    return Some(coverage.tuple_at(index, self.parameter_count));
                }
            }
            self.cursor = (self.cursor.0 + 1, 0);
        }
        None
    }

    pub fn parameter(&self) -> usize {
        self.parameter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverweave_model::WILDCARD;

    #[test]
    fn test_counts_all_tuples() {
        let map = CoverageMap::new(vec![vec![0, 2], vec![1, 2]], 2, &[2, 3, 2]);
        assert_eq!(map.uncovered_count(), 4 + 6);
    }

    #[test]
    fn test_gains_and_marking() {
        let mut map = CoverageMap::new(vec![vec![0, 2], vec![1, 2]], 2, &[2, 2, 2]);
        let row = Combination::from(vec![0, 0, WILDCARD]);
        assert_eq!(map.gains(&row, 2), vec![2, 2]);

        map.mark_covered(&row.with(2, 0));
        assert_eq!(map.gains(&row, 2), vec![0, 2]);
        assert_eq!(map.uncovered_count(), 6);

        let partial = Combination::from(vec![1, WILDCARD, WILDCARD]);
        assert_eq!(map.gains(&partial, 2), vec![1, 1]);
    }

    #[test]
    fn test_take_uncovered_in_order() {
        let mut map = CoverageMap::new(vec![vec![0, 1]], 1, &[2, 2]);
        map.mark_covered(&Combination::from(vec![0, 0]));
        assert_eq!(map.take_uncovered(), Some(Combination::from(vec![0, 1])));
        assert_eq!(map.take_uncovered(), Some(Combination::from(vec![1, 0])));
        assert_eq!(map.take_uncovered(), Some(Combination::from(vec![1, 1])));
        assert_eq!(map.take_uncovered(), None);
        assert!(!map.has_uncovered());
    }

    #[test]
    fn test_restriction_drops_other_involved_assignments() {
        let mut map = CoverageMap::new(vec![vec![0, 1, 2], vec![1, 2]], 2, &[2, 2, 2]);
        map.restrict_to(&[0, 1], &[vec![0, 1]]);
        // [0, 1] keeps its two cells, [1, 2] does not assign p0 and is kept whole.
        assert_eq!(map.uncovered_count(), 2 + 4);
        assert_eq!(map.take_uncovered(), Some(Combination::from(vec![0, 1, 0])));
        assert_eq!(map.take_uncovered(), Some(Combination::from(vec![0, 1, 1])));
    }

    #[test]
    fn test_tuple_decoding_leaves_other_positions_open() {
        let mut map = CoverageMap::new(vec![vec![1, 3]], 3, &[2, 3, 2, 2]);
        let first = map.take_uncovered().unwrap();
        assert_eq!(first.values(), &[WILDCARD, 0, WILDCARD, 0]);
    }
}
