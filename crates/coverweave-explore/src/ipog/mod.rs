//! IPOG covering array generation.
//!
//! Starting from the cartesian product of the initial parameters, every
//! further parameter is added in two phases:
//! - **horizontal**: each existing row, in index order, receives the valid
//!   value covering the most uncovered tuples (lowest value on ties); rows
//!   without any gain keep the position open
//! - **vertical**: each still uncovered tuple is merged into the first row it
//!   fits without breaking validity, or appended as a new row
//!
//! A negative coverage target only counts the given error tuples on its
//! involved parameters; they also seed the initial rows.
//!
//! Open positions are finally filled with the lowest value that keeps the
//! row valid. Tuples the checker rejects are counted as uncoverable.
//!
//! Invariant: every emitted row is full and accepted by the checker.

pub mod combinations;
pub mod coverage;
pub mod order;

use tracing::{debug, warn};

use coverweave_model::combinator::cartesian_product;
use coverweave_model::{Combination, Report, ReportArgument, ReportLevel, Reporter, TestModel};

use crate::checker::ConstraintChecker;

pub use combinations::CoverageStrategy;
pub use coverage::CoverageMap;
pub use order::{OrderedParameters, ParameterOrder};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpogConfig {
    pub order: ParameterOrder,
    pub coverage: CoverageStrategy,
}

/// Output of one IPOG run.
#[derive(Debug, Clone, Default)]
pub struct IpogResult {
    /// Full test inputs.
    pub rows: Vec<Combination>,
    /// Target tuples the constraints make impossible to cover.
    pub uncoverable: usize,
}

pub struct IpogAlgorithm<'a> {
    model: &'a TestModel,
    checker: &'a mut dyn ConstraintChecker,
    config: IpogConfig,
    reporter: &'a dyn Reporter,
}

impl<'a> IpogAlgorithm<'a> {
    pub fn new(
        model: &'a TestModel,
        checker: &'a mut dyn ConstraintChecker,
        config: IpogConfig,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            model,
            checker,
            config,
            reporter,
        }
    }

    pub fn generate(mut self) -> IpogResult {
        let n = self.model.parameter_count();
        let strength = self.model.strength();
        let OrderedParameters { initial, remaining } = self.config.order.order(n, strength);

        let mut rows = self.initial_rows(&initial);
        let mut uncoverable = 0;
        let mut processed = initial;

        for parameter in remaining {
            let combinations =
                self.config
                    .coverage
                    .parameter_combinations(&processed, parameter, strength);
            if !combinations.is_empty() {
                let mut map = CoverageMap::new(combinations, parameter, self.model.sizes());
                if let CoverageStrategy::NegativeTWise { involved, tuples } =
                    &self.config.coverage
                {
                    map.restrict_to(involved, tuples);
                }
                self.extend_horizontally(&mut rows, &mut map);
                uncoverable += self.extend_vertically(&mut rows, &mut map);
                debug!(parameter, rows = rows.len(), "parameter added");
            }
            processed.push(parameter);
        }

        let rows = self.fill_wildcards(rows);
        IpogResult { rows, uncoverable }
    }

    fn initial_rows(&mut self, initial: &[usize]) -> Vec<Combination> {
        let n = self.model.parameter_count();
        let tuples = match self.config.coverage.restricted_tuples(initial) {
            Some(tuples) => tuples.to_vec(),
            None => {
                let sizes: Vec<u32> = initial.iter().map(|&p| self.model.size(p)).collect();
                cartesian_product(&sizes)
            }
        };
        tuples
            .into_iter()
            .map(|tuple| Combination::from_tuple(n, initial, &tuple))
            .filter(|row| self.checker.is_valid(row))
            .collect()
    }

    fn extend_horizontally(&mut self, rows: &mut [Combination], map: &mut CoverageMap) {
        let parameter = map.parameter();
        let size = self.model.size(parameter);
        for row in rows.iter_mut() {
            if !map.has_uncovered() {
                return;
            }
            let gains = map.gains(row, size);
            let mut candidates: Vec<u32> = (0..size).filter(|&v| gains[v as usize] > 0).collect();
            candidates.sort_by(|a, b| gains[*b as usize].cmp(&gains[*a as usize]).then(a.cmp(b)));
            for value in candidates {
                if self.checker.is_extension_valid(row, parameter, value) {
                    row.set(parameter, value);
                    map.mark_covered(row);
                    break;
                }
            }
        }
    }

    fn extend_vertically(&mut self, rows: &mut Vec<Combination>, map: &mut CoverageMap) -> usize {
        let mut uncoverable = 0;
        while let Some(tuple) = map.take_uncovered() {
            if !self.checker.is_valid(&tuple) {
                uncoverable += 1;
                warn!(tuple = %tuple, "tuple cannot be covered under the constraints");
                self.reporter.report_with(ReportLevel::Debug, &|| {
                    Report::new(
                        "tuple {0} cannot be covered under the constraints",
                        vec![ReportArgument::Combination(tuple.clone())],
                    )
                });
                continue;
            }

            let mut placed = None;
            for (index, row) in rows.iter_mut().enumerate() {
                let Some(merged) = row.merge(&tuple) else {
                    continue;
                };
                if merged == *row || self.checker.is_valid(&merged) {
                    *row = merged;
                    placed = Some(index);
                    break;
                }
            }
            match placed {
                // The merge may have completed further tuples in that row.
                Some(index) => map.mark_covered(&rows[index]),
                None => {
                    map.mark_covered(&tuple);
                    rows.push(tuple);
                }
            }
        }
        uncoverable
    }

    fn fill_wildcards(&mut self, rows: Vec<Combination>) -> Vec<Combination> {
        let mut filled = Vec::with_capacity(rows.len());
        'rows: for mut row in rows {
            for parameter in 0..row.len() {
                if row.is_set(parameter) {
                    continue;
                }
                let value = (0..self.model.size(parameter))
                    .find(|&v| self.checker.is_extension_valid(&row, parameter, v));
                match value {
                    Some(v) => row.set(parameter, v),
                    None => {
                        warn!(row = %row, parameter, "row cannot be completed, dropping it");
                        continue 'rows;
                    }
                }
            }
            filled.push(row);
        }
        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{HardConstraintChecker, NegatedConstraintChecker, NoConstraintChecker};
    use coverweave_model::combinator::{cartesian_product, subsets};
    use coverweave_model::{NoopReporter, TupleList, TupleListId};

    fn run(model: &TestModel, checker: &mut dyn ConstraintChecker) -> IpogResult {
        IpogAlgorithm::new(model, checker, IpogConfig::default(), &NoopReporter).generate()
    }

    fn covers_all_tuples(model: &TestModel, rows: &[Combination]) -> bool {
        let positions: Vec<usize> = (0..model.parameter_count()).collect();
        subsets(&positions, model.strength()).iter().all(|params| {
            let sizes: Vec<u32> = params.iter().map(|&p| model.size(p)).collect();
            cartesian_product(&sizes)
                .iter()
                .all(|tuple| rows.iter().any(|r| r.matches(params, tuple)))
        })
    }

    #[test]
    fn test_three_boolean_parameters_pairwise() {
        let model = TestModel::unconstrained(2, vec![2, 2, 2]).unwrap();
        let result = run(&model, &mut NoConstraintChecker);
        assert_eq!(result.rows.len(), 4);
        assert!(result.rows.iter().all(Combination::is_full));
        assert!(covers_all_tuples(&model, &result.rows));
        assert_eq!(result.uncoverable, 0);
    }

    #[test]
    fn test_mixed_sizes_pairwise() {
        let model = TestModel::unconstrained(2, vec![3, 2, 4, 2, 3]).unwrap();
        let result = run(&model, &mut NoConstraintChecker);
        assert!(covers_all_tuples(&model, &result.rows));
        // Lower bound is the product of the two largest domains.
        assert!(result.rows.len() >= 12);
    }

    #[test]
    fn test_strength_three() {
        let model = TestModel::unconstrained(3, vec![2, 2, 2, 2, 2]).unwrap();
        let result = run(&model, &mut NoConstraintChecker);
        assert!(covers_all_tuples(&model, &result.rows));
        assert!(result.rows.len() >= 8);
    }

    #[test]
    fn test_strength_one_uses_largest_domain() {
        let model = TestModel::unconstrained(1, vec![2, 4, 3]).unwrap();
        let result = run(&model, &mut NoConstraintChecker);
        assert_eq!(result.rows.len(), 4);
        assert!(covers_all_tuples(&model, &result.rows));
    }

    #[test]
    fn test_strength_equals_parameter_count_is_cartesian_product() {
        let model = TestModel::unconstrained(2, vec![2, 3]).unwrap();
        let result = run(&model, &mut NoConstraintChecker);
        assert_eq!(result.rows.len(), 6);
    }

    #[test]
    fn test_respects_exclusions_and_counts_uncoverable() {
        let exclusion =
            TupleList::new(TupleListId(1), vec![0, 1], vec![vec![0, 0], vec![1, 1]]).unwrap();
        let model = TestModel::new(2, vec![2, 2, 2], vec![exclusion.clone()], vec![]).unwrap();
        let mut checker = HardConstraintChecker::positive(&model);
        let result = run(&model, &mut checker);
        assert!(result.rows.iter().all(|r| !exclusion.matches(r)));
        assert_eq!(result.uncoverable, 0);
        for (p, q) in [(0usize, 2usize), (1, 2)] {
            for a in 0..2 {
                for b in 0..2 {
                    assert!(result.rows.iter().any(|r| r.matches(&[p, q], &[a, b])));
                }
            }
        }
    }

    #[test]
    fn test_implicitly_forbidden_tuples_are_uncoverable() {
        // p0=0 excludes every p1 value, so no pair with p0=0 can appear.
        let exclusion =
            TupleList::new(TupleListId(1), vec![0, 1], vec![vec![0, 0], vec![0, 1]]).unwrap();
        let model = TestModel::new(2, vec![2, 2, 2], vec![exclusion], vec![]).unwrap();
        let mut checker = HardConstraintChecker::positive(&model);
        let result = run(&model, &mut checker);
        assert!(result.rows.iter().all(|r| r.get(0) == Some(1)));
        assert_eq!(result.uncoverable, 2);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let model = TestModel::unconstrained(2, vec![3, 3, 3, 3]).unwrap();
        let a = run(&model, &mut NoConstraintChecker);
        let b = run(&model, &mut NoConstraintChecker);
        assert_eq!(a.rows, b.rows);
    }

    fn negative_run(model: &TestModel, negated: TupleListId) -> IpogResult {
        let mut checker = NegatedConstraintChecker::new(model, negated).unwrap();
        let list = checker.negated().clone();
        let tuples: Vec<Vec<u32>> = checker.realizable_tuples().map(<[u32]>::to_vec).collect();
        let config = IpogConfig {
            order: ParameterOrder::NegativityAware {
                involved: list.involved().to_vec(),
            },
            coverage: CoverageStrategy::NegativeTWise {
                involved: list.involved().to_vec(),
                tuples,
            },
        };
        IpogAlgorithm::new(model, &mut checker, config, &NoopReporter).generate()
    }

    #[test]
    fn test_negative_generation_reports_nothing_uncoverable() {
        let error = TupleList::new(TupleListId(1), vec![0, 1], vec![vec![0, 0]]).unwrap();
        let model = TestModel::new(2, vec![2, 2, 2, 2], vec![], vec![error]).unwrap();
        let result = negative_run(&model, TupleListId(1));
        assert_eq!(
            result.rows,
            vec![Combination::from(vec![0, 0, 0, 0]), Combination::from(vec![0, 0, 1, 1])]
        );
        assert_eq!(result.uncoverable, 0);
    }

    #[test]
    fn test_negative_rows_seeded_from_error_tuples_of_wide_parameters() {
        let error = TupleList::new(TupleListId(1), vec![0, 1, 2], vec![vec![3, 4, 5]]).unwrap();
        let model = TestModel::new(2, vec![50, 50, 50, 2], vec![], vec![error]).unwrap();
        let result = negative_run(&model, TupleListId(1));
        assert_eq!(
            result.rows,
            vec![Combination::from(vec![3, 4, 5, 0]), Combination::from(vec![3, 4, 5, 1])]
        );
        assert_eq!(result.uncoverable, 0);
    }
}
