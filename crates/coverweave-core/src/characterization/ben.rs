//! BEN: ranking suspicious t-value combinations by the suspiciousness of
//! their components.
//!
//! Every t-value sub-combination of a failed input starts out suspicious and
//! every t-value sub-combination of a passed input is cleared. A *component*
//! is a single `(parameter, value)` pair; its suspiciousness mixes how often
//! it appears in failed inputs, in all inputs, and in suspicious combinations.
//! Each step takes the highest ranked suspicious combinations and completes
//! each with the least suspicious environment values into a new input that
//! satisfies the group's constraints.
//!
//! Failure-inducing combinations are reported smallest first, each size in
//! ranking order. Smaller combinations are found by reduction: a
//! `(k-1)`-value combination is suspicious when every k-value combination
//! extending it is.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use coverweave_explore::{ConstraintChecker, FaultCharacterizationConfig, NoConstraintChecker};
use coverweave_model::{Combination, TestResult};

use super::FaultCharacterizationAlgorithm;

const DEFAULT_INPUTS_PER_STEP: usize = 10;
const DEFAULT_MAX_GENERATION_ATTEMPTS: usize = 50;

type Component = (usize, u32);

pub struct Ben {
    config: Option<FaultCharacterizationConfig>,
    sizes: Vec<u32>,
    strength: usize,
    inputs_per_step: usize,
    max_generation_attempts: usize,
    results: BTreeMap<Combination, TestResult>,
    suspicious: BTreeSet<Combination>,
    previous_suspicious: usize,
    end_in_next_step: bool,
}

impl Ben {
    /// New inputs are checked against the constraints of the group.
    pub fn new(config: &FaultCharacterizationConfig) -> Self {
        let mut ben = Self::with_sizes(config.model.sizes().to_vec(), config.model.strength());
        ben.config = Some(config.clone());
        ben
    }

    /// Unconstrained instance over the given domains.
    pub fn with_sizes(sizes: Vec<u32>, strength: usize) -> Self {
        Self {
            config: None,
            sizes,
            strength: strength.max(1),
            inputs_per_step: DEFAULT_INPUTS_PER_STEP,
            max_generation_attempts: DEFAULT_MAX_GENERATION_ATTEMPTS,
            results: BTreeMap::new(),
            suspicious: BTreeSet::new(),
            previous_suspicious: 0,
            end_in_next_step: false,
        }
    }

    pub fn with_inputs_per_step(mut self, inputs_per_step: usize) -> Self {
        self.inputs_per_step = inputs_per_step.max(1);
        self
    }

    pub fn with_max_generation_attempts(mut self, attempts: usize) -> Self {
        self.max_generation_attempts = attempts.max(1);
        self
    }

    fn checker(&self) -> Box<dyn ConstraintChecker> {
        let Some(config) = &self.config else {
            return Box::new(NoConstraintChecker);
        };
        config.constraint_checker().unwrap_or_else(|error| {
            warn!(
                error = %error,
                group = %config.group,
                "no checker for group, inputs are unchecked"
            );
            Box::new(NoConstraintChecker)
        })
    }

    fn should_continue(&self) -> bool {
        self.suspicious.len() != self.previous_suspicious
            && !self.end_in_next_step
            && self.strength < self.sizes.len()
    }

    fn component_suspiciousness(
        &self,
        suspicious: &BTreeSet<Combination>,
    ) -> BTreeMap<Component, f64> {
        let mut in_failed: BTreeMap<Component, usize> = BTreeMap::new();
        let mut in_tests: BTreeMap<Component, usize> = BTreeMap::new();
        let mut in_suspicious: BTreeMap<Component, usize> = BTreeMap::new();
        let mut failed_inputs = 0usize;

        for (input, result) in &self.results {
            for component in components(input) {
                *in_tests.entry(component).or_default() += 1;
                if result.is_failure() {
                    *in_failed.entry(component).or_default() += 1;
                }
            }
            if result.is_failure() {
                failed_inputs += 1;
            }
        }
        for combination in suspicious {
            for component in components(combination) {
                *in_suspicious.entry(component).or_default() += 1;
            }
        }

        let mut suspiciousness = BTreeMap::new();
        for (parameter, &size) in self.sizes.iter().enumerate() {
            for value in 0..size {
                let component = (parameter, value);
                let failed = in_failed.get(&component).copied().unwrap_or(0);
                let tests = in_tests.get(&component).copied().unwrap_or(0);
                let combinations = in_suspicious.get(&component).copied().unwrap_or(0);
                let score = (ratio(failed, failed_inputs)
                    + ratio(failed, tests)
                    + ratio(combinations, suspicious.len()))
                    / 3.0;
                suspiciousness.insert(component, score);
            }
        }
        suspiciousness
    }

    /// Suspicious combinations ordered by the sum of their positions in two
    /// rankings: own components most suspicious first, and environment in the
    /// executed inputs least suspicious first.
    fn rank(
        &self,
        suspicious: &BTreeSet<Combination>,
        suspiciousness: &BTreeMap<Component, f64>,
    ) -> Vec<Combination> {
        let candidates: Vec<&Combination> = suspicious.iter().collect();

        let own: Vec<f64> = candidates
            .iter()
            .map(|c| average(components(c), suspiciousness))
            .collect();
        let environment: Vec<f64> = candidates
            .iter()
            .map(|c| self.minimum_environment_average(c, suspiciousness))
            .collect();

        let mut by_own: Vec<usize> = (0..candidates.len()).collect();
        by_own.sort_by(|&a, &b| own[b].total_cmp(&own[a]));
        let mut by_environment: Vec<usize> = (0..candidates.len()).collect();
        by_environment.sort_by(|&a, &b| environment[a].total_cmp(&environment[b]));

        let mut position = vec![0usize; candidates.len()];
        for (rank, &index) in by_own.iter().enumerate() {
            position[index] += rank;
        }
        for (rank, &index) in by_environment.iter().enumerate() {
            position[index] += rank;
        }

        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by_key(|&index| position[index]);
        order.into_iter().map(|i| candidates[i].clone()).collect()
    }

    fn minimum_environment_average(
        &self,
        combination: &Combination,
        suspiciousness: &BTreeMap<Component, f64>,
    ) -> f64 {
        self.results
            .keys()
            .filter(|input| input.contains(combination))
            .map(|input| {
                let environment = components(input).filter(|&(p, _)| !combination.is_set(p));
                average(environment, suspiciousness)
            })
            .fold(f64::MAX, f64::min)
    }

    /// Per parameter, its values from least to most suspicious.
    fn value_ranking(&self, suspiciousness: &BTreeMap<Component, f64>) -> Vec<Vec<u32>> {
        self.sizes
            .iter()
            .enumerate()
            .map(|(parameter, &size)| {
                let score =
                    |value: u32| suspiciousness.get(&(parameter, value)).copied().unwrap_or(0.0);
                let mut values: Vec<u32> = (0..size).collect();
                values.sort_by(|&a, &b| score(a).total_cmp(&score(b)));
                values
            })
            .collect()
    }

    /// An untested input containing `combination` that the checker accepts.
    ///
    /// Starts from the least suspicious environment and, while the candidate
    /// is tested or invalid, moves one environment parameter at a time (round
    /// robin) to its next value in the ranking.
    fn new_input_for(
        &self,
        combination: &Combination,
        ranking: &[Vec<u32>],
        checker: &mut dyn ConstraintChecker,
    ) -> Option<Combination> {
        let environment: Vec<usize> =
            (0..combination.len()).filter(|&p| !combination.is_set(p)).collect();
        let mut candidate = combination.clone();
        for &parameter in &environment {
            candidate.set(parameter, ranking[parameter][0]);
        }

        for attempt in 0..self.max_generation_attempts {
            if !self.results.contains_key(&candidate) && checker.is_valid(&candidate) {
                return Some(candidate);
            }
            if environment.is_empty() {
                return None;
            }
            let parameter = environment[attempt % environment.len()];
            let values = &ranking[parameter];
            let current = candidate.get(parameter)?;
            let index = values.iter().position(|&v| v == current)?;
            candidate.set(parameter, values[(index + 1) % values.len()]);
        }
        None
    }

    fn generate_next_inputs(&mut self) -> Vec<Combination> {
        let suspiciousness = self.component_suspiciousness(&self.suspicious);
        let ranked = self.rank(&self.suspicious, &suspiciousness);
        let ranking = self.value_ranking(&suspiciousness);
        let mut checker = self.checker();

        let mut next = Vec::new();
        for combination in ranked.iter().take(self.inputs_per_step) {
            match self.new_input_for(combination, &ranking, checker.as_mut()) {
                Some(input) => {
                    if !next.contains(&input) {
                        next.push(input);
                    }
                }
                None => {
                    debug!(
                        combination = %combination,
                        "no new input found, stopping after this step"
                    );
                    self.end_in_next_step = true;
                }
            }
        }
        next
    }

    fn relevant_sub_combinations(&self, input: &Combination) -> Vec<Combination> {
        input.sub_combinations_with_size(self.strength)
    }
}

impl FaultCharacterizationAlgorithm for Ben {
    fn name(&self) -> &str {
        "ben"
    }

    fn compute_next_test_inputs(
        &mut self,
        results: &BTreeMap<Combination, TestResult>,
    ) -> Vec<Combination> {
        let new: Vec<(&Combination, &TestResult)> = results
            .iter()
            .filter(|(input, _)| !self.results.contains_key(*input))
            .collect();
        if new.is_empty() {
            return Vec::new();
        }

        self.previous_suspicious = self.suspicious.len();
        if self.results.is_empty() {
            for (input, _) in new.iter().filter(|(_, r)| r.is_failure()) {
                let subs = self.relevant_sub_combinations(input);
                self.suspicious.extend(subs);
            }
        }
        for (input, _) in new.iter().filter(|(_, r)| r.is_success()) {
            for sub in self.relevant_sub_combinations(input) {
                self.suspicious.remove(&sub);
            }
        }
        for (input, result) in new {
            self.results.insert(input.clone(), result.clone());
        }

        if !self.should_continue() {
            return Vec::new();
        }
        self.generate_next_inputs()
    }

    fn compute_failure_inducing_combinations(&self) -> Vec<Combination> {
        let mut by_size = vec![self.suspicious.clone()];
        for _ in 1..self.strength {
            let Some(smallest) = by_size.last() else {
                break;
            };
            let reduced = reduce(&self.sizes, smallest);
            by_size.push(reduced);
        }

        by_size
            .iter()
            .rev()
            .filter(|set| !set.is_empty())
            .flat_map(|set| self.rank(set, &self.component_suspiciousness(set)))
            .collect()
    }
}

/// The `(k-1)`-value combinations all of whose one-parameter extensions are
/// among the given k-value `combinations`.
pub fn reduce(sizes: &[u32], combinations: &BTreeSet<Combination>) -> BTreeSet<Combination> {
    let mut extensions: BTreeMap<Combination, usize> = BTreeMap::new();
    for combination in combinations {
        for position in combination.assigned_positions() {
            let mut smaller = combination.clone();
            smaller.clear(position);
            *extensions.entry(smaller).or_default() += 1;
        }
    }
    extensions
        .into_iter()
        .filter(|(smaller, count)| {
            let possible: usize = (0..sizes.len())
                .filter(|&p| !smaller.is_set(p))
                .map(|p| sizes[p] as usize)
                .sum();
            *count == possible
        })
        .map(|(smaller, _)| smaller)
        .collect()
}

fn components(combination: &Combination) -> impl Iterator<Item = Component> + '_ {
    combination
        .assigned_positions()
        .filter_map(move |p| combination.get(p).map(|v| (p, v)))
}

fn average(components: impl Iterator<Item = Component>, scores: &BTreeMap<Component, f64>) -> f64 {
    let (sum, count) = components.fold((0.0, 0usize), |(sum, count), component| {
        (sum + scores.get(&component).copied().unwrap_or(0.0), count + 1)
    });
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn ratio(value: usize, divisor: usize) -> f64 {
    match divisor {
        0 => 0.0,
        _ => value as f64 / divisor as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use coverweave_explore::GroupId;
    use coverweave_model::{TestModel, TupleList, TupleListId, WILDCARD};

    fn fails(c: &Combination) -> bool {
        c.get(1) == Some(0) && c.get(2) == Some(1)
    }

    /// Runs `algorithm` until it stops asking, returning the requested inputs.
    fn characterize(algorithm: &mut Ben, initial: &[Vec<u32>]) -> Vec<Combination> {
        let execute = |c: &Combination| {
            if fails(c) {
                TestResult::failure("boom")
            } else {
                TestResult::Success
            }
        };
        let mut results: BTreeMap<Combination, TestResult> = initial
            .iter()
            .map(|v| {
                let c = Combination::from(v.clone());
                let r = execute(&c);
                (c, r)
            })
            .collect();
        let mut requested = Vec::new();
        loop {
            let next = algorithm.compute_next_test_inputs(&results);
            if next.is_empty() {
                break;
            }
            for input in next {
                assert!(!results.contains_key(&input), "re-requested {input}");
                let r = execute(&input);
                results.insert(input.clone(), r);
                requested.push(input);
            }
        }
        requested
    }

    const INITIAL: [[u32; 4]; 4] = [[0, 0, 0, 0], [1, 0, 1, 1], [0, 1, 1, 0], [1, 1, 0, 1]];

    fn initial() -> Vec<Vec<u32>> {
        INITIAL.iter().map(|row| row.to_vec()).collect()
    }

    #[test]
    fn test_isolates_two_parameter_cause() {
        let mut algorithm = Ben::with_sizes(vec![2, 2, 2, 2], 2);
        let requested = characterize(&mut algorithm, &initial());
        // One input per suspicious pair, then one more for the remaining cause.
        let mut first_step = requested[..5].to_vec();
        first_step.sort();
        assert_eq!(
            first_step,
            vec![
                Combination::from(vec![0, 0, 0, 1]),
                Combination::from(vec![0, 0, 1, 0]),
                Combination::from(vec![0, 1, 1, 1]),
                Combination::from(vec![1, 0, 0, 0]),
                Combination::from(vec![1, 1, 1, 0]),
            ]
        );
        assert_eq!(requested[5..], [Combination::from(vec![1, 0, 1, 0])]);
        assert_eq!(
            algorithm.compute_failure_inducing_combinations(),
            vec![Combination::from(vec![WILDCARD, 0, 1, WILDCARD])]
        );
    }

    #[test]
    fn test_new_inputs_respect_group_constraints() {
        let exclusion = TupleList::new(TupleListId(1), vec![0, 3], vec![vec![1, 0]]).unwrap();
        let model =
            Arc::new(TestModel::new(2, vec![2, 2, 2, 2], vec![exclusion.clone()], vec![]).unwrap());
        let config =
            FaultCharacterizationConfig::new(model, GroupId::Named("positive".into()), None);
        let mut algorithm = Ben::new(&config);

        let requested = characterize(&mut algorithm, &initial());
        assert!(!requested.is_empty());
        assert!(requested.iter().all(|c| !exclusion.matches(c)));
        assert!(algorithm
            .compute_failure_inducing_combinations()
            .contains(&Combination::from(vec![WILDCARD, 0, 1, WILDCARD])));
    }

    #[test]
    fn test_strength_covering_all_parameters_requests_nothing() {
        let mut algorithm = Ben::with_sizes(vec![2, 2], 2);
        let results =
            BTreeMap::from([(Combination::from(vec![0, 1]), TestResult::failure("boom"))]);
        assert!(algorithm.compute_next_test_inputs(&results).is_empty());
        assert_eq!(
            algorithm.compute_failure_inducing_combinations(),
            vec![Combination::from(vec![0, 1])]
        );
    }

    #[test]
    fn test_reduce_finds_fully_suspicious_smaller_combination() {
        let suspicious: BTreeSet<Combination> = [
            vec![0, 0, WILDCARD],
            vec![0, 1, WILDCARD],
            vec![0, WILDCARD, 0],
            vec![0, WILDCARD, 1],
            vec![1, 1, WILDCARD],
        ]
        .into_iter()
        .map(Combination::from)
        .collect();
        let reduced = reduce(&[2, 2, 2], &suspicious);
        assert_eq!(
            reduced.into_iter().collect::<Vec<_>>(),
            vec![Combination::from(vec![0, WILDCARD, WILDCARD])]
        );
    }

    #[test]
    fn test_single_value_cause_is_reported_before_pairs() {
        let mut algorithm = Ben::with_sizes(vec![2, 2, 2], 2);
        // Only p0=0 fails: every pair containing it stays suspicious.
        let results: BTreeMap<Combination, TestResult> = [
            (vec![0, 0, 0], TestResult::failure("boom")),
            (vec![0, 1, 1], TestResult::failure("boom")),
            (vec![1, 0, 1], TestResult::Success),
            (vec![1, 1, 0], TestResult::Success),
        ]
        .into_iter()
        .map(|(c, r)| (Combination::from(c), r))
        .collect();
        algorithm.compute_next_test_inputs(&results);
        let fics = algorithm.compute_failure_inducing_combinations();
        assert_eq!(fics[0], Combination::from(vec![0, WILDCARD, WILDCARD]));
        assert!(fics[1..].iter().all(|c| c.assigned_positions().count() == 2));
    }
}
