//! Iterative adaptive interaction fault localization.
//!
//! Every sub-combination of a failed input starts out suspicious, and every
//! sub-combination of a passed input is cleared. Each iteration mutates the
//! failed inputs one parameter at a time, using a different replacement
//! value per iteration, until the suspicious set stops shrinking, falls to
//! the threshold, or the iteration count reaches the parameter count.
//!
//! Suspicious combinations are bounded in size: by the testing strength when
//! built from a group, otherwise by [`DEFAULT_MAX_SUSPICIOUS_SIZE`].

use std::collections::{BTreeMap, BTreeSet};

use coverweave_explore::FaultCharacterizationConfig;
use coverweave_model::{Combination, TestResult};

use super::{other_value, FaultCharacterizationAlgorithm};

const DEFAULT_SUSPICIOUS_THRESHOLD: usize = 1;
pub const DEFAULT_MAX_SUSPICIOUS_SIZE: usize = 3;

pub struct IterAifl {
    sizes: Vec<u32>,
    threshold: usize,
    max_size: usize,
    iteration: u32,
    results: BTreeMap<Combination, TestResult>,
    failed: Vec<Combination>,
    suspicious: BTreeSet<Combination>,
    previous_suspicious: usize,
}

impl IterAifl {
    pub fn new(config: &FaultCharacterizationConfig) -> Self {
        Self::with_sizes(config.model.sizes().to_vec()).with_max_size(config.model.strength())
    }

    pub fn with_sizes(sizes: Vec<u32>) -> Self {
        Self {
            sizes,
            threshold: DEFAULT_SUSPICIOUS_THRESHOLD,
            max_size: DEFAULT_MAX_SUSPICIOUS_SIZE,
            iteration: 0,
            results: BTreeMap::new(),
            failed: Vec::new(),
            suspicious: BTreeSet::new(),
            previous_suspicious: 0,
        }
    }

    /// Stop once at most `threshold` suspicious combinations remain.
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Largest suspicious combination considered, at least 1.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    fn should_continue(&self) -> bool {
        (self.iteration as usize + 1) < self.sizes.len()
            && self.suspicious.len() > self.threshold
            && self.suspicious.len() != self.previous_suspicious
    }

    fn mutations(&self) -> Vec<Combination> {
        let mut next = Vec::new();
        for input in &self.failed {
            for (parameter, &size) in self.sizes.iter().enumerate() {
                let Some(value) = input.get(parameter) else {
                    continue;
                };
                let mutated = input.with(parameter, other_value(value, self.iteration, size));
                if !self.results.contains_key(&mutated) && !next.contains(&mutated) {
                    next.push(mutated);
                }
            }
        }
        next
    }
}

impl FaultCharacterizationAlgorithm for IterAifl {
    fn name(&self) -> &str {
        "iter-aifl"
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
                self.suspicious.extend(input.sub_combinations(self.max_size));
                self.failed.push((*input).clone());
            }
        }
        for (input, _) in new.iter().filter(|(_, r)| r.is_success()) {
            for sub in input.sub_combinations(self.max_size) {
                self.suspicious.remove(&sub);
            }
        }
        for (input, result) in new {
            self.results.insert(input.clone(), result.clone());
        }

        if !self.should_continue() {
            return Vec::new();
        }
        self.iteration += 1;
        self.mutations()
    }

    /// The minimal suspicious combinations.
    fn compute_failure_inducing_combinations(&self) -> Vec<Combination> {
        self.suspicious
            .iter()
            .filter(|c| {
                !self
                    .suspicious
                    .iter()
                    .any(|other| other != *c && c.contains(other))
            })
            .cloned()
            .collect()
    }
}
