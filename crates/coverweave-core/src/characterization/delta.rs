//! Improved delta debugging.
//!
//! Picks a failed input not yet explained by a known failure-inducing
//! combination and compares it with the most similar passed input that
//! agrees on every parameter already known to be related. The differing
//! parameters are suspicious; they are halved by binary search until a
//! single related parameter remains. A check input then keeps only the
//! related parameters and changes all others: if it still fails, the related
//! parameters form a failure-inducing combination, otherwise the search
//! continues with the remaining parameters.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use coverweave_explore::FaultCharacterizationConfig;
use coverweave_model::{Combination, TestResult};

use super::{other_value, FaultCharacterizationAlgorithm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initialization,
    Isolation,
    Check,
}

pub struct ImprovedDeltaDebugging {
    sizes: Vec<u32>,
    state: State,
    /// Every executed input and whether it passed.
    executed: BTreeMap<Combination, bool>,
    failure_inducing: Vec<Combination>,
    current_failed: Combination,
    next_expected: Option<Combination>,
    related: BTreeSet<usize>,
    unrelated: BTreeSet<usize>,
    suspicious: Vec<usize>,
    first_half: Vec<usize>,
    second_half: Vec<usize>,
}

impl ImprovedDeltaDebugging {
    pub fn new(config: &FaultCharacterizationConfig) -> Self {
        Self::with_sizes(config.model.sizes().to_vec())
    }

    pub fn with_sizes(sizes: Vec<u32>) -> Self {
        Self {
            current_failed: Combination::empty(sizes.len()),
            sizes,
            state: State::Initialization,
            executed: BTreeMap::new(),
            failure_inducing: Vec::new(),
            next_expected: None,
            related: BTreeSet::new(),
            unrelated: BTreeSet::new(),
            suspicious: Vec::new(),
            first_half: Vec::new(),
            second_half: Vec::new(),
        }
    }

    fn step(&mut self) {
        match self.state {
            State::Initialization => self.start_next_failed_input(),
            State::Isolation => self.continue_isolation(),
            State::Check => self.evaluate_check(),
        }
    }

    fn start_next_failed_input(&mut self) {
        self.related.clear();
        let unexplained = self
            .executed
            .iter()
            .filter(|(_, &passed)| !passed)
            .map(|(input, _)| input)
            .find(|input| !self.failure_inducing.iter().any(|fic| input.contains(fic)))
            .cloned();
        match unexplained {
            Some(input) => {
                self.current_failed = input;
                self.find_suspicious_and_isolate();
            }
            None => {
                self.state = State::Initialization;
                self.next_expected = None;
            }
        }
    }

    fn find_suspicious_and_isolate(&mut self) {
        self.suspicious = match self.nearest_passed_input() {
            Some(passed) => (0..self.sizes.len())
                .filter(|&p| passed.get(p) != self.current_failed.get(p))
                .collect(),
            None => (0..self.sizes.len())
                .filter(|p| !self.related.contains(p))
                .collect(),
        };
        self.unrelated.clear();
        self.divide_and_isolate();
    }

    /// The passed input agreeing with the current failure on every related
    /// parameter and on the most parameters overall.
    fn nearest_passed_input(&self) -> Option<Combination> {
        let mut best: Option<(&Combination, usize)> = None;
        for (input, _) in self.executed.iter().filter(|(_, &passed)| passed) {
            let agrees = self
                .related
                .iter()
                .all(|&p| input.get(p) == self.current_failed.get(p));
            if !agrees {
                continue;
            }
            let similarity = (0..self.sizes.len())
                .filter(|&p| input.get(p) == self.current_failed.get(p))
                .count();
            if best.map_or(true, |(_, s)| similarity > s) {
                best = Some((input, similarity));
            }
        }
        best.map(|(input, _)| input.clone())
    }

    fn divide_and_isolate(&mut self) {
        match self.suspicious.len() {
            0 => {
                // Nothing left to isolate: the related parameters explain the failure.
                self.record_failure_inducing();
                self.start_next_failed_input();
            }
            1 => {
                self.related.extend(self.suspicious.iter().copied());
                self.next_expected = Some(self.check_input());
                self.state = State::Check;
            }
            len => {
                let (first, second) = self.suspicious.split_at(len / 2);
                self.first_half = first.to_vec();
                self.second_half = second.to_vec();
                self.next_expected = Some(self.isolation_input());
                self.state = State::Isolation;
            }
        }
    }

    fn isolation_input(&self) -> Combination {
        let mut input = self.current_failed.clone();
        for p in self.unrelated.iter().chain(&self.first_half) {
            self.change(&mut input, *p);
        }
        input
    }

    fn check_input(&self) -> Combination {
        let mut input = self.current_failed.clone();
        for p in (0..self.sizes.len()).filter(|p| !self.related.contains(p)) {
            self.change(&mut input, p);
        }
        input
    }

    fn change(&self, input: &mut Combination, parameter: usize) {
        if let Some(value) = self.current_failed.get(parameter) {
            input.set(parameter, other_value(value, 1, self.sizes[parameter]));
        }
    }

    fn expected_passed(&self) -> bool {
        self.next_expected
            .as_ref()
            .and_then(|input| self.executed.get(input))
            .copied()
            .unwrap_or(false)
    }

    fn continue_isolation(&mut self) {
        if self.expected_passed() {
            self.suspicious = std::mem::take(&mut self.first_half);
        } else {
            self.unrelated.extend(self.first_half.iter().copied());
            self.suspicious = std::mem::take(&mut self.second_half);
        }
        self.divide_and_isolate();
    }

    fn evaluate_check(&mut self) {
        if self.expected_passed() {
            self.find_suspicious_and_isolate();
        } else {
            self.record_failure_inducing();
            self.start_next_failed_input();
        }
    }

    fn record_failure_inducing(&mut self) {
        let positions: Vec<usize> = self.related.iter().copied().collect();
        let fic = self.current_failed.restrict(&positions);
        debug!(combination = %fic, "failure-inducing combination isolated");
        self.failure_inducing.push(fic);
    }
}

impl FaultCharacterizationAlgorithm for ImprovedDeltaDebugging {
    fn name(&self) -> &str {
        "improved delta debugging"
    }

    fn compute_next_test_inputs(
        &mut self,
        results: &BTreeMap<Combination, TestResult>,
    ) -> Vec<Combination> {
        for (input, result) in results {
            self.executed.insert(input.clone(), result.is_success());
        }
        loop {
            self.step();
            match &self.next_expected {
                Some(next) if self.executed.contains_key(next) => continue,
                _ => break,
            }
        }
        self.next_expected.iter().cloned().collect()
    }

    fn compute_failure_inducing_combinations(&self) -> Vec<Combination> {
        self.failure_inducing.clone()
    }
}
