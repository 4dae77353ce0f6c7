//! Result caching in front of a test manager.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use coverweave_explore::conflict::{DiagnosisHittingSet, MissingInvalidTuple};
use coverweave_model::{Combination, TestResult};

use crate::error::ManagerError;
use crate::manager::{SessionState, TestManager};

pub trait TestResultCache: Send {
    fn contains_result_for(&self, input: &Combination) -> bool {
        self.result_for(input).is_some()
    }

    fn result_for(&self, input: &Combination) -> Option<TestResult>;

    fn add_result_for(&mut self, input: &Combination, result: TestResult);
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryTestResultCache {
    results: HashMap<Combination, TestResult>,
}

impl InMemoryTestResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl FromIterator<(Combination, TestResult)> for InMemoryTestResultCache {
    fn from_iter<I: IntoIterator<Item = (Combination, TestResult)>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}

impl TestResultCache for InMemoryTestResultCache {
    fn contains_result_for(&self, input: &Combination) -> bool {
        self.results.contains_key(input)
    }

    fn result_for(&self, input: &Combination) -> Option<TestResult> {
        self.results.get(input).cloned()
    }

    fn add_result_for(&mut self, input: &Combination, result: TestResult) {
        self.results.insert(input.clone(), result);
    }
}

struct CacheState<C> {
    cache: C,
    /// Every input ever handed out.
    dispatched: HashSet<Combination>,
}

/// Wraps a manager so that inputs with a cached result are answered from the
/// cache instead of being executed.
///
/// Cached results are replayed into the wrapped manager until it asks only
/// for inputs without a cached result. No input is returned twice over the
/// lifetime of the decorator. Cache lookups, replays and the dispatch check
/// run under one lock.
pub struct CachingTestManager<M, C> {
    manager: M,
    state: Mutex<CacheState<C>>,
}

impl<M: TestManager, C: TestResultCache> CachingTestManager<M, C> {
    pub fn new(manager: M, cache: C) -> Self {
        Self {
            manager,
            state: Mutex::new(CacheState {
                cache,
                dispatched: HashSet::new(),
            }),
        }
    }

    pub fn inner(&self) -> &M {
        &self.manager
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn inputs_with_unknown_results(
        &self,
        state: &mut CacheState<C>,
        needed: Vec<Combination>,
    ) -> Vec<Combination> {
        let mut worklist: VecDeque<Combination> = VecDeque::new();
        push_front_distinct(&mut worklist, needed);
        let mut replayed = HashSet::new();
        let mut novel = Vec::new();

        while let Some(input) = worklist.pop_front() {
            if let Some(result) = state.cache.result_for(&input) {
                if !replayed.insert(input.clone()) {
                    continue;
                }
                debug!(input = %input, "replaying cached result");
                let next = self
                    .manager
                    .generate_additional_test_inputs_with_result(&input, &result);
                push_front_distinct(&mut worklist, next);
            } else if state.dispatched.insert(input.clone()) {
                novel.push(input);
            }
        }
        novel
    }
}

/// Queue `inputs` ahead of the rest of `worklist`, keeping their order and
/// dropping repeats among them.
fn push_front_distinct(worklist: &mut VecDeque<Combination>, inputs: Vec<Combination>) {
    let mut seen = HashSet::new();
    let distinct: Vec<Combination> =
        inputs.into_iter().filter(|c| seen.insert(c.clone())).collect();
    for input in distinct.into_iter().rev() {
        worklist.push_front(input);
    }
}

impl<M: TestManager, C: TestResultCache> TestManager for CachingTestManager<M, C> {
    fn check_constraints_for_conflicts(&self) -> Result<Vec<MissingInvalidTuple>, ManagerError> {
        self.manager.check_constraints_for_conflicts()
    }

    fn compute_minimal_diagnosis_hitting_sets(
        &self,
        missing: &[MissingInvalidTuple],
    ) -> Result<Vec<DiagnosisHittingSet>, ManagerError> {
        self.manager.compute_minimal_diagnosis_hitting_sets(missing)
    }

    fn generate_initial_tests(&self) -> Result<Vec<Combination>, ManagerError> {
        let mut state = self.lock();
        let initial = self.manager.generate_initial_tests()?;
        Ok(self.inputs_with_unknown_results(&mut state, initial))
    }

    fn generate_additional_test_inputs_with_result(
        &self,
        input: &Combination,
        result: &TestResult,
    ) -> Vec<Combination> {
        let mut state = self.lock();
        state.cache.add_result_for(input, result.clone());
        let next = self
            .manager
            .generate_additional_test_inputs_with_result(input, result);
        self.inputs_with_unknown_results(&mut state, next)
    }

    fn state(&self) -> SessionState {
        self.manager.state()
    }
}
