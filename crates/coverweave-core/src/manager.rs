//! Session orchestration.
//!
//! A session moves through
//! `Initializing -> Generating -> AwaitingResults -> (Characterizing -> AwaitingResults)* -> Done`.
//! All group bookkeeping sits behind one mutex, so a group's completion check
//! and the characterization step it triggers happen exactly once even when
//! results arrive from several executor threads.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use coverweave_explore::conflict::{
    ConflictDetectionManager, DiagnosisHittingSet, MissingInvalidTuple,
};
use coverweave_explore::TestInputGroup;
use coverweave_model::{
    Combination, NoopReporter, Report, ReportArgument, ReportLevel, TestModel, TestResult,
};

use crate::characterization::FaultCharacterizationAlgorithm;
use crate::config::CombinatorialTestConfig;
use crate::error::ManagerError;
use crate::report::GenerationReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Initializing,
    Generating,
    AwaitingResults,
    /// At least one group is being characterized.
    Characterizing,
    Done,
}

pub trait TestManager: Send + Sync {
    fn check_constraints_for_conflicts(&self) -> Result<Vec<MissingInvalidTuple>, ManagerError>;

    fn compute_minimal_diagnosis_hitting_sets(
        &self,
        missing: &[MissingInvalidTuple],
    ) -> Result<Vec<DiagnosisHittingSet>, ManagerError>;

    /// Every generated test input, each exactly once.
    fn generate_initial_tests(&self) -> Result<Vec<Combination>, ManagerError>;

    /// Record `result` for `input`; returns follow-up inputs, possibly none.
    fn generate_additional_test_inputs_with_result(
        &self,
        input: &Combination,
        result: &TestResult,
    ) -> Vec<Combination>;

    fn state(&self) -> SessionState;
}

/// One group and the results collected for it.
struct GroupSession {
    group: TestInputGroup,
    algorithm: Option<Box<dyn FaultCharacterizationAlgorithm>>,
    awaiting: BTreeSet<Combination>,
    results: BTreeMap<Combination, TestResult>,
    finished: bool,
}

impl GroupSession {
    fn characterizing(&self) -> bool {
        self.algorithm.is_some() && !self.finished
    }
}

struct SessionInner {
    state: SessionState,
    groups: Vec<GroupSession>,
}

pub struct BasicTestManager {
    config: CombinatorialTestConfig,
    model: Arc<TestModel>,
    reporter: Arc<dyn GenerationReporter>,
    inner: Mutex<SessionInner>,
}

impl BasicTestManager {
    pub fn new(config: CombinatorialTestConfig, model: Arc<TestModel>) -> Self {
        let reporter = config
            .reporter
            .clone()
            .unwrap_or_else(|| Arc::new(NoopReporter));
        Self {
            config,
            model,
            reporter,
            inner: Mutex::new(SessionInner {
                state: SessionState::Initializing,
                groups: Vec::new(),
            }),
        }
    }

    pub fn model(&self) -> &Arc<TestModel> {
        &self.model
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn conflict_detector(&self) -> Result<ConflictDetectionManager, ManagerError> {
        Ok(ConflictDetectionManager::new(
            self.config.conflict_detection,
            Arc::clone(&self.model),
        )?)
    }

    fn run_conflict_detection(&self) -> Result<(), ManagerError> {
        let missing = self.check_constraints_for_conflicts()?;
        if missing.is_empty() {
            return Ok(());
        }
        let hitting_sets = if self.config.conflict_detection.diagnosis_enabled {
            self.compute_minimal_diagnosis_hitting_sets(&missing)?
        } else {
            Vec::new()
        };
        warn!(
            missing = missing.len(),
            hitting_sets = hitting_sets.len(),
            "constraints make error tuples unreachable"
        );
        let level = if self.config.conflict_detection.should_abort {
            ReportLevel::Error
        } else {
            ReportLevel::Warn
        };
        for tuple in &missing {
            self.reporter.report_with(level, &|| {
                Report::new(
                    "error tuple {0} cannot appear in any valid test input",
                    vec![ReportArgument::ConstraintTuple {
                        list: tuple.error_list,
                        involved: tuple.involved.clone(),
                        values: tuple.values.clone(),
                    }],
                )
            });
        }
        if self.config.conflict_detection.should_abort {
            return Err(ManagerError::ConflictsDetected {
                missing,
                hitting_sets,
            });
        }
        Ok(())
    }

    fn characterization_step(&self, session: &mut GroupSession) -> Vec<Combination> {
        let Some(factory) = self.config.characterization.as_ref() else {
            return Vec::new();
        };
        if session.algorithm.is_none() {
            let Some(config) = session.group.characterization.as_ref() else {
                return Vec::new();
            };
            let algorithm = factory.create(config);
            info!(
                group = %session.group.id,
                algorithm = algorithm.name(),
                "fault characterization started"
            );
            self.reporter
                .fault_characterization_started(&session.group, algorithm.name());
            session.algorithm = Some(algorithm);
        }
        let Some(algorithm) = session.algorithm.as_mut() else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let next: Vec<Combination> = algorithm
            .compute_next_test_inputs(&session.results)
            .into_iter()
            .filter(|c| !session.results.contains_key(c) && seen.insert(c.clone()))
            .collect();

        if next.is_empty() {
            let failure_inducing = algorithm.compute_failure_inducing_combinations();
            info!(
                group = %session.group.id,
                found = failure_inducing.len(),
                "fault characterization finished"
            );
            self.reporter
                .fault_characterization_finished(&session.group, &failure_inducing);
            self.finish(session);
        } else {
            debug!(
                group = %session.group.id,
                inputs = next.len(),
                "additional test inputs generated"
            );
            self.reporter
                .fault_characterization_test_inputs_generated(&session.group, &next);
            session.awaiting.extend(next.iter().cloned());
        }
        next
    }

    fn finish(&self, session: &mut GroupSession) {
        session.finished = true;
        self.reporter.test_input_group_finished(&session.group);
    }

    fn should_characterize(&self, session: &GroupSession) -> bool {
        session.algorithm.is_some()
            || (self.config.characterization.is_some()
                && session.group.characterization.is_some()
                && session.results.values().any(TestResult::is_failure))
    }
}

fn settle(inner: &mut SessionInner) {
    inner.state = if inner.groups.iter().all(|g| g.finished) {
        SessionState::Done
    } else if inner.groups.iter().any(GroupSession::characterizing) {
        SessionState::Characterizing
    } else {
        SessionState::AwaitingResults
    };
}

impl TestManager for BasicTestManager {
    fn check_constraints_for_conflicts(&self) -> Result<Vec<MissingInvalidTuple>, ManagerError> {
        Ok(self.conflict_detector()?.detect_missing_invalid_tuples()?)
    }

    fn compute_minimal_diagnosis_hitting_sets(
        &self,
        missing: &[MissingInvalidTuple],
    ) -> Result<Vec<DiagnosisHittingSet>, ManagerError> {
        if !self.config.conflict_detection.diagnosis_enabled {
            return Err(ManagerError::DiagnosisDisabled);
        }
        Ok(self
            .conflict_detector()?
            .compute_minimal_diagnosis_hitting_sets(missing)?)
    }

    fn generate_initial_tests(&self) -> Result<Vec<Combination>, ManagerError> {
        let mut inner = self.lock();
        if inner.state != SessionState::Initializing {
            return Err(ManagerError::AlreadyInitialized);
        }

        if self.config.conflict_detection.enabled {
            if let Err(e) = self.run_conflict_detection() {
                inner.state = SessionState::Done;
                return Err(e);
            }
        }

        inner.state = SessionState::Generating;
        let mut groups = Vec::new();
        for generator in &self.config.generators {
            let generated = match generator.generate(&self.model, self.reporter.as_ref()) {
                Ok(generated) => generated,
                Err(e) => {
                    inner.state = SessionState::Done;
                    return Err(e.into());
                }
            };
            for group in generated {
                debug!(
                    group = %group.id,
                    generator = generator.name(),
                    inputs = group.combinations.len(),
                    "group generated"
                );
                self.reporter.test_input_group_generated(&group, generator.name());
                let mut session = GroupSession {
                    awaiting: group.combinations.iter().cloned().collect(),
                    group,
                    algorithm: None,
                    results: BTreeMap::new(),
                    finished: false,
                };
                if session.awaiting.is_empty() {
                    self.finish(&mut session);
                }
                groups.push(session);
            }
        }

        let mut seen = HashSet::new();
        let inputs: Vec<Combination> = groups
            .iter()
            .flat_map(|g| g.group.combinations.iter())
            .filter(|c| seen.insert(*c))
            .cloned()
            .collect();
        info!(groups = groups.len(), inputs = inputs.len(), "initial test inputs generated");

        inner.groups = groups;
        settle(&mut inner);
        Ok(inputs)
    }

    fn generate_additional_test_inputs_with_result(
        &self,
        input: &Combination,
        result: &TestResult,
    ) -> Vec<Combination> {
        let mut inner = self.lock();
        let mut seen = HashSet::new();
        let mut next = Vec::new();

        for session in inner.groups.iter_mut() {
            if session.finished || !session.awaiting.remove(input) {
                continue;
            }
            session.results.insert(input.clone(), result.clone());
            if !session.awaiting.is_empty() {
                continue;
            }
            if self.should_characterize(session) {
                for c in self.characterization_step(session) {
                    if seen.insert(c.clone()) {
                        next.push(c);
                    }
                }
            } else {
                self.finish(session);
            }
        }

        settle(&mut inner);
        next
    }

    fn state(&self) -> SessionState {
        self.lock().state
    }
}
