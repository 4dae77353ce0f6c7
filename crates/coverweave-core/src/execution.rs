//! Parallel execution of a whole session.
//!
//! Workers pull inputs from a shared channel, execute them, and feed each
//! result straight back into the manager from their own thread. Follow-up
//! inputs go back onto the channel. A pending counter tracks inputs queued
//! or running; the worker that brings it to zero stops the pool.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crossbeam::channel::{self, Sender};
use tracing::{debug, info};

use coverweave_model::{Combination, TestResult};

use crate::error::ManagerError;
use crate::manager::TestManager;

/// Runs one test input against the system under test.
pub trait TestExecutor: Send + Sync {
    fn execute(&self, input: &Combination) -> TestResult;
}

impl<F> TestExecutor for F
where
    F: Fn(&Combination) -> TestResult + Send + Sync,
{
    fn execute(&self, input: &Combination) -> TestResult {
        self(input)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub results: BTreeMap<Combination, TestResult>,
    /// Number of executions, counting repeats.
    pub executions: usize,
}

impl SessionSummary {
    pub fn failures(&self) -> impl Iterator<Item = &Combination> {
        self.results
            .iter()
            .filter(|(_, r)| r.is_failure())
            .map(|(c, _)| c)
    }
}

enum Message {
    Run(Combination),
    Stop,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionRunner {
    threads: usize,
}

impl Default for SessionRunner {
    fn default() -> Self {
        Self::new(4)
    }
}

impl SessionRunner {
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn run(
        &self,
        manager: &dyn TestManager,
        executor: &dyn TestExecutor,
    ) -> Result<SessionSummary, ManagerError> {
        let initial = manager.generate_initial_tests()?;
        info!(inputs = initial.len(), threads = self.threads, "session started");

        let (tx, rx) = channel::unbounded::<Message>();
        let pending = AtomicUsize::new(initial.len());
        let executions = AtomicUsize::new(0);
        let results = Mutex::new(BTreeMap::new());

        if initial.is_empty() {
            stop_all(&tx, self.threads);
        }
        for input in initial {
            // The receiver lives until the scope below ends.
            let _ = tx.send(Message::Run(input));
        }

        let threads = self.threads;
        crossbeam::thread::scope(|scope| {
            for worker in 0..threads {
                let tx = tx.clone();
                let rx = rx.clone();
                let (pending, executions, results) = (&pending, &executions, &results);
                scope.spawn(move |_| {
                    while let Ok(Message::Run(input)) = rx.recv() {
                        let result = executor.execute(&input);
                        executions.fetch_add(1, Ordering::SeqCst);
                        let next =
                            manager.generate_additional_test_inputs_with_result(&input, &result);
                        debug!(worker, input = %input, follow_ups = next.len(), "input executed");
                        results
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .insert(input, result);

                        pending.fetch_add(next.len(), Ordering::SeqCst);
                        for input in next {
                            let _ = tx.send(Message::Run(input));
                        }
                        if pending.fetch_sub(1, Ordering::SeqCst) == 1 {
                            stop_all(&tx, threads);
                        }
                    }
                });
            }
        })
        .map_err(|_| ManagerError::WorkerPanicked)?;

        let summary = SessionSummary {
            results: results.into_inner().unwrap_or_else(PoisonError::into_inner),
            executions: executions.into_inner(),
        };
        info!(
            executed = summary.executions,
            failures = summary.failures().count(),
            "session finished"
        );
        Ok(summary)
    }
}

fn stop_all(tx: &Sender<Message>, threads: usize) {
    for _ in 0..threads {
        let _ = tx.send(Message::Stop);
    }
}
