//! Session management for combinatorial testing.
//!
//! [`BasicTestManager`] generates the initial test inputs, routes execution
//! results to their groups and drives fault characterization.
//! [`CachingTestManager`] answers inputs with known results from a cache.
//! [`SessionRunner`] executes a whole session on a worker pool.

pub mod cache;
pub mod characterization;
pub mod config;
pub mod convert;
pub mod error;
pub mod execution;
pub mod manager;
pub mod report;

pub use cache::{CachingTestManager, InMemoryTestResultCache, TestResultCache};
pub use characterization::{
    CharacterizationKind, FaultCharacterizationAlgorithm, FaultCharacterizationAlgorithmFactory,
};
pub use config::{CombinatorialTestConfig, GeneratorKind, SessionSettings};
pub use error::ManagerError;
pub use execution::{SessionRunner, SessionSummary, TestExecutor};
pub use manager::{BasicTestManager, SessionState, TestManager};
pub use report::{
    ExecutionReporter, ExecutionReporterAdapter, GenerationReporter, TracingExecutionReporter,
};
