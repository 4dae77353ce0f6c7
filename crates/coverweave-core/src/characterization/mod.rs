//! Fault characterization: narrowing failing test inputs down to the
//! sub-combinations that cause the failure.
//!
//! An algorithm is driven by the test manager. It receives every result of
//! its group collected so far and answers with further inputs to execute,
//! until it returns nothing; then the failure-inducing combinations are read.

pub mod aifl;
pub mod ben;
pub mod delta;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use coverweave_explore::FaultCharacterizationConfig;
use coverweave_model::{Combination, TestResult};

pub use aifl::IterAifl;
pub use ben::Ben;
pub use delta::ImprovedDeltaDebugging;

pub trait FaultCharacterizationAlgorithm: Send {
    fn name(&self) -> &str;

    /// Inputs to execute next. Never contains a key of `results`; empty once
    /// the algorithm has finished.
    fn compute_next_test_inputs(
        &mut self,
        results: &BTreeMap<Combination, TestResult>,
    ) -> Vec<Combination>;

    /// Combinations found to cause failures, wildcards at the irrelevant
    /// positions.
    fn compute_failure_inducing_combinations(&self) -> Vec<Combination>;
}

/// Creates one algorithm instance per characterized group.
pub trait FaultCharacterizationAlgorithmFactory: Send + Sync {
    fn create(
        &self,
        config: &FaultCharacterizationConfig,
    ) -> Box<dyn FaultCharacterizationAlgorithm>;
}

impl<F> FaultCharacterizationAlgorithmFactory for F
where
    F: Fn(&FaultCharacterizationConfig) -> Box<dyn FaultCharacterizationAlgorithm> + Send + Sync,
{
    fn create(
        &self,
        config: &FaultCharacterizationConfig,
    ) -> Box<dyn FaultCharacterizationAlgorithm> {
        self(config)
    }
}

/// The built-in algorithms, selectable from settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterizationKind {
    #[default]
    ImprovedDeltaDebugging,
    IterAifl,
    Ben,
}

impl FaultCharacterizationAlgorithmFactory for CharacterizationKind {
    fn create(
        &self,
        config: &FaultCharacterizationConfig,
    ) -> Box<dyn FaultCharacterizationAlgorithm> {
        match self {
            CharacterizationKind::ImprovedDeltaDebugging => {
                Box::new(ImprovedDeltaDebugging::new(config))
            }
            CharacterizationKind::IterAifl => Box::new(IterAifl::new(config)),
            CharacterizationKind::Ben => Box::new(Ben::new(config)),
        }
    }
}

/// The value after `value` in a domain of `size` values, wrapping around.
pub(crate) fn other_value(value: u32, offset: u32, size: u32) -> u32 {
    ((u64::from(value) + u64::from(offset)) % u64::from(size)) as u32
}
