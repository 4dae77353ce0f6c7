//! Negative test input groups.
//!
//! One group per error tuple list. Its inputs each contain a realizable tuple
//! of that list, never an exclusion tuple, and no tuple of another error list
//! unless every valid completion must contain one. Every error tuple is
//! combined with all valid `(t-1)`-way combinations of the other parameters.
//! Lists are independent, so they are generated in parallel; the output keeps
//! declaration order.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, warn};

use coverweave_model::{Report, ReportArgument, ReportLevel, Reporter, TestModel, TupleList};

use crate::checker::{NegatedConstraintChecker, violates_exclusion};
use crate::error::GenerationError;
use crate::generator::{
    FaultCharacterizationConfig, GroupId, TestInputGroup, TestInputGroupGenerator,
};
use crate::ipog::{CoverageStrategy, IpogAlgorithm, IpogConfig, ParameterOrder};

#[derive(Debug, Clone, Copy, Default)]
pub struct IpogNeg;

impl TestInputGroupGenerator for IpogNeg {
    fn name(&self) -> &str {
        "ipog-neg"
    }

    fn generate(
        &self,
        model: &Arc<TestModel>,
        reporter: &dyn Reporter,
    ) -> Result<Vec<TestInputGroup>, GenerationError> {
        model
            .errors()
            .par_iter()
            .map(|list| generate_group(model, list, reporter))
            .collect()
    }
}

fn generate_group(
    model: &Arc<TestModel>,
    list: &TupleList,
    reporter: &dyn Reporter,
) -> Result<TestInputGroup, GenerationError> {
    let id = GroupId::ErrorTuples(list.id());
    let mut checker = NegatedConstraintChecker::new(model, list.id())?;

    let unrealizable = list.tuples().len() - checker.realizable_tuples().count();
    if unrealizable > 0 {
        warn!(list = %list.id(), unrealizable, "error tuples cannot appear in any valid input");
        reporter.report_with(ReportLevel::Warn, &|| {
            Report::new(
                "{0} of {1} contains {2} tuples no valid test input can realize",
                vec![
                    ReportArgument::Text("error constraint".to_string()),
                    ReportArgument::TupleList(list.id()),
                    ReportArgument::Count(unrealizable),
                ],
            )
        });
    }

    let combinations = if checker.realizable_tuples().next().is_none() {
        Vec::new()
    } else {
        let (involved, tuples) = sorted_targets(list.involved(), checker.realizable_tuples());
        let config = IpogConfig {
            order: ParameterOrder::NegativityAware {
                involved: involved.clone(),
            },
            coverage: CoverageStrategy::NegativeTWise { involved, tuples },
        };
        IpogAlgorithm::new(model, &mut checker, config, reporter)
            .generate()
            .rows
    };
    debug_assert!(combinations
        .iter()
        .all(|c| list.matches(c) && !violates_exclusion(model, c)));

    info!(list = %list.id(), rows = combinations.len(), "negative group generated");
    Ok(TestInputGroup {
        characterization: Some(FaultCharacterizationConfig::new(
            Arc::clone(model),
            id.clone(),
            Some(list.id()),
        )),
        id,
        combinations,
    })
}

/// `involved` in ascending order and `tuples` with their values permuted to
/// match.
fn sorted_targets<'a>(
    involved: &[usize],
    tuples: impl Iterator<Item = &'a [u32]>,
) -> (Vec<usize>, Vec<Vec<u32>>) {
    let mut order: Vec<usize> = (0..involved.len()).collect();
    order.sort_unstable_by_key(|&i| involved[i]);
    let sorted: Vec<usize> = order.iter().map(|&i| involved[i]).collect();
    let tuples: Vec<Vec<u32>> = tuples
        .map(|tuple| order.iter().map(|&i| tuple[i]).collect())
        .collect();
    (sorted, tuples)
}
