//! Translation of index-based report arguments into named domain objects.

use std::sync::Arc;

use coverweave_model::convert::IndexModelConverter;
use coverweave_model::{Combination, Report, ReportArgument};

/// Converts the report arguments it claims.
pub trait ArgumentConverter: Send + Sync {
    fn can_convert(&self, argument: &ReportArgument) -> bool;

    fn convert(&self, argument: &ReportArgument) -> ReportArgument;
}

/// Tries converters in order; the first one claiming an argument converts
/// it. Unclaimed arguments pass through unchanged.
#[derive(Default)]
pub struct DelegatingArgumentConverter {
    converters: Vec<Box<dyn ArgumentConverter>>,
}

impl DelegatingArgumentConverter {
    pub fn new(converters: Vec<Box<dyn ArgumentConverter>>) -> Self {
        Self { converters }
    }

    pub fn with(mut self, converter: impl ArgumentConverter + 'static) -> Self {
        self.converters.push(Box::new(converter));
        self
    }

    pub fn convert_argument(&self, argument: &ReportArgument) -> ReportArgument {
        self.converters
            .iter()
            .find(|c| c.can_convert(argument))
            .map(|c| c.convert(argument))
            .unwrap_or_else(|| argument.clone())
    }

    pub fn convert_report(&self, report: &Report) -> Report {
        report.map_arguments(|a| self.convert_argument(a))
    }
}

/// Converts combinations, parameters, values and tuple lists using the
/// named model they were derived from.
#[derive(Debug, Clone)]
pub struct ModelArgumentConverter {
    converter: Arc<IndexModelConverter>,
}

impl ModelArgumentConverter {
    pub fn new(converter: Arc<IndexModelConverter>) -> Self {
        Self { converter }
    }

    fn parameter_count(&self) -> usize {
        self.converter.input_model().parameters.len()
    }
}

impl ArgumentConverter for ModelArgumentConverter {
    fn can_convert(&self, argument: &ReportArgument) -> bool {
        match argument {
            ReportArgument::Combination(c) => c.len() == self.parameter_count(),
            ReportArgument::Parameter(p) => self.converter.parameter_name(*p).is_some(),
            ReportArgument::Value { parameter, value } => {
                self.converter.value(*parameter, *value).is_some()
            }
            ReportArgument::TupleList(id) => self.converter.constraint_name(*id).is_some(),
            ReportArgument::ConstraintTuple { involved, .. } => {
                involved.iter().all(|&p| p < self.parameter_count())
            }
            _ => false,
        }
    }

    fn convert(&self, argument: &ReportArgument) -> ReportArgument {
        match argument {
            ReportArgument::Combination(c) => {
                ReportArgument::NamedCombination(self.converter.convert_combination(c))
            }
            ReportArgument::Parameter(p) => match self.converter.parameter_name(*p) {
                Some(name) => ReportArgument::Name(name.to_string()),
                None => argument.clone(),
            },
            ReportArgument::Value { parameter, value } => {
                match (
                    self.converter.parameter_name(*parameter),
                    self.converter.value(*parameter, *value),
                ) {
                    (Some(name), Some(value)) => ReportArgument::NamedValue {
                        parameter: name.to_string(),
                        value: value.clone(),
                    },
                    _ => argument.clone(),
                }
            }
            ReportArgument::TupleList(id) => match self.converter.constraint_name(*id) {
                Some(name) => ReportArgument::Name(name.to_string()),
                None => argument.clone(),
            },
            ReportArgument::ConstraintTuple {
                involved, values, ..
            } => {
                let combination = Combination::from_tuple(self.parameter_count(), involved, values);
                ReportArgument::NamedCombination(self.converter.convert_combination(&combination))
            }
            other => other.clone(),
        }
    }
}
