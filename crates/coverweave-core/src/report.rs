//! Life-cycle reporting.
//!
//! Generation works on index objects and talks to a [`GenerationReporter`].
//! Listeners outside the engine implement [`ExecutionReporter`] and see named
//! objects; [`ExecutionReporterAdapter`] sits in between and translates only
//! what a listener's threshold lets through.

use std::sync::{Arc, OnceLock};

use tracing::{debug, error, info, trace, warn};

use coverweave_explore::{GroupId, TestInputGroup};
use coverweave_model::convert::IndexModelConverter;
use coverweave_model::input::NamedCombination;
use coverweave_model::{Combination, NoopReporter, Report, ReportLevel, Reporter};

use crate::convert::{DelegatingArgumentConverter, ModelArgumentConverter};

/// Life-cycle events of a session, on index objects.
pub trait GenerationReporter: Reporter {
    fn test_input_group_generated(&self, _group: &TestInputGroup, _generator: &str) {}

    fn test_input_group_finished(&self, _group: &TestInputGroup) {}

    fn fault_characterization_started(&self, _group: &TestInputGroup, _algorithm: &str) {}

    fn fault_characterization_finished(
        &self,
        _group: &TestInputGroup,
        _failure_inducing: &[Combination],
    ) {
    }

    fn fault_characterization_test_inputs_generated(
        &self,
        _group: &TestInputGroup,
        _inputs: &[Combination],
    ) {
    }
}

impl GenerationReporter for NoopReporter {}

/// Life-cycle events of a session, on named objects.
pub trait ExecutionReporter: Send + Sync {
    /// Least severe level this listener wants to receive.
    fn report_level(&self) -> ReportLevel {
        ReportLevel::Info
    }

    fn test_input_group_generated(
        &self,
        _group: &GroupId,
        _inputs: &[NamedCombination],
        _generator: &str,
    ) {
    }

    fn test_input_group_finished(&self, _group: &GroupId) {}

    fn fault_characterization_started(&self, _group: &GroupId, _algorithm: &str) {}

    fn fault_characterization_finished(
        &self,
        _group: &GroupId,
        _failure_inducing: &[NamedCombination],
    ) {
    }

    fn fault_characterization_test_inputs_generated(
        &self,
        _group: &GroupId,
        _inputs: &[NamedCombination],
    ) {
    }

    fn report(&self, _level: ReportLevel, _report: Report) {}
}

/// Life-cycle events are delivered at this level.
const LIFE_CYCLE_LEVEL: ReportLevel = ReportLevel::Info;

/// Bridges generation reports to execution reporters.
///
/// Nothing is converted unless at least one listener accepts the level, and
/// each report or combination list is converted at most once per event.
pub struct ExecutionReporterAdapter {
    reporters: Vec<Arc<dyn ExecutionReporter>>,
    model: Arc<IndexModelConverter>,
    arguments: DelegatingArgumentConverter,
}

impl ExecutionReporterAdapter {
    pub fn new(
        model: Arc<IndexModelConverter>,
        reporters: Vec<Arc<dyn ExecutionReporter>>,
    ) -> Self {
        let arguments = DelegatingArgumentConverter::default()
            .with(ModelArgumentConverter::new(Arc::clone(&model)));
        Self {
            reporters,
            model,
            arguments,
        }
    }

    /// Replace the argument converter chain.
    pub fn with_arguments(mut self, arguments: DelegatingArgumentConverter) -> Self {
        self.arguments = arguments;
        self
    }

    fn listening(&self, level: ReportLevel) -> impl Iterator<Item = &Arc<dyn ExecutionReporter>> {
        self.reporters
            .iter()
            .filter(move |r| level.is_worse_than_or_equal_to(r.report_level()))
    }

    fn named(&self, combinations: &[Combination]) -> Vec<NamedCombination> {
        combinations
            .iter()
            .map(|c| self.model.convert_combination(c))
            .collect()
    }

    /// Runs `deliver` for every life-cycle listener, converting
    /// `combinations` lazily on first use.
    fn life_cycle(
        &self,
        combinations: &[Combination],
        deliver: impl Fn(&dyn ExecutionReporter, &[NamedCombination]),
    ) {
        let named = OnceLock::new();
        for reporter in self.listening(LIFE_CYCLE_LEVEL) {
            deliver(reporter.as_ref(), named.get_or_init(|| self.named(combinations)));
        }
    }
}

impl Reporter for ExecutionReporterAdapter {
    fn report(&self, level: ReportLevel, report: Report) {
        self.report_with(level, &|| report.clone());
    }

    fn report_with(&self, level: ReportLevel, supplier: &dyn Fn() -> Report) {
        let converted = OnceLock::new();
        for reporter in self.listening(level) {
            let report = converted.get_or_init(|| self.arguments.convert_report(&supplier()));
            reporter.report(level, report.clone());
        }
    }
}

impl GenerationReporter for ExecutionReporterAdapter {
    fn test_input_group_generated(&self, group: &TestInputGroup, generator: &str) {
        self.life_cycle(&group.combinations, |r, named| {
            r.test_input_group_generated(&group.id, named, generator)
        });
    }

    fn test_input_group_finished(&self, group: &TestInputGroup) {
        self.life_cycle(&[], |r, _| r.test_input_group_finished(&group.id));
    }

    fn fault_characterization_started(&self, group: &TestInputGroup, algorithm: &str) {
        self.life_cycle(&[], |r, _| r.fault_characterization_started(&group.id, algorithm));
    }

    fn fault_characterization_finished(
        &self,
        group: &TestInputGroup,
        failure_inducing: &[Combination],
    ) {
        self.life_cycle(failure_inducing, |r, named| {
            r.fault_characterization_finished(&group.id, named)
        });
    }

    fn fault_characterization_test_inputs_generated(
        &self,
        group: &TestInputGroup,
        inputs: &[Combination],
    ) {
        self.life_cycle(inputs, |r, named| {
            r.fault_characterization_test_inputs_generated(&group.id, named)
        });
    }
}

/// Writes every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingExecutionReporter {
    level: ReportLevel,
}

impl TracingExecutionReporter {
    pub fn new(level: ReportLevel) -> Self {
        Self { level }
    }
}

impl ExecutionReporter for TracingExecutionReporter {
    fn report_level(&self) -> ReportLevel {
        self.level
    }

    fn test_input_group_generated(
        &self,
        group: &GroupId,
        inputs: &[NamedCombination],
        generator: &str,
    ) {
        info!(%group, generator, inputs = inputs.len(), "test input group generated");
    }

    fn test_input_group_finished(&self, group: &GroupId) {
        info!(%group, "test input group finished");
    }

    fn fault_characterization_started(&self, group: &GroupId, algorithm: &str) {
        info!(%group, algorithm, "fault characterization started");
    }

    fn fault_characterization_finished(
        &self,
        group: &GroupId,
        failure_inducing: &[NamedCombination],
    ) {
        for combination in failure_inducing {
            info!(%group, %combination, "failure-inducing combination");
        }
        info!(%group, found = failure_inducing.len(), "fault characterization finished");
    }

    fn fault_characterization_test_inputs_generated(
        &self,
        group: &GroupId,
        inputs: &[NamedCombination],
    ) {
        debug!(%group, inputs = inputs.len(), "additional test inputs generated");
    }

    fn report(&self, level: ReportLevel, report: Report) {
        let message = report.resolve();
        match level {
            ReportLevel::Trace => trace!("{message}"),
            ReportLevel::Debug => debug!("{message}"),
            ReportLevel::Info => info!("{message}"),
            ReportLevel::Warn => warn!("{message}"),
            ReportLevel::Error | ReportLevel::Fatal => error!(%level, "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use coverweave_model::input::{InputParameterModel, Parameter};
    use coverweave_model::ReportArgument;

    #[derive(Default)]
    struct Recording {
        level: ReportLevel,
        reports: Mutex<Vec<(ReportLevel, String)>>,
        groups: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl ExecutionReporter for Recording {
        fn report_level(&self) -> ReportLevel {
            self.level
        }

        fn test_input_group_generated(
            &self,
            group: &GroupId,
            inputs: &[NamedCombination],
            _generator: &str,
        ) {
            self.groups.lock().unwrap().push((
                group.to_string(),
                inputs.iter().map(ToString::to_string).collect(),
            ));
        }

        fn report(&self, level: ReportLevel, report: Report) {
            self.reports.lock().unwrap().push((level, report.resolve()));
        }
    }

    fn adapter(reporters: Vec<Arc<dyn ExecutionReporter>>) -> ExecutionReporterAdapter {
        let model = InputParameterModel::new(
            "m",
            1,
            vec![Parameter::new("os", ["linux", "mac"]), Parameter::new("cores", [1i64, 8])],
        );
        let converter = IndexModelConverter::new(&model).unwrap();
        ExecutionReporterAdapter::new(Arc::new(converter), reporters)
    }

    #[test]
    fn test_reports_below_threshold_are_never_built() {
        let quiet = Arc::new(Recording {
            level: ReportLevel::Warn,
            ..Default::default()
        });
        let adapter = adapter(vec![quiet.clone() as Arc<dyn ExecutionReporter>]);
        let built = AtomicUsize::new(0);
        adapter.report_with(ReportLevel::Debug, &|| {
            built.fetch_add(1, Ordering::SeqCst);
            Report::text("noise")
        });
        assert_eq!(built.load(Ordering::SeqCst), 0);
        assert!(quiet.reports.lock().unwrap().is_empty());
    }

    #[test]
    fn test_report_converted_once_for_all_listeners() {
        let a = Arc::new(Recording {
            level: ReportLevel::Debug,
            ..Default::default()
        });
        let b = Arc::new(Recording {
            level: ReportLevel::Trace,
            ..Default::default()
        });
        let adapter = adapter(vec![
            a.clone() as Arc<dyn ExecutionReporter>,
            b.clone() as Arc<dyn ExecutionReporter>,
        ]);
        let built = AtomicUsize::new(0);
        adapter.report_with(ReportLevel::Info, &|| {
            built.fetch_add(1, Ordering::SeqCst);
            Report::new(
                "uncoverable {0}",
                vec![ReportArgument::Combination(Combination::from(vec![1, 0]))],
            )
        });
        assert_eq!(built.load(Ordering::SeqCst), 1);
        for r in [&a, &b] {
            assert_eq!(
                r.reports.lock().unwrap().as_slice(),
                &[(ReportLevel::Info, "uncoverable {os=mac, cores=1}".to_string())]
            );
        }
    }

    #[test]
    fn test_group_generated_is_translated() {
        let listener = Arc::new(Recording::default());
        let adapter = adapter(vec![listener.clone() as Arc<dyn ExecutionReporter>]);
        let group = TestInputGroup {
            id: GroupId::Named("positive t-wise".to_string()),
            combinations: vec![Combination::from(vec![0, 1])],
            characterization: None,
        };
        adapter.test_input_group_generated(&group, "ipog");
        assert_eq!(
            listener.groups.lock().unwrap().as_slice(),
            &[(
                "positive t-wise".to_string(), vec!["{os=linux, cores=8}".to_string()]
            )]
        );
    }

    #[test]
    fn test_life_cycle_skipped_above_info_threshold() {
        let listener = Arc::new(Recording {
            level: ReportLevel::Error,
            ..Default::default()
        });
        let adapter = adapter(vec![listener.clone() as Arc<dyn ExecutionReporter>]);
        let group = TestInputGroup {
            id: GroupId::Named("g".to_string()),
            combinations: vec![Combination::from(vec![0, 0])],
            characterization: None,
        };
        adapter.test_input_group_generated(&group, "ipog");
        assert!(listener.groups.lock().unwrap().is_empty());
    }
}
