use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use coverweave_core::{
    BasicTestManager, CachingTestManager, InMemoryTestResultCache, SessionRunner, SessionSettings,
    SessionState, TestManager,
};
use coverweave_model::parse::parse_model;
use coverweave_model::{Combination, TestModel, TestResult};

fn settings(json: &str) -> SessionSettings {
    SessionSettings::from_json(json).unwrap()
}

#[test]
fn test_session_runs_to_completion() {
    let model = Arc::new(
        parse_model(include_str!(
            "../../coverweave-model/tests/fixtures/login_model.json"
        ))
        .unwrap(),
    );
    let settings =
        settings(r#"{ "fault_characterization": "improved_delta_debugging", "threads": 3 }"#);
    let manager = BasicTestManager::new(settings.to_config(), model);

    let summary = SessionRunner::new(settings.threads)
        .run(&manager, &|c: &Combination| {
            if c.get(2) == Some(1) {
                TestResult::failure("wrong password accepted")
            } else {
                TestResult::Success
            }
        })
        .unwrap();

    assert_eq!(manager.state(), SessionState::Done);
    assert_eq!(summary.executions, summary.results.len());
    assert!(summary.failures().all(|c| c.get(2) == Some(1)));
}

#[test]
fn test_ben_session_keeps_inputs_within_exclusions() {
    let model = Arc::new(
        parse_model(include_str!(
            "../../coverweave-model/tests/fixtures/login_model.json"
        ))
        .unwrap(),
    );
    let settings = settings(r#"{ "fault_characterization": "ben", "threads": 2 }"#);
    let manager = BasicTestManager::new(settings.to_config(), Arc::clone(&model));

    let summary = SessionRunner::new(settings.threads)
        .run(&manager, &|c: &Combination| {
            if c.get(0) == Some(0) && c.get(1) == Some(1) {
                TestResult::failure("session token leaked")
            } else {
                TestResult::Success
            }
        })
        .unwrap();

    assert_eq!(manager.state(), SessionState::Done);
    assert_eq!(summary.executions, summary.results.len());
    assert!(summary
        .results
        .keys()
        .all(|c| model.exclusions().iter().all(|list| !list.matches(c))));
}

#[test]
fn test_random_sessions_never_repeat_inputs() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..5 {
        let sizes: Vec<u32> = (0..rng.gen_range(3..6)).map(|_| rng.gen_range(2..4)).collect();
        let model = Arc::new(TestModel::unconstrained(2, sizes.clone()).unwrap());
        let culprit = rng.gen_range(0..sizes.len());
        let value = rng.gen_range(0..sizes[culprit]);

        let settings =
            settings(r#"{ "generators": ["ipog"], "fault_characterization": "iter_aifl" }"#);
        let manager = CachingTestManager::new(
            BasicTestManager::new(settings.to_config(), model),
            InMemoryTestResultCache::new(),
        );
        let summary = SessionRunner::new(4)
            .run(&manager, &move |c: &Combination| {
                if c.get(culprit) == Some(value) {
                    TestResult::failure("boom")
                } else {
                    TestResult::Success
                }
            })
            .unwrap();

        assert_eq!(summary.executions, summary.results.len());
        assert!(summary.failures().count() > 0);
        assert_eq!(manager.state(), SessionState::Done);
    }
}

#[test]
fn test_empty_session_stops_immediately() {
    let model = Arc::new(TestModel::unconstrained(1, vec![2]).unwrap());
    let manager = BasicTestManager::new(settings(r#"{ "generators": [] }"#).to_config(), model);
    let summary = SessionRunner::new(2)
        .run(&manager, &|_: &Combination| TestResult::Success)
        .unwrap();
    assert!(summary.results.is_empty());
    assert_eq!(summary.executions, 0);
}
