use std::sync::Arc;

use coverweave_explore::conflict::{
    ConflictDetectionConfig, ConflictDetectionManager, ConflictExplanation, DiagnosisElement,
    HittingSetMode,
};
use coverweave_explore::{IpogNeg, TestInputGroupGenerator};
use coverweave_model::{NoopReporter, TestModel, TupleList, TupleListId};

fn list(id: u32, involved: Vec<usize>, tuples: Vec<Vec<u32>>) -> TupleList {
    TupleList::new(TupleListId(id), involved, tuples).unwrap()
}

fn detector(model: TestModel, config: ConflictDetectionConfig) -> ConflictDetectionManager {
    ConflictDetectionManager::new(config, Arc::new(model)).unwrap()
}

fn explained() -> ConflictDetectionConfig {
    ConflictDetectionConfig {
        enabled: true,
        explanation_enabled: true,
        ..Default::default()
    }
}

/// Two error lists over the same parameters that block each other's tuples.
fn overlapping_errors_model() -> TestModel {
    let errors = vec![
        list(1, vec![0, 1], vec![vec![1, 0], vec![2, 0], vec![0, 1], vec![0, 2]]),
        list(2, vec![0, 1], vec![vec![0, 1], vec![2, 1], vec![1, 0], vec![1, 2]]),
        list(3, vec![2], vec![vec![2]]),
    ];
    TestModel::new(2, vec![3, 3, 3], vec![], errors).unwrap()
}

#[test]
fn test_no_conflicts_without_overlap() {
    let errors = vec![list(1, vec![0], vec![vec![0]]), list(2, vec![1], vec![vec![1]])];
    let model = TestModel::new(2, vec![2, 2], vec![], errors).unwrap();
    let missing = detector(model, explained()).detect_missing_invalid_tuples().unwrap();
    assert!(missing.is_empty());
}

#[test]
fn test_exclusion_blocking_error_tuple() {
    let model = TestModel::new(
        1,
        vec![2, 2],
        vec![list(2, vec![0, 1], vec![vec![0, 0], vec![0, 1]])],
        vec![list(1, vec![0], vec![vec![0]])],
    )
    .unwrap();
    let missing = detector(model, explained()).detect_missing_invalid_tuples().unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].error_list, TupleListId(1));
    assert_eq!(missing[0].values, vec![0]);
    match &missing[0].explanation {
        ConflictExplanation::ConflictSet { conflict } => {
            assert_eq!(conflict.len(), 2);
            assert!(conflict.iter().all(|e| e.list == TupleListId(2)));
        }
        other => panic!("expected conflict set, got {other:?}"),
    }
}

#[test]
fn test_mutually_blocking_error_lists() {
    let missing = detector(overlapping_errors_model(), explained())
        .detect_missing_invalid_tuples()
        .unwrap();
    let found: Vec<(TupleListId, Vec<u32>)> = missing
        .iter()
        .map(|m| (m.error_list, m.values.clone()))
        .collect();
    assert_eq!(
        found,
        vec![
            (TupleListId(1), vec![1, 0]),
            (TupleListId(1), vec![0, 1]),
            (TupleListId(2), vec![0, 1]),
            (TupleListId(2), vec![1, 0]),
        ]
    );
    for m in &missing {
        let ConflictExplanation::ConflictSet { conflict } = &m.explanation else {
            panic!("expected conflict set, got {:?}", m.explanation);
        };
        assert_eq!(conflict.len(), 1);
        assert_ne!(conflict[0].list, m.error_list);
        assert_eq!(conflict[0].values, m.values);
    }
}

#[test]
fn test_detection_without_explanation_reports_unknown() {
    let config = ConflictDetectionConfig {
        enabled: true,
        ..Default::default()
    };
    let missing = detector(overlapping_errors_model(), config)
        .detect_missing_invalid_tuples()
        .unwrap();
    assert_eq!(missing.len(), 4);
    assert!(missing
        .iter()
        .all(|m| m.explanation == ConflictExplanation::Unknown));
}

#[test]
fn test_correct_constraints_form_background() {
    let model = TestModel::new(
        1,
        vec![2, 2],
        vec![list(2, vec![0, 1], vec![vec![0, 0], vec![0, 1]]).mark_as_correct()],
        vec![list(1, vec![0], vec![vec![0]])],
    )
    .unwrap();
    let missing = detector(model, ConflictDetectionConfig::diagnosing())
        .detect_missing_invalid_tuples()
        .unwrap();
    assert_eq!(missing.len(), 1);
    match &missing[0].explanation {
        ConflictExplanation::InconsistentBackground { background } => {
            assert_eq!(background.len(), 2);
        }
        other => panic!("expected inconsistent background, got {other:?}"),
    }
}

#[test]
fn test_diagnoses_and_hitting_sets_resolve_conflicts() {
    let model = TestModel::new(
        1,
        vec![2, 2],
        vec![list(2, vec![0, 1], vec![vec![0, 0], vec![0, 1]])],
        vec![list(1, vec![0], vec![vec![0]])],
    )
    .unwrap();
    let mut config = ConflictDetectionConfig::diagnosing();
    config.hitting_set_mode = HittingSetMode::AllMinimal;
    let manager = detector(model.clone(), config);
    let missing = manager.detect_missing_invalid_tuples().unwrap();
    let ConflictExplanation::DiagnosisSets { diagnoses, .. } = &missing[0].explanation else {
        panic!("expected diagnoses");
    };
    assert_eq!(diagnoses.len(), 2);

    let sets = manager.compute_minimal_diagnosis_hitting_sets(&missing).unwrap();
    assert_eq!(sets.len(), 3);
    assert!(sets.iter().all(|s| s.len() == 1));
    assert!(sets.iter().any(|s| s.elements
        == vec![DiagnosisElement {
            list: TupleListId(1),
            involved: vec![0],
            values: vec![0],
        }]));

    for set in &sets {
        let relaxed = set.apply(&model).unwrap();
        let again = detector(relaxed, ConflictDetectionConfig::diagnosing())
            .detect_missing_invalid_tuples()
            .unwrap();
        assert!(again.is_empty(), "hitting set {set} left conflicts");
    }
}

#[test]
fn test_hitting_sets_on_mutual_conflicts() {
    let model = overlapping_errors_model();
    let manager = detector(model.clone(), ConflictDetectionConfig::diagnosing());
    let missing = manager.detect_missing_invalid_tuples().unwrap();
    let sets = manager.compute_minimal_diagnosis_hitting_sets(&missing).unwrap();
    // Each clash is resolved by dropping the shared tuple from either list.
    assert!(!sets.is_empty());
    assert!(sets.iter().all(|s| s.len() == 2));
    for set in &sets {
        let relaxed = set.apply(&model).unwrap();
        let again = detector(relaxed, ConflictDetectionConfig::diagnosing())
            .detect_missing_invalid_tuples()
            .unwrap();
        assert!(again.is_empty(), "hitting set {set} left conflicts");
    }
}

#[test]
fn test_missing_tuples_match_empty_negative_groups() {
    let model = Arc::new(
        TestModel::new(
            1,
            vec![2, 2],
            vec![list(2, vec![0, 1], vec![vec![0, 0], vec![0, 1]])],
            vec![list(1, vec![0], vec![vec![0]]), list(3, vec![1], vec![vec![1]])],
        )
        .unwrap(),
    );
    let config = ConflictDetectionConfig::diagnosing();
    let missing = ConflictDetectionManager::new(config, Arc::clone(&model))
        .unwrap()
        .detect_missing_invalid_tuples()
        .unwrap();
    let groups = IpogNeg.generate(&model, &NoopReporter).unwrap();
    for group in &groups {
        let empty = group.combinations.is_empty();
        let reported = missing
            .iter()
            .any(|m| coverweave_explore::GroupId::ErrorTuples(m.error_list) == group.id);
        assert_eq!(empty, reported, "group {}", group.id);
    }
}
