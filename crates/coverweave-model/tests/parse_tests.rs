use coverweave_model::parse::parse_model;
use coverweave_model::{ModelError, TupleListId};

#[test]
fn test_parse_model_from_file() {
    let json = include_str!("fixtures/login_model.json");
    let model = parse_model(json).unwrap();
    assert_eq!(model.strength(), 2);
    assert_eq!(model.sizes(), &[3, 3, 2, 2]);
    assert_eq!(model.exclusions().len(), 1);
    assert_eq!(model.errors().len(), 2);
    let correct = model.error_list(TupleListId(3)).unwrap();
    assert!(correct.is_marked_as_correct());
    assert!(!model.error_list(TupleListId(2)).unwrap().is_marked_as_correct());
}

#[test]
fn test_parse_invalid_json() {
    let result = parse_model("not json at all");
    assert!(matches!(result, Err(ModelError::Json(_))));
}

#[test]
fn test_parse_without_constraints() {
    let model = parse_model(r#"{ "strength": 1, "sizes": [2, 2] }"#).unwrap();
    assert!(!model.has_constraints());
}

#[test]
fn test_parse_rejects_invalid_strength() {
    let result = parse_model(r#"{ "strength": 3, "sizes": [2, 2] }"#);
    assert!(result.is_err());
    let message = result.unwrap_err().to_string();
    assert!(message.contains("strength 3"), "unexpected message: {message}");
}

#[test]
fn test_parse_rejects_out_of_range_value() {
    let json = r#"{
        "strength": 1, "sizes": [2], "exclusions": [ { "id": 1, "involved": [0], "tuples": [[7]] } ]
    }"#;
    assert!(parse_model(json).is_err());
}

#[test]
fn test_parse_rejects_malformed_tuple_list() {
    let json = r#"{
        "strength": 1, "sizes": [2, 2],
        "errors": [ { "id": 1, "involved": [0, 1], "tuples": [[0]] } ]
    }"#;
    assert!(parse_model(json).is_err());
}

#[test]
fn test_serialized_model_parses_back() {
    let json = include_str!("fixtures/login_model.json");
    let model = parse_model(json).unwrap();
    let encoded = serde_json::to_string(&model).unwrap();
    assert_eq!(parse_model(&encoded).unwrap(), model);
}
