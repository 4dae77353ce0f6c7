use crate::types::TupleListId;

/// Configuration errors detected while building or loading a model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("strength {strength} is outside 1..={parameters}")]
    InvalidStrength { strength: usize, parameters: usize },

    #[error("parameter {parameter} has an empty domain")]
    EmptyDomain { parameter: usize },

    #[error("tuple list ids must be positive")]
    ZeroTupleListId,

    #[error("tuple list id {id} is used more than once")]
    DuplicateTupleListId { id: TupleListId },

    #[error("tuple list {id} involves no parameters")]
    NoInvolvedParameters { id: TupleListId },

    #[error("tuple list {id} involves parameter {parameter} twice")]
    DuplicateInvolvedParameter { id: TupleListId, parameter: usize },

    #[error("tuple list {id} involves parameter {parameter}, model has {parameters}")]
    ParameterOutOfRange {
        id: TupleListId,
        parameter: usize,
        parameters: usize,
    },

    #[error("tuple list {id} has no tuples")]
    EmptyTupleList { id: TupleListId },

    #[error("tuple list {id}: tuple has {found} values, expected {expected}")]
    TupleLengthMismatch {
        id: TupleListId,
        expected: usize,
        found: usize,
    },

    #[error("tuple list {id}: value {value} of parameter {parameter} exceeds domain size {size}")]
    ValueOutOfRange {
        id: TupleListId,
        parameter: usize,
        value: u32,
        size: u32,
    },

    #[error("tuple list {id} contains a wildcard")]
    WildcardInTuple { id: TupleListId },

    #[error("unknown parameter '{name}'")]
    UnknownParameter { name: String },

    #[error("parameter '{parameter}' has no value '{value}'")]
    UnknownValue { parameter: String, value: String },

    #[error("parameter '{name}' is declared twice")]
    DuplicateParameter { name: String },

    #[error("parameter '{name}' has no values")]
    EmptyParameter { name: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
