use coverweave_explore::conflict::{ConflictError, DiagnosisHittingSet, MissingInvalidTuple};
use coverweave_explore::GenerationError;
use coverweave_model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("{} error tuples cannot appear in any valid test input", missing.len())]
    ConflictsDetected {
        missing: Vec<MissingInvalidTuple>,
        hitting_sets: Vec<DiagnosisHittingSet>,
    },

    #[error("initial test inputs were already generated")]
    AlreadyInitialized,

    #[error("conflict diagnosis is disabled")]
    DiagnosisDisabled,

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("a session worker panicked")]
    WorkerPanicked,

    #[error("invalid session settings: {0}")]
    Settings(#[from] serde_json::Error),
}
