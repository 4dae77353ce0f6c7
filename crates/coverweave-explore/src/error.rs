use coverweave_model::{ModelError, TupleListId};

use crate::solver::SolverError;

/// Errors raised while generating test input groups.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("model has no error tuple list with id {id}")]
    UnknownErrorList { id: TupleListId },
}
