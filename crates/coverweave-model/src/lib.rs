//! Index-based combinatorial test models.
//!
//! Parameters are positions `0..n`, values are indices `0..size`, and
//! constraints are lists of forbidden (exclusion) or failure-inducing (error)
//! value tuples. The named [`input`] model sits above this representation and
//! is converted into it by [`convert::IndexModelConverter`].

pub mod combination;
pub mod combinator;
pub mod convert;
pub mod error;
pub mod input;
pub mod parse;
pub mod report;
pub mod result;
pub mod types;

pub use combination::{Combination, WILDCARD};
pub use error::ModelError;
pub use report::{NoopReporter, Report, ReportArgument, ReportLevel, Reporter};
pub use result::{FailureCause, TestResult};
pub use types::{TestModel, TupleList, TupleListId};
