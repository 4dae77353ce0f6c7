//! Test input generation and constraint analysis.
//!
//! - [`ipog`]: the IPOG covering array algorithm, generic over parameter order
//!   and coverage target
//! - [`generator`]: positive t-wise groups
//! - [`ipogneg`]: negative groups isolating one error tuple list each
//! - [`conflict`]: detection and diagnosis of error tuples the constraints
//!   make impossible to realize

pub mod checker;
pub mod conflict;
pub mod error;
pub mod generator;
pub mod ipog;
pub mod ipogneg;
pub mod solver;

pub use checker::{
    ConstraintChecker, HardConstraintChecker, NegatedConstraintChecker, NoConstraintChecker,
};
pub use error::GenerationError;
pub use generator::{
    FaultCharacterizationConfig, GroupId, Ipog, TestInputGroup, TestInputGroupGenerator,
};
pub use ipogneg::IpogNeg;
