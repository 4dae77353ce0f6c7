pub mod clauses;
pub mod counter;
pub mod encoding;

use varisat::{ExtendFormula, Lit, Var, solver::Solver};

use coverweave_model::Combination;

use encoding::ParameterEncoding;

/// Errors reported by the SAT backend.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("solver error: {0}")]
    Solver(String),

    #[error("SAT but no model returned")]
    MissingModel,
}

/// An incremental varisat solver loaded with a parameter encoding.
///
/// Constraint clauses are added once; individual checks are expressed as
/// assumptions, so the solver keeps its learned clauses between checks.
pub struct SatSession {
    solver: Solver<'static>,
    encoding: ParameterEncoding,
}

impl SatSession {
    pub fn new(encoding: ParameterEncoding) -> Self {
        let mut solver = Solver::new();
        // Register every variable so the solver tracks it even if no real
        // clause mentions it.
        for index in 0..encoding.var_count() {
            let var = Var::from_index(index);
            solver.add_clause(&[var.positive(), var.negative()]);
        }
        for clause in &encoding.structural_clauses {
            solver.add_clause(clause);
        }
        Self { solver, encoding }
    }

    pub fn encoding(&self) -> &ParameterEncoding {
        &self.encoding
    }

    /// Allocate and register an auxiliary variable.
    pub fn new_var(&mut self) -> Var {
        let var = self.encoding.allocate_var();
        self.solver.add_clause(&[var.positive(), var.negative()]);
        var
    }

    pub fn add_clause(&mut self, clause: &[Lit]) {
        self.solver.add_clause(clause);
    }

    pub fn add_clauses(&mut self, clauses: &[Vec<Lit>]) {
        for clause in clauses {
            self.solver.add_clause(clause);
        }
    }

    pub fn solve_under(&mut self, assumptions: &[Lit]) -> Result<bool, SolverError> {
        self.solver.assume(assumptions);
        self.solver
            .solve()
            .map_err(|e| SolverError::Solver(e.to_string()))
    }

    /// Whether `combination` extends to a full assignment, with extra
    /// assumptions on top.
    pub fn is_extendable(
        &mut self,
        combination: &Combination,
        extra: &[Lit],
    ) -> Result<bool, SolverError> {
        let mut assumptions = self.encoding.assumptions(combination);
        assumptions.extend_from_slice(extra);
        self.solve_under(&assumptions)
    }

    /// Full combination of the last satisfying assignment.
    pub fn model_combination(&self) -> Result<Combination, SolverError> {
        let model = self.solver.model().ok_or(SolverError::MissingModel)?;
        Ok(self.encoding.decode(&model))
    }
}
