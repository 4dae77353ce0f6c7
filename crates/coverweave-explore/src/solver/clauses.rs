//! Clause builders for tuple constraints over a [`ParameterEncoding`].
//!
//! - **forbid**: at least one involved parameter differs from the tuple.
//! - **guarded**: a clause only active while a selector literal is true, so a
//!   solver session can switch constraints on and off through assumptions.
//! - **require**: the selector forces the tuple onto its parameters.

use varisat::Lit;

use super::encoding::ParameterEncoding;

/// A list of CNF clauses.
pub type CnfClauses = Vec<Vec<Lit>>;

/// `(!p1=v1 OR ... OR !pk=vk)`
pub fn forbid_tuple(encoding: &ParameterEncoding, involved: &[usize], tuple: &[u32]) -> Vec<Lit> {
    encoding
        .tuple_lits(involved, tuple)
        .into_iter()
        .map(|lit| !lit)
        .collect()
}

/// `(!selector OR !p1=v1 OR ... OR !pk=vk)`
pub fn guarded_forbid(
    encoding: &ParameterEncoding,
    selector: Lit,
    involved: &[usize],
    tuple: &[u32],
) -> Vec<Lit> {
    let mut clause = vec![!selector];
    clause.extend(forbid_tuple(encoding, involved, tuple));
    clause
}

/// `selector -> (p1=v1 AND ... AND pk=vk)` as one binary clause per parameter.
pub fn guarded_require(
    encoding: &ParameterEncoding,
    selector: Lit,
    involved: &[usize],
    tuple: &[u32],
) -> CnfClauses {
    encoding
        .tuple_lits(involved, tuple)
        .into_iter()
        .map(|lit| vec![!selector, lit])
        .collect()
}

/// `(p1=v1 AND ... AND pk=vk) -> indicator`
pub fn match_implies(
    encoding: &ParameterEncoding,
    indicator: Lit,
    involved: &[usize],
    tuple: &[u32],
) -> Vec<Lit> {
    let mut clause = forbid_tuple(encoding, involved, tuple);
    clause.push(indicator);
    clause
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::encoding::encode_parameters;
    use varisat::{ExtendFormula, Var, solver::Solver};

    fn solver_for(encoding: &ParameterEncoding) -> Solver<'static> {
        let mut solver = Solver::new();
        for clause in &encoding.structural_clauses {
            solver.add_clause(clause);
        }
        solver
    }

    #[test]
    fn test_forbid_tuple_blocks_only_that_tuple() {
        let enc = encode_parameters(&[2, 2]);
        let mut solver = solver_for(&enc);
        solver.add_clause(&forbid_tuple(&enc, &[0, 1], &[0, 0]));

        solver.assume(&[enc.lit(0, 0), enc.lit(1, 0)]);
        assert!(!solver.solve().unwrap());
        solver.assume(&[enc.lit(0, 0), enc.lit(1, 1)]);
        assert!(solver.solve().unwrap());
    }

    #[test]
    fn test_guarded_forbid_follows_selector() {
        let mut enc = encode_parameters(&[2]);
        let selector = enc.allocate_var().positive();
        let mut solver = solver_for(&enc);
        solver.add_clause(&[selector, !selector]);
        solver.add_clause(&guarded_forbid(&enc, selector, &[0], &[1]));

        solver.assume(&[enc.lit(0, 1), selector]);
        assert!(!solver.solve().unwrap());
        solver.assume(&[enc.lit(0, 1), !selector]);
        assert!(solver.solve().unwrap());
    }

    #[test]
    fn test_guarded_require_forces_tuple() {
        let mut enc = encode_parameters(&[3, 3]);
        let selector = enc.allocate_var().positive();
        let mut solver = solver_for(&enc);
        for clause in guarded_require(&enc, selector, &[0, 1], &[2, 1]) {
            solver.add_clause(&clause);
        }
        solver.assume(&[selector]);
        assert!(solver.solve().unwrap());
        let decoded = enc.decode(&solver.model().unwrap());
        assert_eq!(decoded.values(), &[2, 1]);
    }

    #[test]
    fn test_match_implies_sets_indicator() {
        let mut enc = encode_parameters(&[2]);
        let indicator: Var = enc.allocate_var();
        let mut solver = solver_for(&enc);
        solver.add_clause(&match_implies(&enc, indicator.positive(), &[0], &[0]));
        solver.assume(&[enc.lit(0, 0), indicator.negative()]);
        assert!(!solver.solve().unwrap());
    }
}
