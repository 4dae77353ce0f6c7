//! Parameter encoding: maps model parameters to SAT boolean variables.
//!
//! Every parameter is one-hot encoded: N SAT variables for N values with an
//! exactly-one constraint (at-least-one + pairwise at-most-one). Auxiliary
//! variables (selectors, counters) are allocated after the value variables.

use varisat::{Lit, Var};

use coverweave_model::Combination;

use super::clauses::CnfClauses;

#[derive(Debug, Clone)]
pub struct ParameterEncoding {
    /// `values[p][v]` is true iff parameter `p` takes value `v`.
    values: Vec<Vec<Var>>,
    /// Exactly-one clauses for every parameter.
    pub structural_clauses: CnfClauses,
    /// Next free variable index.
    next_var: usize,
}

/// Encode parameters with the given domain sizes.
pub fn encode_parameters(sizes: &[u32]) -> ParameterEncoding {
    let mut next_var = 0;
    let mut structural_clauses = Vec::new();
    let mut values = Vec::with_capacity(sizes.len());

    for &size in sizes {
        let vars: Vec<Var> = (0..size)
            .map(|_| {
                let var = Var::from_index(next_var);
                next_var += 1;
                var
            })
            .collect();

        // At-least-one: (v1 OR v2 OR ... OR vN)
        structural_clauses.push(vars.iter().map(|v| v.positive()).collect());

        // At-most-one: pairwise (!vi OR !vj) for all i < j
        for i in 0..vars.len() {
            for j in (i + 1)..vars.len() {
                structural_clauses.push(vec![vars[i].negative(), vars[j].negative()]);
            }
        }
        values.push(vars);
    }

    ParameterEncoding {
        values,
        structural_clauses,
        next_var,
    }
}

impl ParameterEncoding {
    pub fn parameter_count(&self) -> usize {
        self.values.len()
    }

    /// Literal asserting `parameter = value`.
    pub fn lit(&self, parameter: usize, value: u32) -> Lit {
        self.values[parameter][value as usize].positive()
    }

    /// Number of variables allocated so far.
    pub fn var_count(&self) -> usize {
        self.next_var
    }

    pub fn allocate_var(&mut self) -> Var {
        let var = Var::from_index(self.next_var);
        self.next_var += 1;
        var
    }

    /// Literals fixing every assigned position of `combination`.
    pub fn assumptions(&self, combination: &Combination) -> Vec<Lit> {
        combination
            .assigned_positions()
            .filter_map(|p| combination.get(p).map(|v| self.lit(p, v)))
            .collect()
    }

    /// Literals fixing `tuple` on the `involved` positions.
    pub fn tuple_lits(&self, involved: &[usize], tuple: &[u32]) -> Vec<Lit> {
        involved
            .iter()
            .zip(tuple)
            .map(|(&p, &v)| self.lit(p, v))
            .collect()
    }

    /// Decode a SAT model back to a full combination.
    pub fn decode(&self, model: &[Lit]) -> Combination {
        let mut truth = vec![false; self.next_var];
        for lit in model {
            if lit.var().index() < truth.len() {
                truth[lit.var().index()] = lit.is_positive();
            }
        }
        let mut combination = Combination::empty(self.values.len());
        for (p, vars) in self.values.iter().enumerate() {
            if let Some(v) = vars.iter().position(|var| truth[var.index()]) {
                combination.set(p, v as u32);
            }
        }
        combination
    }
}
