//! Sequential counter over a list of input literals.
//!
//! Register `r[i][j]` is forced true when at least `j + 1` of the first
//! `i + 1` inputs are true. Only the implication direction is encoded, which
//! is all an upper bound needs: asserting `!r[n-1][k]` limits the number of
//! true inputs to `k`. Bounds are chosen per solve through assumptions, so a
//! single counter serves every `k`.

use varisat::Lit;

use super::SatSession;

#[derive(Debug, Clone)]
pub struct SequentialCounter {
    registers: Vec<Vec<Lit>>,
}

impl SequentialCounter {
    pub fn build(session: &mut SatSession, inputs: &[Lit]) -> Self {
        let n = inputs.len();
        let mut registers: Vec<Vec<Lit>> = Vec::with_capacity(n);
        for (i, &input) in inputs.iter().enumerate() {
            let row: Vec<Lit> = (0..n).map(|_| session.new_var().positive()).collect();
            session.add_clause(&[!input, row[0]]);
            if i > 0 {
                let previous = &registers[i - 1];
                for j in 0..n {
                    session.add_clause(&[!previous[j], row[j]]);
                    if j > 0 {
                        session.add_clause(&[!input, !previous[j - 1], row[j]]);
                    }
                }
            }
            registers.push(row);
        }
        Self { registers }
    }

    pub fn input_count(&self) -> usize {
        self.registers.len()
    }

    /// Literal bounding the number of true inputs to `k`, or `None` when the
    /// bound is vacuous.
    pub fn at_most(&self, k: usize) -> Option<Lit> {
        let last = self.registers.last()?;
        last.get(k).map(|&r| !r)
    }
}
