//! Cardinality constraints lowered to CNF clauses.
//!
//! Both games speak in facts of the form "exactly k of these cells are
//! mines" / "exactly one of these digits is set"; this module turns such
//! facts into clauses for the SAT engine. Small constraints get the naive
//! combinatorial encoding, larger ones a sequential-counter encoding with
//! auxiliary variables.

use itertools::Itertools;
use varisat::{ExtendFormula, Lit};

/// Above this many literals the naive encoding blows up combinatorially,
/// so switch to the sequential counter.
const NAIVE_LIMIT: usize = 12;

pub fn exactly_k(sink: &mut impl ExtendFormula, lits: &[Lit], k: usize) {
    at_most_k(sink, lits, k);
    at_least_k(sink, lits, k);
}

pub fn at_most_k(sink: &mut impl ExtendFormula, lits: &[Lit], k: usize) {
    if k >= lits.len() {
        return;
    }
    if k == 0 {
        for &lit in lits {
            sink.add_clause(&[!lit]);
        }
        return;
    }
    if lits.len() <= NAIVE_LIMIT {
        // Any k+1 of the literals contain at least one false.
        for combo in lits.iter().copied().combinations(k + 1) {
            let clause: Vec<Lit> = combo.into_iter().map(|lit| !lit).collect();
            sink.add_clause(&clause);
        }
    } else {
        sequential_at_most_k(sink, lits, k);
    }
}

pub fn at_least_k(sink: &mut impl ExtendFormula, lits: &[Lit], k: usize) {
    if k == 0 {
        return;
    }
    if k > lits.len() {
        // Unsatisfiable on its face.
        sink.add_clause(&[]);
        return;
    }
    if k == lits.len() {
        for &lit in lits {
            sink.add_clause(&[lit]);
        }
        return;
    }
    if lits.len() <= NAIVE_LIMIT {
        // Any n-k+1 of the literals contain at least one true.
        for combo in lits.iter().copied().combinations(lits.len() - k + 1) {
            sink.add_clause(&combo);
        }
    } else {
        // At least k true is at most n-k false.
        let negated: Vec<Lit> = lits.iter().map(|&lit| !lit).collect();
        sequential_at_most_k(sink, &negated, lits.len() - k);
    }
}

/// Sinz-style sequential counter: `s[i][j]` holds when at least `j` of the
/// first `i + 1` literals are true.
fn sequential_at_most_k(sink: &mut impl ExtendFormula, lits: &[Lit], k: usize) {
    let n = lits.len();
    debug_assert!(n > 0 && k > 0 && k < n);

    let mut counts: Vec<Vec<Lit>> = Vec::with_capacity(n);
    for _ in 0..n {
        counts.push((0..k).map(|_| Lit::from_var(sink.new_var(), true)).collect());
    }

    // First literal.
    sink.add_clause(&[!lits[0], counts[0][0]]);
    for j in 1..k {
        sink.add_clause(&[!counts[0][j]]);
    }

    for i in 1..n {
        // Counts only grow along the sequence.
        sink.add_clause(&[!lits[i], counts[i][0]]);
        for j in 0..k {
            sink.add_clause(&[!counts[i - 1][j], counts[i][j]]);
        }
        for j in 1..k {
            sink.add_clause(&[!lits[i], !counts[i - 1][j - 1], counts[i][j]]);
        }
        // Overflow: literal i true with k already counted.
        sink.add_clause(&[!lits[i], !counts[i - 1][k - 1]]);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use varisat::Solver;

    fn fresh(solver: &mut Solver, n: usize) -> Vec<Lit> {
        (0..n)
            .map(|_| Lit::from_var(solver.new_var(), true))
            .collect()
    }

    fn true_count(model: &[Lit], lits: &[Lit]) -> usize {
        lits.iter().filter(|lit| model.contains(lit)).count()
    }

    #[test]
    fn exactly_two_of_three() {
        let mut solver = Solver::new();
        let lits = fresh(&mut solver, 3);
        exactly_k(&mut solver, &lits, 2);
        assert!(solver.solve().unwrap());
        let model = solver.model().unwrap();
        assert_eq!(true_count(&model, &lits), 2);

        // Forcing two of them false leaves no room for two trues.
        solver.assume(&[!lits[0], !lits[1]]);
        assert!(!solver.solve().unwrap());
    }

    #[test]
    fn exactly_zero_forces_all_false() {
        let mut solver = Solver::new();
        let lits = fresh(&mut solver, 4);
        exactly_k(&mut solver, &lits, 0);
        solver.assume(&[lits[2]]);
        assert!(!solver.solve().unwrap());
        solver.assume(&[]);
        assert!(solver.solve().unwrap());
        let model = solver.model().unwrap();
        assert_eq!(true_count(&model, &lits), 0);
    }

    #[test]
    fn demanding_every_literal_forces_them_all() {
        // 14 literals is past the naive limit; k == n takes the unit path.
        let mut solver = Solver::new();
        let lits = fresh(&mut solver, 14);
        at_least_k(&mut solver, &lits, 14);
        assert!(solver.solve().unwrap());
        let model = solver.model().unwrap();
        assert_eq!(true_count(&model, &lits), 14);
    }

    #[test]
    fn demanding_more_than_available_is_unsat() {
        let mut solver = Solver::new();
        let lits = fresh(&mut solver, 2);
        at_least_k(&mut solver, &lits, 3);
        assert!(!solver.solve().unwrap());
    }

    #[test]
    fn sequential_counter_path_counts_correctly() {
        // 16 literals is past the naive limit.
        let mut solver = Solver::new();
        let lits = fresh(&mut solver, 16);
        exactly_k(&mut solver, &lits, 3);
        assert!(solver.solve().unwrap());
        let model = solver.model().unwrap();
        assert_eq!(true_count(&model, &lits), 3);

        // A fourth assumed true must be rejected.
        let picked: Vec<Lit> = lits
            .iter()
            .filter(|lit| model.contains(lit))
            .copied()
            .collect();
        let extra = lits.iter().find(|lit| !model.contains(lit)).copied().unwrap();
        let mut assumptions = picked;
        assumptions.push(extra);
        solver.assume(&assumptions);
        assert!(!solver.solve().unwrap());
    }

    #[test]
    fn sequential_counter_lower_bound() {
        let mut solver = Solver::new();
        let lits = fresh(&mut solver, 20);
        at_least_k(&mut solver, &lits, 18);
        assert!(solver.solve().unwrap());
        let model = solver.model().unwrap();
        assert!(true_count(&model, &lits) >= 18);
    }
}
