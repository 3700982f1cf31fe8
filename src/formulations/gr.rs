//! Sorting by transpositions.
//!
//! The permutation is tracked through N states `k = 0..N`: state 0 is the
//! source order and state N−1 the target. Step `k ≥ 1` turns state k−1 into
//! state k by exchanging the adjacent blocks `[a, b)` and `[b, c)` or by
//! doing nothing.
//!
//! ```text
//! B[i][j][k] ∈ {0,1}      position i holds value j in state k
//! T[a][b][c][k] ∈ {0,1}   step k applies transposition (a, b, c), 0 ≤ a < b < c ≤ N
//! t[k] ∈ {0,1}            step k is active
//!
//! min Σ_k t[k]
//! ```
//!
//! Model after Dias and Souza, "Polynomial-sized ILP models for rearrangement
//! distance problems" (BSB 2007 poster proceedings), with 0-based positions.

use std::fmt;

use crate::domain::{Constraint, LinearExpr, MipModel, OptimizationType, Solution, Variable, VarId};
use crate::instances::GrInstance;

use super::indexing::{KeyedVars, Tensor};
use super::{Formulation, FormulationError, Result};

/// Largest permutation accepted; the propagation family grows as O(N⁵).
pub const GR_MAX_LENGTH: usize = 12;

/// Exchange of the adjacent blocks `[a, b)` and `[b, c)`, with `a < b < c`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Transposition {
    a: usize,
    b: usize,
    c: usize,
}

impl Transposition {
    /// `None` unless `a < b < c`
    pub fn new(a: usize, b: usize, c: usize) -> Option<Self> {
        if a < b && b < c {
            Some(Self { a, b, c })
        } else {
            None
        }
    }

    pub fn a(&self) -> usize {
        self.a
    }

    pub fn b(&self) -> usize {
        self.b
    }

    pub fn c(&self) -> usize {
        self.c
    }

    /// Every transposition of a length-`n` sequence
    pub fn all(n: usize) -> Vec<Transposition> {
        let mut all = Vec::new();
        for a in 0..n {
            for b in (a + 1)..n {
                for c in (b + 1)..=n {
                    all.push(Transposition { a, b, c });
                }
            }
        }
        all
    }

    /// Whether position `i` moves under this transposition
    pub fn covers(&self, i: usize) -> bool {
        self.a <= i && i < self.c
    }

    /// Old position of the value that lands on position `i`
    pub fn source_of(&self, i: usize) -> usize {
        let Transposition { a, b, c } = *self;
        if !self.covers(i) {
            i
        } else if i < a + c - b {
            i + b - a
        } else {
            i - (c - b)
        }
    }

    /// `perm` must have at least `c` elements.
    pub fn apply(&self, perm: &[usize]) -> Vec<usize> {
        (0..perm.len()).map(|i| perm[self.source_of(i)]).collect()
    }
}

impl fmt::Display for Transposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.a, self.b, self.c)
    }
}

/// Variable layout of the transposition-distance model
pub struct GrFormulation {
    /// `b[[position, value, state]]`
    b: Tensor<3>,
    /// `active[k - 1]` is `t[k]`
    active: Vec<VarId>,
    moves: KeyedVars<(Transposition, usize)>,
}

impl GrFormulation {
    fn t(&self, k: usize) -> VarId {
        self.active[k - 1]
    }
}

/// Optimal sorting sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrSolution {
    /// Transpositions in the order they are applied
    pub transpositions: Vec<Transposition>,
    /// Permutation after each state `0..N`
    pub states: Vec<Vec<usize>>,
    /// `t[k]` for steps `1..N`
    pub active_steps: Vec<bool>,
}

impl GrSolution {
    /// Transposition distance found
    pub fn count(&self) -> usize {
        self.transpositions.len()
    }
}

impl Formulation for GrFormulation {
    type Instance = GrInstance;
    type Output = GrSolution;

    const NAME: &'static str = "gr";

    fn validate(instance: &GrInstance) -> Result<()> {
        instance.validate()?;
        if instance.len() > GR_MAX_LENGTH {
            return Err(FormulationError::UnsupportedSize(format!(
                "permutations of length {} exceed the limit of {}",
                instance.len(),
                GR_MAX_LENGTH
            )));
        }
        Ok(())
    }

    fn build(instance: &GrInstance) -> Result<(MipModel, Self)> {
        let n = instance.len();
        let transpositions = Transposition::all(n);

        let mut model = MipModel::new("genome_rearrangement");
        model.set_sense(OptimizationType::Minimize);

        let b = Tensor::build([n, n, n], |[i, j, k]| {
            model.add_variable(Variable::binary(format!("B_{}_{}_{}", i, j, k)))
        });
        let mut moves = KeyedVars::new();
        for &tr in &transpositions {
            for k in 1..n {
                let name = format!("T_{}_{}_{}_{}", tr.a, tr.b, tr.c, k);
                moves.insert((tr, k), model.add_variable(Variable::binary(name)));
            }
        }
        let active: Vec<VarId> = (1..n)
            .map(|k| model.add_variable(Variable::binary(format!("t_{}", k)).with_objective(1.0)))
            .collect();
        let formulation = GrFormulation { b, active, moves };
        let b = &formulation.b;

        for i in 0..n {
            model.add_constraint(
                Constraint::eq(LinearExpr::sum([b[[i, instance.source[i], 0]]]), 1.0)
                    .with_name(format!("source_{}", i)),
            );
            model.add_constraint(
                Constraint::eq(LinearExpr::sum([b[[i, instance.target[i], n - 1]]]), 1.0)
                    .with_name(format!("target_{}", i)),
            );
        }

        // every state is a permutation
        for k in 0..n {
            for i in 0..n {
                let row = LinearExpr::sum((0..n).map(|j| b[[i, j, k]]));
                model.add_constraint(Constraint::eq(row, 1.0).with_name(format!("row_{}_{}", i, k)));
                let col = LinearExpr::sum((0..n).map(|p| b[[p, i, k]]));
                model.add_constraint(Constraint::eq(col, 1.0).with_name(format!("col_{}_{}", i, k)));
            }
        }

        for k in 2..n {
            let expr = LinearExpr::new()
                .term(formulation.t(k), 1.0)
                .term(formulation.t(k - 1), -1.0);
            model.add_constraint(Constraint::leq(expr, 0.0).with_name(format!("monotone_{}", k)));
        }

        for k in 1..n {
            let mut expr = LinearExpr::sum(transpositions.iter().map(|&tr| formulation.moves[&(tr, k)]));
            expr.add_term(formulation.t(k), -1.0);
            model.add_constraint(
                Constraint::eq(expr, 0.0).with_name(format!("one_transposition_{}", k)),
            );
        }

        // positions outside the applied blocks, or any position on an idle
        // step, keep their value
        for k in 1..n {
            for i in 0..n {
                let untouched: Vec<VarId> = transpositions
                    .iter()
                    .filter(|tr| !tr.covers(i))
                    .map(|&tr| formulation.moves[&(tr, k)])
                    .collect();
                for j in 0..n {
                    let mut expr = LinearExpr::sum(untouched.iter().copied());
                    expr.add_term(formulation.t(k), -1.0);
                    expr.add_term(b[[i, j, k - 1]], 1.0);
                    expr.add_term(b[[i, j, k]], -1.0);
                    model.add_constraint(
                        Constraint::leq(expr, 0.0).with_name(format!("keep_{}_{}_{}", i, j, k)),
                    );
                }
            }
        }

        // T[a,b,c,k] = 1 moves the value at old position source_of(i) to i
        for k in 1..n {
            for &tr in &transpositions {
                let step = formulation.moves[&(tr, k)];
                for i in tr.a..tr.c {
                    let from = tr.source_of(i);
                    for j in 0..n {
                        let expr = LinearExpr::new()
                            .term(step, 1.0)
                            .term(b[[from, j, k - 1]], 1.0)
                            .term(b[[i, j, k]], -1.0);
                        model.add_constraint(Constraint::leq(expr, 1.0).with_name(format!(
                            "move_{}_{}_{}_{}_{}_{}",
                            tr.a, tr.b, tr.c, i, j, k
                        )));
                    }
                }
            }
        }

        Ok((model, formulation))
    }

    fn extract(&self, _instance: &GrInstance, solution: &Solution) -> Result<GrSolution> {
        let [n, _, _] = self.b.dims();

        let mut states = Vec::with_capacity(n);
        for k in 0..n {
            let mut state = Vec::with_capacity(n);
            for i in 0..n {
                let values: Vec<usize> = (0..n).filter(|&j| solution.is_set(self.b[[i, j, k]])).collect();
                match values.as_slice() {
                    [j] => state.push(*j),
                    _ => {
                        return Err(FormulationError::InconsistentSolution(format!(
                            "position {} holds {} values in state {}",
                            i,
                            values.len(),
                            k
                        )))
                    }
                }
            }
            states.push(state);
        }

        let active_steps: Vec<bool> = (1..n).map(|k| solution.is_set(self.t(k))).collect();

        let mut transpositions = Vec::new();
        for k in 1..n {
            let chosen: Vec<Transposition> = self
                .moves
                .iter()
                .filter(|&((_, step), var)| step == k && solution.is_set(var))
                .map(|((tr, _), _)| tr)
                .collect();
            let expected = if active_steps[k - 1] { 1 } else { 0 };
            if chosen.len() != expected {
                return Err(FormulationError::InconsistentSolution(format!(
                    "step {} applies {} transpositions",
                    k,
                    chosen.len()
                )));
            }
            let next = match chosen.first() {
                Some(tr) => tr.apply(&states[k - 1]),
                None => states[k - 1].clone(),
            };
            if next != states[k] {
                return Err(FormulationError::InconsistentSolution(format!(
                    "state {} does not follow from state {}",
                    k,
                    k - 1
                )));
            }
            transpositions.extend(chosen);
        }

        Ok(GrSolution {
            transpositions,
            states,
            active_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_exchanges_adjacent_blocks() {
        let perm = vec![0, 1, 2, 3, 5, 6, 4];
        let tr = Transposition::new(3, 4, 7).unwrap();
        assert_eq!(tr.apply(&perm), vec![0, 1, 2, 5, 6, 4, 3]);
        assert_eq!(tr.to_string(), "(3, 4, 7)");
        assert_eq!(Transposition::new(0, 1, 2).unwrap().apply(&[1, 0, 2]), vec![0, 1, 2]);
        assert_eq!(Transposition::new(0, 2, 3).unwrap().apply(&[1, 2, 0]), vec![0, 1, 2]);
    }

    #[test]
    fn rejects_unordered_triples() {
        assert_eq!(Transposition::new(2, 1, 3), None);
        assert_eq!(Transposition::new(0, 2, 2), None);
        assert_eq!(Transposition::new(1, 1, 1), None);
    }

    #[test]
    fn source_of_is_a_bijection_on_the_block() {
        for tr in Transposition::all(6) {
            let mut sources: Vec<usize> = (0..6).map(|i| tr.source_of(i)).collect();
            sources.sort_unstable();
            assert_eq!(sources, (0..6).collect::<Vec<_>>(), "{:?}", tr);
        }
    }

    #[test]
    fn enumerates_ordered_triples() {
        // C(n + 1, 3) triples with c allowed to equal n
        assert_eq!(Transposition::all(3).len(), 4);
        assert_eq!(Transposition::all(7).len(), 56);
        assert!(Transposition::all(4).iter().all(|t| t.a < t.b && t.b < t.c && t.c <= 4));
    }

    #[test]
    fn model_shape() {
        let instance = GrInstance::new(vec![1, 0, 2], vec![0, 1, 2]);
        let (model, formulation) = GrFormulation::build(&instance).unwrap();
        // 27 state vars, 4 triples x 2 steps, 2 step indicators
        assert_eq!(model.num_variables(), 27 + 8 + 2);
        assert_eq!(formulation.moves.len(), 8);
        let objective: f64 = model.variables.iter().map(|v| v.objective).sum();
        assert_eq!(objective, 2.0);
    }

    #[test]
    fn hand_built_sequence_satisfies_the_model() {
        let instance = GrInstance::new(vec![1, 0, 2], vec![0, 1, 2]);
        let (model, formulation) = GrFormulation::build(&instance).unwrap();

        // step 1 swaps the first two positions, step 2 idles
        let states = [vec![1, 0, 2], vec![0, 1, 2], vec![0, 1, 2]];
        let mut values = vec![0.0; model.num_variables()];
        for (k, state) in states.iter().enumerate() {
            for (i, &j) in state.iter().enumerate() {
                values[formulation.b[[i, j, k]].index()] = 1.0;
            }
        }
        values[formulation.moves[&(Transposition::new(0, 1, 2).unwrap(), 1)].index()] = 1.0;
        values[formulation.t(1).index()] = 1.0;
        assert!(model.is_satisfied_by(&values));

        let solution = Solution::optimal(1.0, values.clone());
        let result = formulation.extract(&instance, &solution).unwrap();
        assert_eq!(result.count(), 1);
        assert_eq!(result.active_steps, vec![true, false]);

        // an active step without a transposition is rejected by the model
        values[formulation.moves[&(Transposition::new(0, 1, 2).unwrap(), 1)].index()] = 0.0;
        assert!(!model.is_satisfied_by(&values));
    }

    #[test]
    fn rejects_oversized_permutations() {
        let n = GR_MAX_LENGTH + 1;
        let identity: Vec<usize> = (0..n).collect();
        let instance = GrInstance::new(identity.clone(), identity);
        assert!(matches!(
            GrFormulation::validate(&instance),
            Err(FormulationError::UnsupportedSize(_))
        ));
    }
}
