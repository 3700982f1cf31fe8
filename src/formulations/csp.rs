//! Closest string: find a center string minimising the largest Hamming
//! distance to every input string.
//!
//! ```text
//! x[i][j] ∈ {0,1}   position i of the center holds symbol j
//! d ≥ 0             radius
//!
//! min d
//! Σ_j x[i][j] = 1                     for every position i
//! L − Σ_i x[i][sym(s_i)] ≤ d          for every input string s
//! ```

use crate::domain::{Constraint, LinearExpr, MipModel, OptimizationType, Solution, Variable, VarId};
use crate::instances::csp::hamming_distance;
use crate::instances::CspInstance;

use super::indexing::Tensor;
use super::{Formulation, FormulationError, Result};

/// Variable layout of the closest string model
pub struct CspFormulation {
    /// `x[[position, symbol]]`
    x: Tensor<2>,
    radius: VarId,
}

/// Recovered center string and its radius
#[derive(Debug, Clone, PartialEq)]
pub struct CspSolution {
    pub center: String,
    pub radius: u32,
}

impl CspSolution {
    /// Largest Hamming distance from the center to any input string
    pub fn max_distance(&self, instance: &CspInstance) -> usize {
        instance
            .strings
            .iter()
            .map(|s| hamming_distance(s, &self.center))
            .max()
            .unwrap_or(0)
    }
}

impl Formulation for CspFormulation {
    type Instance = CspInstance;
    type Output = CspSolution;

    const NAME: &'static str = "csp";

    fn validate(instance: &CspInstance) -> Result<()> {
        Ok(instance.validate()?)
    }

    fn build(instance: &CspInstance) -> Result<(MipModel, Self)> {
        let length = instance.string_length();
        let symbols = instance.symbol_indices();

        let mut model = MipModel::new("closest_string");
        model.set_sense(OptimizationType::Minimize);

        let x = Tensor::build([length, instance.alphabet_size()], |[i, j]| {
            model.add_variable(Variable::binary(format!(
                "x_{}_{}",
                i, instance.alphabet[j]
            )))
        });
        let radius = model.add_variable(
            Variable::continuous("min_hamming_dist")
                .with_bounds(0.0, None)
                .with_objective(1.0),
        );

        for i in 0..length {
            let expr = LinearExpr::sum((0..instance.alphabet_size()).map(|j| x[[i, j]]));
            model.add_constraint(Constraint::eq(expr, 1.0).with_name(format!("one_symbol_{}", i)));
        }

        // L − matches ≤ d, written as  −matches − d ≤ −L
        for (s, string) in instance.strings.iter().enumerate() {
            let mut expr: LinearExpr = string
                .chars()
                .enumerate()
                .map(|(i, c)| (x[[i, symbols[&c]]], -1.0))
                .collect();
            expr.add_term(radius, -1.0);
            model.add_constraint(
                Constraint::leq(expr, -(length as f64)).with_name(format!("hamming_{}", s)),
            );
        }

        Ok((model, CspFormulation { x, radius }))
    }

    fn extract(&self, instance: &CspInstance, solution: &Solution) -> Result<CspSolution> {
        let [length, alphabet_size] = self.x.dims();
        let mut center = String::with_capacity(length);
        for i in 0..length {
            let chosen: Vec<usize> = (0..alphabet_size)
                .filter(|&j| solution.is_set(self.x[[i, j]]))
                .collect();
            match chosen.as_slice() {
                [j] => center.push(instance.alphabet[*j]),
                _ => {
                    return Err(FormulationError::InconsistentSolution(format!(
                        "position {} selects {} symbols",
                        i,
                        chosen.len()
                    )))
                }
            }
        }
        Ok(CspSolution {
            center,
            radius: solution.value(self.radius).round() as u32,
        })
    }
}
