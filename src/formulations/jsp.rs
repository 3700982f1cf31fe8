//! Disjunctive job-shop model (Manne, 1960).
//!
//! ```text
//! x[j][m] ∈ ℤ, 0 ≤ x ≤ M − p[j][m]   start of job j on machine m
//! z[m][j][k] ∈ {0,1}, j < k          job j precedes job k on machine m
//! Cmax ≥ max_j Σ_m p[j][m]
//!
//! min Cmax
//! x[j][σ_j(h)] ≥ x[j][σ_j(h−1)] + p[j][σ_j(h−1)]
//! Cmax ≥ x[j][σ_j(M−1)] + p[j][σ_j(M−1)]
//! x[k][m] ≥ x[j][m] + p[j][m] − M (1 − z[m][j][k])
//! x[j][m] ≥ x[k][m] + p[k][m] − M z[m][j][k]
//! ```
//!
//! `M` is the sum of every duration.

use crate::domain::{Constraint, LinearExpr, MipModel, OptimizationType, Solution, Variable, VarId};
use crate::instances::JsplibInstance;

use super::indexing::{KeyedVars, Tensor};
use super::{Formulation, Result};

pub struct JspFormulation {
    makespan: VarId,
    /// `x[[job, machine]]`
    x: Tensor<2>,
    /// keyed by `(machine, j, k)` with `j < k`
    z: KeyedVars<(usize, usize, usize)>,
}

/// Optimal schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JspSolution {
    /// `start_times[job][machine]`
    pub start_times: Vec<Vec<u64>>,
    pub makespan: u64,
}

impl JspSolution {
    pub fn completion_time(&self, instance: &JsplibInstance, job: usize, machine: usize) -> u64 {
        self.start_times[job][machine] + u64::from(instance.durations[job][machine])
    }

    /// Jobs on `machine` in processing order
    pub fn machine_sequence(&self, machine: usize) -> Vec<usize> {
        let mut jobs: Vec<usize> = (0..self.start_times.len()).collect();
        jobs.sort_by_key(|&job| (self.start_times[job][machine], job));
        jobs
    }
}

impl Formulation for JspFormulation {
    type Instance = JsplibInstance;
    type Output = JspSolution;

    const NAME: &'static str = "jsp";

    fn validate(instance: &JsplibInstance) -> Result<()> {
        Ok(instance.validate()?)
    }

    fn build(instance: &JsplibInstance) -> Result<(MipModel, Self)> {
        let jobs = instance.num_jobs;
        let machines = instance.num_machines;
        let big_m = instance.big_m() as f64;
        let p = |job: usize, machine: usize| f64::from(instance.durations[job][machine]);

        let mut model = MipModel::new("job_shop");
        model.set_sense(OptimizationType::Minimize);

        let makespan = model.add_variable(
            Variable::continuous("Cmax")
                .with_bounds(instance.makespan_lower_bound() as f64, None)
                .with_objective(1.0),
        );
        let x = Tensor::build([jobs, machines], |[j, m]| {
            model.add_variable(
                Variable::integer(format!("x_{}_{}", j, m)).with_bounds(0.0, Some(big_m - p(j, m))),
            )
        });
        let mut z = KeyedVars::new();
        for m in 0..machines {
            for j in 0..jobs {
                for k in (j + 1)..jobs {
                    let var = model.add_variable(Variable::binary(format!("z_{}_{}_{}", m, j, k)));
                    z.insert((m, j, k), var);
                }
            }
        }

        for j in 0..jobs {
            let route = &instance.precedences[j];
            for h in 1..machines {
                let (prev, next) = (route[h - 1], route[h]);
                let expr = LinearExpr::new().term(x[[j, next]], 1.0).term(x[[j, prev]], -1.0);
                model.add_constraint(
                    Constraint::geq(expr, p(j, prev)).with_name(format!("precedence_{}_{}", j, h)),
                );
            }
            let last = route[machines - 1];
            let expr = LinearExpr::new().term(makespan, 1.0).term(x[[j, last]], -1.0);
            model.add_constraint(Constraint::geq(expr, p(j, last)).with_name(format!("makespan_{}", j)));
        }

        for ((m, j, k), order) in z.iter() {
            // j before k
            let expr = LinearExpr::new()
                .term(x[[k, m]], 1.0)
                .term(x[[j, m]], -1.0)
                .term(order, -big_m);
            model.add_constraint(
                Constraint::geq(expr, p(j, m) - big_m).with_name(format!("disjunct_{}_{}_{}", m, j, k)),
            );
            // k before j
            let expr = LinearExpr::new()
                .term(x[[j, m]], 1.0)
                .term(x[[k, m]], -1.0)
                .term(order, big_m);
            model.add_constraint(
                Constraint::geq(expr, p(k, m)).with_name(format!("disjunct_{}_{}_{}", m, k, j)),
            );
        }

        Ok((model, JspFormulation { makespan, x, z }))
    }

    fn extract(&self, _instance: &JsplibInstance, solution: &Solution) -> Result<JspSolution> {
        let [jobs, machines] = self.x.dims();
        let start_times = (0..jobs)
            .map(|j| {
                (0..machines)
                    .map(|m| solution.value(self.x[[j, m]]).round().max(0.0) as u64)
                    .collect()
            })
            .collect();
        Ok(JspSolution {
            start_times,
            makespan: solution.value(self.makespan).round().max(0.0) as u64,
        })
    }
}
