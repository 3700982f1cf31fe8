// HiGHS Solver Adapter
// Implements the SolverService interface for HiGHS
// Translates a MipModel into a HiGHS row problem, solves it once and maps the status back

use crate::domain::{
    models::{MipModel, Solution as DomainSolution, SolverConfig, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{
        ConstraintType, OptimizationType, SolutionStatus as DomainSolutionStatus, VariableType,
    },
};
use highs::{HighsModelStatus, RowProblem, Sense};
use log::{debug, info, warn};
use std::time::Instant;

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for HighsSolver {
    fn solve(&self, model: &MipModel, config: &SolverConfig) -> Result<DomainSolution> {
        // Validate first
        self.validate(model)?;

        let start_time = Instant::now();

        // Use HiGHS RowProblem (add variables first, then constraints)
        let mut pb = RowProblem::default();
        let mut cols = Vec::with_capacity(model.num_variables());

        for var_def in &model.variables {
            let lower = var_def.lower_bound;
            let upper = var_def.upper();

            let col = match var_def.variable_type {
                VariableType::Integer | VariableType::Binary => {
                    pb.add_integer_column(var_def.objective, lower..=upper)
                }
                VariableType::Continuous => pb.add_column(var_def.objective, lower..=upper),
            };
            cols.push(col);
        }

        for constraint in &model.constraints {
            let terms: Vec<_> = constraint
                .expr
                .terms()
                .iter()
                .map(|&(var, coeff)| (cols[var.index()], coeff))
                .collect();

            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => {
                    pb.add_row(..=constraint.bound, &terms);
                }
                ConstraintType::Equal => {
                    pb.add_row(constraint.bound..=constraint.bound, &terms);
                }
                ConstraintType::GreaterThanOrEqual => {
                    pb.add_row(constraint.bound.., &terms);
                }
            }
        }

        let sense = if model.sense == OptimizationType::Maximize {
            Sense::Maximise
        } else {
            Sense::Minimise
        };

        let mut highs_model = pb.optimise(sense);
        highs_model.set_option("output_flag", config.verbose);
        if let Some(limit) = config.time_limit {
            highs_model.set_option("time_limit", limit);
        }
        if let Some(gap) = config.gap_tolerance {
            highs_model.set_option("mip_rel_gap", gap);
        }

        let solved = highs_model.try_solve().map_err(|status| {
            SolverError::ExecutionFailed(format!("HiGHS run failed: {:?}", status))
        })?;
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;
        let statistics = SolverStatistics::for_model(model, solve_time);

        let solution = match solved.status() {
            HighsModelStatus::Optimal => {
                let variable_values = solved.get_solution().columns().to_vec();
                let objective = model.objective_value(&variable_values);
                let mut solution = DomainSolution::optimal(objective, variable_values);
                solution.message = format!("Optimal solution found for '{}'", model.name);
                solution
            }
            HighsModelStatus::Infeasible => DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            ),
            HighsModelStatus::Unbounded => DomainSolution::new(
                DomainSolutionStatus::Unbounded,
                "Problem is unbounded: objective can be improved infinitely",
            ),
            HighsModelStatus::UnboundedOrInfeasible => DomainSolution::new(
                DomainSolutionStatus::InfeasibleOrUnbounded,
                "Presolve proved the problem infeasible or unbounded",
            ),
            HighsModelStatus::ReachedTimeLimit => {
                stopped_early(model, DomainSolutionStatus::TimeLimit, &solved)
            }
            HighsModelStatus::ReachedIterationLimit => {
                stopped_early(model, DomainSolutionStatus::IterationLimit, &solved)
            }
            status => {
                return Err(SolverError::ExecutionFailed(format!(
                    "HiGHS solver returned status: {:?}",
                    status
                )))
            }
        };

        info!(
            "HiGHS '{}': {} in {:.1} ms",
            model.name, solution, solve_time
        );
        Ok(solution.with_statistics(statistics))
    }

    fn name(&self) -> &str {
        "HiGHS"
    }
}

/// HiGHS reports column values even when it never found an incumbent, so
/// the point is only kept if it satisfies the whole model.
fn stopped_early(
    model: &MipModel,
    status: DomainSolutionStatus,
    solved: &highs::SolvedModel,
) -> DomainSolution {
    let values = solved.get_solution().columns().to_vec();
    if model.is_satisfied_by(&values) {
        let objective = model.objective_value(&values);
        debug!("'{}' stopped with incumbent {}", model.name, objective);
        DomainSolution::incumbent(status, objective, values)
    } else {
        warn!("'{}' stopped without a feasible incumbent", model.name);
        DomainSolution::new(status, "Stopped before any feasible solution was found")
    }
}
