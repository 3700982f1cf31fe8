// Domain service interface for solving mixed-integer programs
// Every backend adapter implements this contract; formulations only talk to the trait

use std::collections::HashSet;

use super::diagnostics::{self, IrreducibleSubsystem};
use super::models::{MipModel, Solution, SolverConfig};
use super::value_objects::SolutionStatus;

/// Error types for the solver service
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Could not write diagnostic {path}: {source}")]
    Diagnostic {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Domain service interface for MIP solvers
///
/// A call to [`SolverService::solve`] is a single blocking attempt bounded by
/// `SolverConfig::time_limit`; there are no retries and no progress callbacks.
pub trait SolverService: Send + Sync {
    /// Solve a model
    fn solve(&self, model: &MipModel, config: &SolverConfig) -> Result<Solution>;

    /// Validate a model without solving it
    fn validate(&self, model: &MipModel) -> Result<()> {
        let mut errors = Vec::new();

        if model.variables.is_empty() {
            errors.push("Model must have at least one variable".to_string());
        }

        let num_vars = model.num_variables();
        let mut names = HashSet::with_capacity(num_vars);

        for (i, var) in model.variables.iter().enumerate() {
            if let Some(upper) = var.upper_bound {
                if var.lower_bound > upper {
                    errors.push(format!(
                        "Variable {} '{}' has lower bound ({}) > upper bound ({})",
                        i, var.name, var.lower_bound, upper
                    ));
                }
            }
            if !var.objective.is_finite() {
                errors.push(format!("Variable {} '{}' has a non-finite cost", i, var.name));
            }
            if !names.insert(var.name.as_str()) {
                errors.push(format!("Variable name '{}' is used twice", var.name));
            }
        }

        for (i, constraint) in model.constraints.iter().enumerate() {
            for (var, coefficient) in constraint.expr.terms() {
                if var.index() >= num_vars {
                    errors.push(format!(
                        "Constraint {} '{}' references unknown variable {}",
                        i,
                        constraint.name,
                        var.index()
                    ));
                }
                if !coefficient.is_finite() {
                    errors.push(format!(
                        "Constraint {} '{}' has a non-finite coefficient",
                        i, constraint.name
                    ));
                }
            }
            if !constraint.bound.is_finite() {
                errors.push(format!(
                    "Constraint {} '{}' has a non-finite bound",
                    i, constraint.name
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SolverError::InvalidProblem(errors.join("; ")))
        }
    }

    /// Whether the constraint system admits any point, ignoring the objective
    fn is_feasible(&self, model: &MipModel, config: &SolverConfig) -> Result<bool> {
        let all: Vec<usize> = (0..model.num_constraints()).collect();
        let subproblem = model.feasibility_subproblem(&all);
        let solution = self.solve(&subproblem, &config.without_time_limit())?;
        classify_feasibility(&solution)
    }

    /// Compute an irreducible inconsistent subsystem of an infeasible model
    fn compute_iis(&self, model: &MipModel, config: &SolverConfig) -> Result<IrreducibleSubsystem> {
        diagnostics::deletion_filter(self, model, config)
    }

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Reads a zero-objective solve as a feasibility verdict.
///
/// With a zero objective nothing can be unbounded, so an undecided
/// infeasible-or-unbounded answer means infeasible. Any incumbent proves
/// feasibility, whatever stopped the solve.
pub(crate) fn classify_feasibility(solution: &Solution) -> Result<bool> {
    match solution.status {
        SolutionStatus::Optimal | SolutionStatus::Feasible => Ok(true),
        _ if solution.has_incumbent() => Ok(true),
        SolutionStatus::Infeasible | SolutionStatus::InfeasibleOrUnbounded => Ok(false),
        other => Err(SolverError::ExecutionFailed(format!(
            "feasibility check ended with status {}",
            other
        ))),
    }
}
