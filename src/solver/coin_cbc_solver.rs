use crate::domain::{
    models::{MipModel, Solution as DomainSolution, SolverConfig, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{
        ConstraintType, OptimizationType, SolutionStatus as DomainSolutionStatus, VariableType,
    },
};
use good_lp::{
    solvers::coin_cbc, variable, variables, Expression, ResolutionError,
    Solution as GoodLpSolutionTrait, SolverModel, Variable as GoodLpVariable,
};
use log::info;
use std::time::Instant;

pub struct CoinCbcSolver;

impl CoinCbcSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for CoinCbcSolver {
    fn solve(&self, model: &MipModel, config: &SolverConfig) -> Result<DomainSolution> {
        // Validate first
        self.validate(model)?;

        let start_time = Instant::now();

        // Build variables using good_lp
        let mut vars = variables!();
        let mut lp_variables: Vec<GoodLpVariable> = Vec::with_capacity(model.num_variables());

        for var_def in model.variables.iter() {
            let lower = var_def.lower_bound;
            let upper = var_def.upper();

            let var = match var_def.variable_type {
                VariableType::Binary => vars.add(variable().binary().name(&var_def.name)),
                VariableType::Integer => vars.add(
                    variable()
                        .integer()
                        .min(lower)
                        .max(upper)
                        .name(&var_def.name),
                ),
                VariableType::Continuous => {
                    vars.add(variable().min(lower).max(upper).name(&var_def.name))
                }
            };
            lp_variables.push(var);
        }

        // good_lp minimises, so negate for maximisation
        let is_maximize = model.sense == OptimizationType::Maximize;
        let mut obj_expr: Expression = 0.into();
        for (var_def, &var) in model.variables.iter().zip(&lp_variables) {
            if var_def.objective != 0.0 {
                let c = if is_maximize {
                    -var_def.objective
                } else {
                    var_def.objective
                };
                obj_expr += c * var;
            }
        }

        let mut lp_model = vars.minimise(obj_expr).using(coin_cbc::coin_cbc);
        lp_model.set_parameter("log", if config.verbose { "1" } else { "0" });
        if let Some(limit) = config.time_limit {
            lp_model.set_parameter("seconds", &limit.to_string());
        }
        if let Some(gap) = config.gap_tolerance {
            lp_model.set_parameter("ratioGap", &gap.to_string());
        }

        for constraint in &model.constraints {
            let mut lhs: Expression = 0.into();
            for &(var, coeff) in constraint.expr.terms() {
                lhs += coeff * lp_variables[var.index()];
            }

            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => {
                    lp_model = lp_model.with(lhs.leq(constraint.bound));
                }
                ConstraintType::Equal => {
                    lp_model = lp_model.with(lhs.eq(constraint.bound));
                }
                ConstraintType::GreaterThanOrEqual => {
                    lp_model = lp_model.with(lhs.geq(constraint.bound));
                }
            }
        }

        let solution_result = lp_model.solve();
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;
        let statistics = SolverStatistics::for_model(model, solve_time);

        let solution = match solution_result {
            Ok(sol) => {
                let variable_values: Vec<f64> =
                    lp_variables.iter().map(|&var| sol.value(var)).collect();
                let objective = model.objective_value(&variable_values);
                let mut solution = DomainSolution::optimal(objective, variable_values);
                solution.message = format!("Optimal solution found for '{}'", model.name);
                solution
            }
            Err(ResolutionError::Infeasible) => DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            ),
            Err(ResolutionError::Unbounded) => DomainSolution::new(
                DomainSolutionStatus::Unbounded,
                "Problem is unbounded: objective can be improved infinitely",
            ),
            // CBC reports "Stopped" when the seconds budget runs out; good_lp
            // does not hand back the incumbent in that case
            Err(ResolutionError::Other(reason)) if reason.contains("Stopped") => {
                DomainSolution::new(DomainSolutionStatus::TimeLimit, reason.to_string())
            }
            Err(e) => return Err(SolverError::ExecutionFailed(format!("{:?}", e))),
        };

        info!(
            "CBC '{}': {} in {:.1} ms",
            model.name, solution, solve_time
        );
        Ok(solution.with_statistics(statistics))
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }
}
