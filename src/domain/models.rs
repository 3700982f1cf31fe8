use std::fmt;
use std::path::PathBuf;

use super::value_objects::{
    ConstraintType, OptimizationType, SolutionStatus, SolverBackend, VariableType,
};

/// Feasibility tolerance used when re-checking incumbents
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Handle of a variable inside the [`MipModel`] that created it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Column index of the variable in its model
    pub fn index(self) -> usize {
        self.0
    }
}

/// Decision variable in an optimization problem
#[derive(Debug, Clone)]
pub struct Variable {
    pub variable_type: VariableType,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub objective: f64,
    pub name: String,
}

impl Variable {
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Continuous,
            lower_bound: 0.0,
            upper_bound: None,
            objective: 0.0,
            name: name.into(),
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Integer,
            lower_bound: 0.0,
            upper_bound: None,
            objective: 0.0,
            name: name.into(),
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Binary,
            lower_bound: 0.0,
            upper_bound: Some(1.0),
            objective: 0.0,
            name: name.into(),
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: Option<f64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    /// Objective coefficient of the variable
    pub fn with_objective(mut self, coefficient: f64) -> Self {
        self.objective = coefficient;
        self
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.variable_type,
            VariableType::Integer | VariableType::Binary
        )
    }

    /// Upper bound with `None` read as +∞
    pub fn upper(&self) -> f64 {
        self.upper_bound.unwrap_or(f64::INFINITY)
    }
}

/// Sparse linear combination of model variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of the given variables, each with coefficient 1
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        vars.into_iter().map(|v| (v, 1.0)).collect()
    }

    pub fn term(mut self, var: VarId, coefficient: f64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Merges repeated variables and drops zero coefficients.
    pub fn compact(mut self) -> Self {
        self.terms.sort_by_key(|(var, _)| *var);
        let mut merged: Vec<(VarId, f64)> = Vec::with_capacity(self.terms.len());
        for (var, coefficient) in self.terms {
            match merged.last_mut() {
                Some((last, acc)) if *last == var => *acc += coefficient,
                _ => merged.push((var, coefficient)),
            }
        }
        merged.retain(|(_, coefficient)| *coefficient != 0.0);
        self.terms = merged;
        self
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coefficient)| coefficient * values.get(var.0).copied().unwrap_or(0.0))
            .sum()
    }
}

impl FromIterator<(VarId, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

impl Extend<(VarId, f64)> for LinearExpr {
    fn extend<I: IntoIterator<Item = (VarId, f64)>>(&mut self, iter: I) {
        self.terms.extend(iter);
    }
}

/// Linear constraint `expr (≤ | = | ≥) bound`, named for diagnostics
#[derive(Debug, Clone)]
pub struct Constraint {
    pub constraint_type: ConstraintType,
    pub expr: LinearExpr,
    pub bound: f64,
    pub name: String,
}

impl Constraint {
    pub fn new(constraint_type: ConstraintType, expr: LinearExpr, bound: f64) -> Self {
        Self {
            constraint_type,
            expr,
            bound,
            name: String::new(),
        }
    }

    pub fn leq(expr: LinearExpr, bound: f64) -> Self {
        Self::new(ConstraintType::LessThanOrEqual, expr, bound)
    }

    pub fn eq(expr: LinearExpr, bound: f64) -> Self {
        Self::new(ConstraintType::Equal, expr, bound)
    }

    pub fn geq(expr: LinearExpr, bound: f64) -> Self {
        Self::new(ConstraintType::GreaterThanOrEqual, expr, bound)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn num_variables(&self) -> usize {
        self.expr.terms().len()
    }

    pub fn is_satisfied_by(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        let tolerance = tolerance * (1.0 + self.bound.abs());
        match self.constraint_type {
            ConstraintType::LessThanOrEqual => lhs <= self.bound + tolerance,
            ConstraintType::Equal => (lhs - self.bound).abs() <= tolerance,
            ConstraintType::GreaterThanOrEqual => lhs >= self.bound - tolerance,
        }
    }
}

/// Configuration for one solve call
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    /// Wall-clock budget in seconds
    pub time_limit: Option<f64>,
    pub gap_tolerance: Option<f64>,
    pub verbose: bool,
    /// Where infeasibility diagnostics are written
    pub diagnostics_dir: PathBuf,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Auto,
            time_limit: None,
            gap_tolerance: None,
            verbose: false,
            diagnostics_dir: PathBuf::from("."),
        }
    }
}

impl SolverConfig {
    pub fn with_backend(mut self, backend: SolverBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn with_gap_tolerance(mut self, gap: f64) -> Self {
        self.gap_tolerance = Some(gap);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_diagnostics_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diagnostics_dir = dir.into();
        self
    }

    /// Same settings with no time budget, for feasibility checks that must
    /// reach a verdict.
    pub fn without_time_limit(&self) -> Self {
        Self {
            time_limit: None,
            ..self.clone()
        }
    }
}

/// Mixed-integer program under construction.
///
/// Variables and constraints are appended during a single build phase; the
/// model owns them until it is dropped at the end of the solve call.
#[derive(Debug, Clone)]
pub struct MipModel {
    pub name: String,
    pub sense: OptimizationType,
    pub variables: Vec<Variable>,
    pub constraints: Vec<Constraint>,
}

impl MipModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sense: OptimizationType::Minimize,
            variables: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn set_sense(&mut self, sense: OptimizationType) {
        self.sense = sense;
    }

    pub fn add_variable(&mut self, variable: Variable) -> VarId {
        self.variables.push(variable);
        VarId(self.variables.len() - 1)
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        let expr = constraint.expr.compact();
        self.constraints.push(Constraint { expr, ..constraint });
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.0]
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }

    pub fn num_binary_variables(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.variable_type == VariableType::Binary)
            .count()
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.variables
            .iter()
            .zip(values)
            .map(|(var, value)| var.objective * value)
            .sum()
    }

    /// Whether `values` satisfies every bound, integrality and constraint.
    pub fn is_satisfied_by(&self, values: &[f64]) -> bool {
        let tol = FEASIBILITY_TOLERANCE;
        values.len() == self.variables.len()
            && self.variables.iter().zip(values).all(|(var, &value)| {
                value >= var.lower_bound - tol
                    && value <= var.upper() + tol
                    && (!var.is_integer() || (value - value.round()).abs() <= tol)
            })
            && self
                .constraints
                .iter()
                .all(|c| c.is_satisfied_by(values, tol))
    }

    /// Copy keeping only the listed constraints, with a zero objective.
    ///
    /// Bounds and integrality are preserved, so the copy is feasible exactly
    /// when the selected constraints are jointly satisfiable.
    pub fn feasibility_subproblem(&self, constraint_indices: &[usize]) -> MipModel {
        MipModel {
            name: format!("{}_feasibility", self.name),
            sense: OptimizationType::Minimize,
            variables: self
                .variables
                .iter()
                .cloned()
                .map(|v| v.with_objective(0.0))
                .collect(),
            constraints: constraint_indices
                .iter()
                .map(|&i| self.constraints[i].clone())
                .collect(),
        }
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_integer_vars: u32,
    pub num_binary_vars: u32,
}

impl SolverStatistics {
    pub fn for_model(model: &MipModel, solve_time_ms: f64) -> Self {
        Self {
            solve_time_ms,
            num_variables: model.num_variables() as u32,
            num_constraints: model.num_constraints() as u32,
            num_integer_vars: model.num_integer_variables() as u32,
            num_binary_vars: model.num_binary_variables() as u32,
        }
    }
}

/// Result of one solve call
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub objective_value: Option<f64>,
    pub variable_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
}

impl Solution {
    pub fn new(status: SolutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            objective_value: None,
            variable_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn optimal(value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            objective_value: Some(value),
            variable_values,
            message: "Optimal solution found".to_string(),
            statistics: SolverStatistics::default(),
        }
    }

    /// Solution stopped early but carrying the best incumbent found so far
    pub fn incumbent(status: SolutionStatus, value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status,
            objective_value: Some(value),
            variable_values,
            message: format!("Stopped with incumbent ({})", status),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn has_incumbent(&self) -> bool {
        self.status.may_have_incumbent() && !self.variable_values.is_empty()
    }

    /// Value of `var` in the incumbent, 0 when there is none
    pub fn value(&self, var: VarId) -> f64 {
        self.variable_values.get(var.0).copied().unwrap_or(0.0)
    }

    /// Binary reading of `var`
    pub fn is_set(&self, var: VarId) -> bool {
        self.value(var) > 0.5
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.objective_value {
            Some(value) => write!(f, "{} (objective {})", self.status, value),
            None => write!(f, "{}", self.status),
        }
    }
}
