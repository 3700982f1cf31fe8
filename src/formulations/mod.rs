//! MIP formulations of the four combinatorial problems and the driver that
//! builds, solves and classifies one instance.

pub mod csp;
pub mod gr;
pub mod indexing;
pub mod jsp;
pub mod vrptw;

use std::path::PathBuf;

use log::{info, warn};

use crate::domain::{
    MipModel, Solution, SolutionStatus, SolverConfig, SolverError, SolverService,
};
use crate::instances::InstanceError;
use crate::solver::SolverFactory;

pub use csp::{CspFormulation, CspSolution};
pub use gr::{GrFormulation, GrSolution, Transposition};
pub use jsp::{JspFormulation, JspSolution};
pub use vrptw::{AugmentedNode, Route, VrptwFormulation, VrptwSolution};

/// Errors raised while building, solving or reading back a formulation
#[derive(Debug, thiserror::Error)]
pub enum FormulationError {
    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error("Unsupported instance size: {0}")]
    UnsupportedSize(String),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("Solver returned an inconsistent assignment: {0}")]
    InconsistentSolution(String),

    #[error("Unexpected solver status: {0}")]
    UnexpectedStatus(SolutionStatus),
}

impl FormulationError {
    pub fn is_malformed_instance(&self) -> bool {
        matches!(self, FormulationError::Instance(InstanceError::Malformed(_)))
    }
}

pub type Result<T> = std::result::Result<T, FormulationError>;

/// A MIP formulation: how to lay out variables and constraints for an
/// instance, and how to read a typed result back from a solution.
pub trait Formulation: Sized {
    type Instance;
    type Output;

    /// Problem tag used for model and diagnostic file names
    const NAME: &'static str;

    /// Structural checks run before any variable is created
    fn validate(instance: &Self::Instance) -> Result<()>;

    /// Lays out the model; the returned builder keeps the variable handles.
    fn build(instance: &Self::Instance) -> Result<(MipModel, Self)>;

    fn extract(&self, instance: &Self::Instance, solution: &Solution) -> Result<Self::Output>;
}

/// Artifact produced when a model turns out infeasible
#[derive(Debug, Clone)]
pub struct InfeasibilityDiagnostic {
    /// Exported irreducible inconsistent subsystem (.lp syntax)
    pub path: PathBuf,
    /// Names of the constraints in the subsystem
    pub constraints: Vec<String>,
}

/// Classified result of one solve
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// Proven optimal
    Optimal(T),
    /// Stopped by the time budget, with the best incumbent if one was found
    TimeLimit(Option<T>),
    Infeasible(InfeasibilityDiagnostic),
}

impl<T> Outcome<T> {
    pub fn is_optimal(&self) -> bool {
        matches!(self, Outcome::Optimal(_))
    }

    /// Best known result, optimal or not
    pub fn best(&self) -> Option<&T> {
        match self {
            Outcome::Optimal(result) => Some(result),
            Outcome::TimeLimit(result) => result.as_ref(),
            Outcome::Infeasible(_) => None,
        }
    }

    pub fn into_optimal(self) -> Option<T> {
        match self {
            Outcome::Optimal(result) => Some(result),
            _ => None,
        }
    }
}

/// Builds the formulation for `instance`, solves it once with `solver` and
/// classifies the result.
///
/// The model lives only for the duration of this call. On infeasibility an
/// irreducible inconsistent subsystem is exported to
/// `<diagnostics_dir>/<NAME>_model_IIS.ilp`.
pub fn solve_instance<F: Formulation>(
    solver: &dyn SolverService,
    instance: &F::Instance,
    config: &SolverConfig,
) -> Result<Outcome<F::Output>> {
    F::validate(instance)?;
    let (model, formulation) = F::build(instance)?;
    info!(
        "{}: '{}' has {} variables ({} integer) and {} constraints, solving with {}",
        F::NAME,
        model.name,
        model.num_variables(),
        model.num_integer_variables(),
        model.num_constraints(),
        solver.name()
    );

    let solution = solver.solve(&model, config)?;
    match solution.status {
        SolutionStatus::Optimal => Ok(Outcome::Optimal(formulation.extract(instance, &solution)?)),
        SolutionStatus::Feasible
        | SolutionStatus::TimeLimit
        | SolutionStatus::IterationLimit
        | SolutionStatus::Interrupted => {
            warn!("{}: stopped early ({})", F::NAME, solution);
            if solution.has_incumbent() {
                Ok(Outcome::TimeLimit(Some(formulation.extract(instance, &solution)?)))
            } else {
                Ok(Outcome::TimeLimit(None))
            }
        }
        SolutionStatus::Infeasible => diagnose::<F, _>(solver, &model, config),
        SolutionStatus::InfeasibleOrUnbounded => {
            if solver.is_feasible(&model, config)? {
                Err(FormulationError::UnexpectedStatus(SolutionStatus::Unbounded))
            } else {
                diagnose::<F, _>(solver, &model, config)
            }
        }
        status => Err(FormulationError::UnexpectedStatus(status)),
    }
}

/// [`solve_instance`] with the backend named in `config`.
pub fn solve<F: Formulation>(
    instance: &F::Instance,
    config: &SolverConfig,
) -> Result<Outcome<F::Output>> {
    let solver = SolverFactory::create_solver(config)?;
    solve_instance::<F>(solver.as_ref(), instance, config)
}

fn diagnose<F: Formulation, T>(
    solver: &dyn SolverService,
    model: &MipModel,
    config: &SolverConfig,
) -> Result<Outcome<T>> {
    warn!("{}: model '{}' is infeasible, computing IIS", F::NAME, model.name);
    let iis = solver.compute_iis(model, config)?;
    let path = config
        .diagnostics_dir
        .join(format!("{}_model_IIS.ilp", F::NAME));
    iis.export(&path)?;
    warn!(
        "{}: {} conflicting constraints written to {}",
        F::NAME,
        iis.len(),
        path.display()
    );
    Ok(Outcome::Infeasible(InfeasibilityDiagnostic {
        path,
        constraints: iis.constraint_names(),
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::domain::{Constraint, LinearExpr, VarId, Variable};

    /// Answers with the scripted solutions first, then by enumerating 0/1
    /// assignments.
    struct ScriptedSolver {
        script: Mutex<VecDeque<Solution>>,
    }

    impl ScriptedSolver {
        fn new(script: impl IntoIterator<Item = Solution>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
            }
        }
    }

    impl SolverService for ScriptedSolver {
        fn solve(&self, model: &MipModel, _config: &SolverConfig) -> crate::domain::solver_service::Result<Solution> {
            if let Some(next) = self.script.lock().unwrap().pop_front() {
                return Ok(next);
            }
            let n = model.num_variables();
            for mask in 0..(1u32 << n) {
                let values: Vec<f64> = (0..n).map(|i| f64::from((mask >> i) & 1)).collect();
                if model.is_satisfied_by(&values) {
                    return Ok(Solution::optimal(model.objective_value(&values), values));
                }
            }
            Ok(Solution::new(SolutionStatus::Infeasible, "no assignment"))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// One binary `x` with `x >= demand`
    struct Pick {
        x: VarId,
    }

    impl Formulation for Pick {
        type Instance = f64;
        type Output = bool;

        const NAME: &'static str = "pick";

        fn validate(_demand: &f64) -> Result<()> {
            Ok(())
        }

        fn build(demand: &f64) -> Result<(MipModel, Self)> {
            let mut model = MipModel::new("pick");
            let x = model.add_variable(Variable::binary("x").with_objective(1.0));
            model.add_constraint(Constraint::geq(LinearExpr::sum([x]), *demand).with_name("demand"));
            Ok((model, Pick { x }))
        }

        fn extract(&self, _demand: &f64, solution: &Solution) -> Result<bool> {
            Ok(solution.is_set(self.x))
        }
    }

    fn run(script: Vec<Solution>, demand: f64) -> Result<Outcome<bool>> {
        solve_instance::<Pick>(&ScriptedSolver::new(script), &demand, &SolverConfig::default())
    }

    #[test]
    fn optimal_status_is_optimal() {
        let outcome = run(vec![Solution::optimal(1.0, vec![1.0])], 1.0).unwrap();
        assert!(outcome.is_optimal());
        assert_eq!(outcome.into_optimal(), Some(true));
    }

    #[test]
    fn stopped_incumbent_is_never_optimal() {
        for status in [
            SolutionStatus::TimeLimit,
            SolutionStatus::Feasible,
            SolutionStatus::IterationLimit,
            SolutionStatus::Interrupted,
        ] {
            let outcome = run(vec![Solution::incumbent(status, 1.0, vec![1.0])], 1.0).unwrap();
            assert!(!outcome.is_optimal(), "{} reported as optimal", status);
            assert_eq!(outcome.best(), Some(&true));
            assert!(matches!(outcome, Outcome::TimeLimit(Some(true))));
        }
    }

    #[test]
    fn time_limit_without_incumbent() {
        let outcome = run(vec![Solution::new(SolutionStatus::TimeLimit, "stopped")], 1.0).unwrap();
        assert!(matches!(outcome, Outcome::TimeLimit(None)));
        assert!(outcome.best().is_none());
    }

    #[test]
    fn undecided_presolve_confirmed_infeasible() {
        let dir = tempfile::tempdir().unwrap();
        let config = SolverConfig::default().with_diagnostics_dir(dir.path());
        let solver = ScriptedSolver::new([Solution::new(SolutionStatus::InfeasibleOrUnbounded, "")]);
        match solve_instance::<Pick>(&solver, &2.0, &config).unwrap() {
            Outcome::Infeasible(diagnostic) => {
                assert_eq!(diagnostic.constraints, vec!["demand"]);
                assert_eq!(diagnostic.path, dir.path().join("pick_model_IIS.ilp"));
                assert!(diagnostic.path.exists());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn undecided_presolve_on_feasible_model_is_unbounded() {
        let err = run(vec![Solution::new(SolutionStatus::InfeasibleOrUnbounded, "")], 0.0).unwrap_err();
        assert!(matches!(err, FormulationError::UnexpectedStatus(SolutionStatus::Unbounded)));
    }

    #[test]
    fn unbounded_is_unexpected() {
        let err = run(vec![Solution::new(SolutionStatus::Unbounded, "")], 0.0).unwrap_err();
        assert!(matches!(err, FormulationError::UnexpectedStatus(SolutionStatus::Unbounded)));
    }
}
