// Domain layer: model interface, solver contract and diagnostics
pub mod domain;

// Problem instances and their file loaders
pub mod instances;

// MIP formulations and the solve driver
pub mod formulations;

// Solver adapters: concrete implementations of SolverService
pub mod solver;

// Re-export commonly used types
pub use domain::{
    Constraint, ConstraintType, IrreducibleSubsystem, LinearExpr, MipModel, OptimizationType,
    Solution, SolutionStatus, SolverBackend, SolverConfig, SolverError, SolverService, VarId,
    Variable, VariableType,
};

pub use formulations::{
    solve, solve_instance, CspFormulation, CspSolution, Formulation, FormulationError,
    GrFormulation, GrSolution, InfeasibilityDiagnostic, JspFormulation, JspSolution, Outcome,
    VrptwFormulation, VrptwSolution,
};

pub use instances::{CspInstance, GrInstance, InstanceError, JsplibInstance, VrptwInstance};

pub use solver::SolverFactory;
#[cfg(feature = "cbc")]
pub use solver::CoinCbcSolver;
#[cfg(feature = "highs")]
pub use solver::HighsSolver;
