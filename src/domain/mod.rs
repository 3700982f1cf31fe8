// Domain module: MIP model, solver contract and infeasibility diagnostics

pub mod diagnostics;
pub mod models;
pub mod solver_service;
pub mod value_objects;

pub use diagnostics::IrreducibleSubsystem;
pub use models::*;
pub use solver_service::*;
pub use value_objects::*;
