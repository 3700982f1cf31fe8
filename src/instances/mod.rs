//! Problem instances consumed by the formulation builders.
//!
//! Every instance type exposes `validate`, which checks the structural
//! invariants a builder relies on. Loaders run the same validation before
//! handing an instance out.

pub mod csp;
pub mod gr;
pub mod jsp;
pub mod vrptw;

pub use csp::CspInstance;
pub use gr::GrInstance;
pub use jsp::JsplibInstance;
pub use vrptw::{TimeWindow, VrpRepReader, VrptwInstance};

/// Errors raised while loading or validating an instance
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    #[error("Cannot read instance {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid VRP-REP document: {0}")]
    Xml(#[from] xml::reader::Error),

    #[error("Malformed instance: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, InstanceError>;

pub(crate) fn malformed<T>(message: impl Into<String>) -> Result<T> {
    Err(InstanceError::Malformed(message.into()))
}

/// Whether `values` holds each of `0..values.len()` exactly once
pub(crate) fn is_permutation(values: &[usize]) -> bool {
    let mut seen = vec![false; values.len()];
    values.iter().all(|&v| {
        v < seen.len() && !std::mem::replace(&mut seen[v], true)
    })
}
