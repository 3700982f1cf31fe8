//! Genome rearrangement instances: a source and a target gene order.

use super::{is_permutation, malformed, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrInstance {
    pub source: Vec<usize>,
    pub target: Vec<usize>,
}

impl GrInstance {
    pub fn new(source: Vec<usize>, target: Vec<usize>) -> Self {
        Self { source, target }
    }

    /// Permutation length N
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.is_empty() {
            return malformed("permutations are empty");
        }
        if self.source.len() != self.target.len() {
            return malformed(format!(
                "source has length {} but target has length {}",
                self.source.len(),
                self.target.len()
            ));
        }
        if !is_permutation(&self.source) {
            return malformed("source is not a permutation of 0..N");
        }
        if !is_permutation(&self.target) {
            return malformed("target is not a permutation of 0..N");
        }
        Ok(())
    }
}
