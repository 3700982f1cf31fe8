//! Indexed families of decision variables.
//!
//! Dense families live in a [`Tensor`], a flat row-major array; sparse ones
//! (ordered pairs, triples, arcs) live in [`KeyedVars`], keyed by an explicit
//! tuple.

use std::collections::BTreeMap;
use std::ops::Index;

use crate::domain::VarId;

/// Dense `D`-dimensional block of variable handles.
///
/// The handle for index `[i0, .., i{D-1}]` sits at offset
/// `Σ_d i_d · stride_d` with `stride_{D-1} = 1` and
/// `stride_d = stride_{d+1} · dims[d+1]`.
#[derive(Debug, Clone)]
pub struct Tensor<const D: usize> {
    dims: [usize; D],
    vars: Vec<VarId>,
}

impl<const D: usize> Tensor<D> {
    /// Creates every entry in row-major order.
    pub fn build(dims: [usize; D], mut create: impl FnMut([usize; D]) -> VarId) -> Self {
        let total = dims.iter().product();
        let mut vars = Vec::with_capacity(total);
        let mut index = [0usize; D];
        for _ in 0..total {
            vars.push(create(index));
            for d in (0..D).rev() {
                index[d] += 1;
                if index[d] < dims[d] {
                    break;
                }
                index[d] = 0;
            }
        }
        Self { dims, vars }
    }

    pub fn dims(&self) -> [usize; D] {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn get(&self, index: [usize; D]) -> Option<VarId> {
        self.offset(index).map(|offset| self.vars[offset])
    }

    fn offset(&self, index: [usize; D]) -> Option<usize> {
        let mut offset = 0;
        for d in 0..D {
            if index[d] >= self.dims[d] {
                return None;
            }
            offset = offset * self.dims[d] + index[d];
        }
        Some(offset)
    }
}

impl<const D: usize> Index<[usize; D]> for Tensor<D> {
    type Output = VarId;

    fn index(&self, index: [usize; D]) -> &VarId {
        match self.offset(index) {
            Some(offset) => &self.vars[offset],
            None => panic!("index {:?} out of bounds for tensor {:?}", index, self.dims),
        }
    }
}

/// Sparse family of variables addressed by tuple keys, iterated in key order.
#[derive(Debug, Clone)]
pub struct KeyedVars<K: Ord> {
    vars: BTreeMap<K, VarId>,
}

impl<K: Ord> Default for KeyedVars<K> {
    fn default() -> Self {
        Self {
            vars: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy> KeyedVars<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: K, var: VarId) {
        self.vars.insert(key, var);
    }

    pub fn get(&self, key: &K) -> Option<VarId> {
        self.vars.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, VarId)> + '_ {
        self.vars.iter().map(|(k, v)| (*k, *v))
    }
}

impl<K: Ord> Index<&K> for KeyedVars<K> {
    type Output = VarId;

    fn index(&self, key: &K) -> &VarId {
        match self.vars.get(key) {
            Some(var) => var,
            None => panic!("no variable for this key"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_offsets() {
        let mut next = 0;
        let tensor = Tensor::build([2, 3, 4], |_| {
            next += 1;
            VarId(next - 1)
        });
        assert_eq!(tensor.len(), 24);
        assert_eq!(tensor[[0, 0, 0]], VarId(0));
        assert_eq!(tensor[[0, 0, 3]], VarId(3));
        assert_eq!(tensor[[0, 1, 0]], VarId(4));
        assert_eq!(tensor[[1, 2, 3]], VarId(23));
        assert_eq!(tensor.get([2, 0, 0]), None);
    }

    #[test]
    fn build_visits_indices_in_order() {
        let mut seen = Vec::new();
        Tensor::build([2, 2], |idx| {
            seen.push(idx);
            VarId(seen.len() - 1)
        });
        assert_eq!(seen, vec![[0, 0], [0, 1], [1, 0], [1, 1]]);
    }

    #[test]
    fn keyed_vars_iterate_in_key_order() {
        let mut vars = KeyedVars::new();
        vars.insert((1, 0), VarId(7));
        vars.insert((0, 2), VarId(8));
        assert_eq!(vars.get(&(1, 0)), Some(VarId(7)));
        assert_eq!(vars.get(&(2, 2)), None);
        let keys: Vec<_> = vars.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![(0, 2), (1, 0)]);
    }
}
