//! Dense row-major 3-D array used for every `(a, b, horizon)` quantity.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    dims: [usize; 3],
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn filled(dims: [usize; 3], value: T) -> Self {
        Self { dims, data: vec![value; dims[0] * dims[1] * dims[2]] }
    }
}

impl<T> Grid<T> {
    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    #[inline]
    fn offset(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.dims[0] && j < self.dims[1] && k < self.dims[2]);
        (i * self.dims[1] + j) * self.dims[2] + k
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> &T {
        &self.data[self.offset(i, j, k)]
    }

    #[inline]
    pub fn get_mut(&mut self, i: usize, j: usize, k: usize) -> &mut T {
        let o = self.offset(i, j, k);
        &mut self.data[o]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: T) {
        *self.get_mut(i, j, k) = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl Grid<f64> {
    pub fn zeros(dims: [usize; 3]) -> Self {
        Self::filled(dims, 0.0)
    }

    /// Sum over the first two axes for each index of the last.
    pub fn sum_last(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.dims[2]];
        for i in 0..self.dims[0] {
            for j in 0..self.dims[1] {
                for (k, o) in out.iter_mut().enumerate() {
                    *o += self.get(i, j, k);
                }
            }
        }
        out
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Element-wise `self += other`.  Dimensions must match.
    pub fn add_assign(&mut self, other: &Grid<f64>) {
        debug_assert_eq!(self.dims, other.dims);
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
    }
}
