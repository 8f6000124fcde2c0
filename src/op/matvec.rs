use nalgebra::{DMatrix, DVector};
use num_traits::Zero;

use super::{NonLinearOp, Op};
use crate::scalar::Scalar;

/// Applies a fixed matrix across a stacked vector.
///
/// The input is read as `a.ncols` row blocks of length `n`: block `j` is
/// `x[j*n .. (j+1)*n]`. Block `i` of the output is
/// `sum_j a[(i, j)] * x_j`, so the Jacobian is the Kronecker-style pattern
/// with `a[(i, j)]` on the diagonal of block `(i, j)`.
///
/// This is how the implicit Runge-Kutta residual forms
/// `K |-> tau * A (x) I * K` over the stacked stage vector.
pub struct MatVecOp<T: Scalar> {
    a: DMatrix<T>,
    n: usize,
}

impl<T: Scalar> MatVecOp<T> {
    pub fn new(a: DMatrix<T>, n: usize) -> Self {
        Self { a, n }
    }
}

impl<T: Scalar> Op<T> for MatVecOp<T> {
    fn nstates(&self) -> usize {
        self.a.ncols() * self.n
    }
    fn nout(&self) -> usize {
        self.a.nrows() * self.n
    }
}

impl<T: Scalar> NonLinearOp<T> for MatVecOp<T> {
    fn call_inplace(&self, x: &DVector<T>, y: &mut DVector<T>) {
        for i in 0..self.a.nrows() {
            for k in 0..self.n {
                let mut acc = T::zero();
                for j in 0..self.a.ncols() {
                    acc += self.a[(i, j)] * x[j * self.n + k];
                }
                y[i * self.n + k] = acc;
            }
        }
    }

    fn jacobian_inplace(&self, _x: &DVector<T>, jac: &mut DMatrix<T>) {
        jac.fill(T::zero());
        for i in 0..self.a.nrows() {
            for j in 0..self.a.ncols() {
                for k in 0..self.n {
                    jac[(i * self.n + k, j * self.n + k)] = self.a[(i, j)];
                }
            }
        }
    }
}
