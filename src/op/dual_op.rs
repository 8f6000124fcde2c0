use nalgebra::{DMatrix, DVector};
use num_traits::Zero;

use super::{NonLinearOp, Op};
use crate::dual::{Dual, DualScalar};
use crate::scalar::Scalar;

/// A function body that runs on any [`DualScalar`] algebra.
///
/// This is the single generic evaluator a leaf has to provide: with plain
/// scalars it computes the value, with [`Dual`] scalars it also carries the
/// derivatives. [`DualOp`] dispatches both [`NonLinearOp`] methods onto it.
pub trait DualFunction<T: Scalar> {
    fn nstates(&self) -> usize;
    fn nout(&self) -> usize;
    fn eval<S: DualScalar<T>>(&self, x: &[S], f: &mut [S]);
}

/// Adapter giving a [`DualFunction`] the full [`NonLinearOp`] interface,
/// with the Jacobian obtained by seeding one dual variable per input
/// component and reading `Df[(i, j)]` off the derivative of output `i`.
pub struct DualOp<F> {
    func: F,
}

impl<F> DualOp<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }

    pub fn inner(&self) -> &F {
        &self.func
    }
}

impl<T: Scalar, F: DualFunction<T>> Op<T> for DualOp<F> {
    fn nstates(&self) -> usize {
        self.func.nstates()
    }
    fn nout(&self) -> usize {
        self.func.nout()
    }
}

impl<T: Scalar, F: DualFunction<T>> NonLinearOp<T> for DualOp<F> {
    fn call_inplace(&self, x: &DVector<T>, y: &mut DVector<T>) {
        self.func.eval(x.as_slice(), y.as_mut_slice());
    }

    fn jacobian_inplace(&self, x: &DVector<T>, jac: &mut DMatrix<T>) {
        let n = self.func.nstates();
        let xs: Vec<Dual<T>> = x
            .iter()
            .enumerate()
            .map(|(i, &v)| Dual::variable(v, i, n))
            .collect();
        let mut fs = vec![Dual::constant(T::zero()); self.func.nout()];
        self.func.eval(&xs, &mut fs);
        for i in 0..self.func.nout() {
            for j in 0..n {
                jac[(i, j)] = fs[i].derivative(j);
            }
        }
    }
}
