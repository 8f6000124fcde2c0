use nalgebra::{DMatrix, DVector};
use num_traits::Zero;

use super::{NonLinearOp, Op, OpHandle};
use crate::scalar::Scalar;

/// Block-diagonal replication: applies `a` independently to `count`
/// consecutive input slices.
pub struct ReplicateOp<T: Scalar> {
    a: OpHandle<T>,
    count: usize,
}

impl<T: Scalar> ReplicateOp<T> {
    pub fn new(a: OpHandle<T>, count: usize) -> Self {
        Self { a, count }
    }
}

impl<T: Scalar> Op<T> for ReplicateOp<T> {
    fn nstates(&self) -> usize {
        self.count * self.a.nstates()
    }
    fn nout(&self) -> usize {
        self.count * self.a.nout()
    }
}

impl<T: Scalar> NonLinearOp<T> for ReplicateOp<T> {
    fn call_inplace(&self, x: &DVector<T>, y: &mut DVector<T>) {
        let nx = self.a.nstates();
        let nf = self.a.nout();
        for i in 0..self.count {
            let xs = x.rows(i * nx, nx).clone_owned();
            let fs = self.a.call(&xs);
            y.rows_mut(i * nf, nf).copy_from(&fs);
        }
    }

    fn jacobian_inplace(&self, x: &DVector<T>, jac: &mut DMatrix<T>) {
        jac.fill(T::zero());
        let nx = self.a.nstates();
        let nf = self.a.nout();
        for i in 0..self.count {
            let xs = x.rows(i * nx, nx).clone_owned();
            let block = self.a.jacobian(&xs);
            jac.view_mut((i * nf, i * nx), (nf, nx)).copy_from(&block);
        }
    }
}
