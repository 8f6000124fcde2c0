use nalgebra::{DMatrix, DVector};

use super::{NonLinearOp, Op, OpHandle};
use crate::error::{Error, Result};
use crate::scalar::Scalar;

/// Weighted sum of two operators of identical shape:
/// `f(x) = alpha * a(x) + beta * b(x)`.
#[derive(Debug)]
pub struct SumOp<T: Scalar> {
    a: OpHandle<T>,
    b: OpHandle<T>,
    alpha: T,
    beta: T,
}

impl<T: Scalar> SumOp<T> {
    pub fn new(a: OpHandle<T>, b: OpHandle<T>, alpha: T, beta: T) -> Result<Self> {
        if a.nstates() != b.nstates() {
            return Err(Error::ShapeMismatch {
                what: "sum",
                left: a.nstates(),
                right: b.nstates(),
            });
        }
        if a.nout() != b.nout() {
            return Err(Error::ShapeMismatch {
                what: "sum",
                left: a.nout(),
                right: b.nout(),
            });
        }
        Ok(Self { a, b, alpha, beta })
    }
}

impl<T: Scalar> Op<T> for SumOp<T> {
    fn nstates(&self) -> usize {
        self.a.nstates()
    }
    fn nout(&self) -> usize {
        self.a.nout()
    }
}

impl<T: Scalar> NonLinearOp<T> for SumOp<T> {
    fn call_inplace(&self, x: &DVector<T>, y: &mut DVector<T>) {
        self.a.call_inplace(x, y);
        let tmp = self.b.call(x);
        // y = beta * tmp + alpha * y
        y.axpy(self.beta, &tmp, self.alpha);
    }

    fn jacobian_inplace(&self, x: &DVector<T>, jac: &mut DMatrix<T>) {
        self.a.jacobian_inplace(x, jac);
        let tmp = self.b.jacobian(x);
        let (alpha, beta) = (self.alpha, self.beta);
        jac.zip_apply(&tmp, |ja, jb| *ja = alpha * *ja + beta * jb);
    }
}
