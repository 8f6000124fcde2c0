use nalgebra::{DMatrix, DVector};

use super::{NonLinearOp, Op, OpHandle, Parameter};
use crate::scalar::Scalar;

/// `f(x) = p * a(x)` for a shared [`Parameter`] `p`, read at evaluation
/// time.
pub struct ScaleOp<T: Scalar> {
    a: OpHandle<T>,
    factor: Parameter<T>,
}

impl<T: Scalar> ScaleOp<T> {
    pub fn new(a: OpHandle<T>, factor: Parameter<T>) -> Self {
        Self { a, factor }
    }
}

impl<T: Scalar> Op<T> for ScaleOp<T> {
    fn nstates(&self) -> usize {
        self.a.nstates()
    }
    fn nout(&self) -> usize {
        self.a.nout()
    }
}

impl<T: Scalar> NonLinearOp<T> for ScaleOp<T> {
    fn call_inplace(&self, x: &DVector<T>, y: &mut DVector<T>) {
        self.a.call_inplace(x, y);
        *y *= self.factor.get();
    }

    fn jacobian_inplace(&self, x: &DVector<T>, jac: &mut DMatrix<T>) {
        self.a.jacobian_inplace(x, jac);
        *jac *= self.factor.get();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_parameter_at_evaluation_time() {
        let p = Parameter::new(1.0);
        let op = ScaleOp::new(OpHandle::identity(2), p.clone());
        let x = DVector::from_vec(vec![1.0, 2.0]);
        assert_eq!(op.call(&x), x);
        p.set(-0.5);
        assert_eq!(op.call(&x), DVector::from_vec(vec![-0.5, -1.0]));
        assert_eq!(op.jacobian(&x)[(1, 1)], -0.5);
    }
}
