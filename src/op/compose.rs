use nalgebra::{DMatrix, DVector};
use num_traits::{One, Zero};

use super::{NonLinearOp, Op, OpHandle};
use crate::error::{Error, Result};
use crate::scalar::Scalar;

/// Composition `f(x) = outer(inner(x))`; the Jacobian is the chain rule
/// product `Douter(inner(x)) * Dinner(x)`.
#[derive(Debug)]
pub struct ComposeOp<T: Scalar> {
    outer: OpHandle<T>,
    inner: OpHandle<T>,
}

impl<T: Scalar> ComposeOp<T> {
    pub fn new(outer: OpHandle<T>, inner: OpHandle<T>) -> Result<Self> {
        if outer.nstates() != inner.nout() {
            return Err(Error::ShapeMismatch {
                what: "composition",
                left: outer.nstates(),
                right: inner.nout(),
            });
        }
        Ok(Self { outer, inner })
    }
}

impl<T: Scalar> Op<T> for ComposeOp<T> {
    fn nstates(&self) -> usize {
        self.inner.nstates()
    }
    fn nout(&self) -> usize {
        self.outer.nout()
    }
}

impl<T: Scalar> NonLinearOp<T> for ComposeOp<T> {
    fn call_inplace(&self, x: &DVector<T>, y: &mut DVector<T>) {
        let tmp = self.inner.call(x);
        self.outer.call_inplace(&tmp, y);
    }

    fn jacobian_inplace(&self, x: &DVector<T>, jac: &mut DMatrix<T>) {
        let tmp = self.inner.call(x);
        let jac_outer = self.outer.jacobian(&tmp);
        let jac_inner = self.inner.jacobian(x);
        jac.gemm(T::one(), &jac_outer, &jac_inner, T::zero());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::tests::finite_difference_jacobian;
    use crate::op::{DualFunction, DualOp};
    use crate::DualScalar;

    struct Square;
    impl DualFunction<f64> for Square {
        fn nstates(&self) -> usize {
            2
        }
        fn nout(&self) -> usize {
            2
        }
        fn eval<S: DualScalar<f64>>(&self, x: &[S], f: &mut [S]) {
            f[0] = x[0].clone() * x[0].clone();
            f[1] = x[0].clone() * x[1].clone();
        }
    }

    #[test]
    fn chain_rule_matches_finite_differences() {
        let sq = OpHandle::new(DualOp::new(Square));
        let op = ComposeOp::new(sq.clone(), sq).unwrap();
        let x = DVector::from_vec(vec![1.3, -0.4]);
        let jac = op.jacobian(&x);
        let fd = finite_difference_jacobian(&op, &x);
        assert!((jac - fd).amax() < 1e-5);
    }

    #[test]
    fn rejects_mismatched_shapes() {
        let err = ComposeOp::<f64>::new(OpHandle::identity(3), OpHandle::identity(2)).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }
}
