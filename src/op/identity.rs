use nalgebra::{DMatrix, DVector};
use num_traits::{One, Zero};

use super::{NonLinearOp, Op};
use crate::scalar::Scalar;

/// The identity map on `R^n`: `f(x) = x`, `Df = I`.
pub struct IdentityOp {
    n: usize,
}

impl IdentityOp {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl<T: Scalar> Op<T> for IdentityOp {
    fn nstates(&self) -> usize {
        self.n
    }
    fn nout(&self) -> usize {
        self.n
    }
}

impl<T: Scalar> NonLinearOp<T> for IdentityOp {
    fn call_inplace(&self, x: &DVector<T>, y: &mut DVector<T>) {
        y.copy_from(x);
    }

    fn jacobian_inplace(&self, _x: &DVector<T>, jac: &mut DMatrix<T>) {
        jac.fill(T::zero());
        jac.fill_diagonal(T::one());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_jacobian_is_identity() {
        let op = IdentityOp::new(3);
        let x = DVector::from_vec(vec![1.0, -2.0, 0.5]);
        assert_eq!(NonLinearOp::<f64>::call(&op, &x), x);
        let jac = NonLinearOp::<f64>::jacobian(&op, &x);
        assert_eq!(jac, DMatrix::identity(3, 3));
    }
}
