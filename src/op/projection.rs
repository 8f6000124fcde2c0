use nalgebra::{DMatrix, DVector};
use num_traits::{One, Zero};

use super::{NonLinearOp, Op};
use crate::error::{Error, Result};
use crate::scalar::Scalar;

/// Coordinate projection on `R^n`: passes the slice `[first, next)` through
/// and zeroes the complement. The Jacobian is the corresponding indicator
/// diagonal.
pub struct ProjectionOp {
    n: usize,
    first: usize,
    next: usize,
}

impl ProjectionOp {
    pub fn new(n: usize, first: usize, next: usize) -> Result<Self> {
        if first > next || next > n {
            return Err(Error::ShapeMismatch {
                what: "projection range",
                left: next,
                right: n,
            });
        }
        Ok(Self { n, first, next })
    }

    fn len(&self) -> usize {
        self.next - self.first
    }
}

impl<T: Scalar> Op<T> for ProjectionOp {
    fn nstates(&self) -> usize {
        self.n
    }
    fn nout(&self) -> usize {
        self.n
    }
}

impl<T: Scalar> NonLinearOp<T> for ProjectionOp {
    fn call_inplace(&self, x: &DVector<T>, y: &mut DVector<T>) {
        y.fill(T::zero());
        y.rows_mut(self.first, self.len())
            .copy_from(&x.rows(self.first, self.len()));
    }

    fn jacobian_inplace(&self, _x: &DVector<T>, jac: &mut DMatrix<T>) {
        jac.fill(T::zero());
        for i in self.first..self.next {
            jac[(i, i)] = T::one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_the_slice() {
        let op = ProjectionOp::new(4, 1, 3).unwrap();
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(
            NonLinearOp::<f64>::call(&op, &x),
            DVector::from_vec(vec![0.0, 2.0, 3.0, 0.0])
        );
        let jac = NonLinearOp::<f64>::jacobian(&op, &x);
        assert_eq!(jac.diagonal(), DVector::from_vec(vec![0.0, 1.0, 1.0, 0.0]));
    }

    #[test]
    fn rejects_inverted_ranges() {
        assert!(ProjectionOp::new(4, 3, 1).is_err());
        assert!(ProjectionOp::new(4, 0, 5).is_err());
    }
}
