use nalgebra::{DMatrix, DVector};
use num_traits::Zero;

use super::{NonLinearOp, Op, OpHandle};
use crate::error::{Error, Result};
use crate::scalar::Scalar;

/// Zero-padded inclusion of a smaller operator into a larger space.
///
/// Acts as `a` on the input slice `[first_x, first_x + a.nstates)`, writes
/// into the output slice `[first_f, first_f + a.nout)` and leaves the rest
/// of the output (and of the Jacobian) zero.
#[derive(Debug)]
pub struct EmbedOp<T: Scalar> {
    a: OpHandle<T>,
    first_x: usize,
    dim_x: usize,
    first_f: usize,
    dim_f: usize,
}

impl<T: Scalar> EmbedOp<T> {
    pub fn new(
        a: OpHandle<T>,
        first_x: usize,
        dim_x: usize,
        first_f: usize,
        dim_f: usize,
    ) -> Result<Self> {
        if first_x + a.nstates() > dim_x {
            return Err(Error::ShapeMismatch {
                what: "embedding input",
                left: first_x + a.nstates(),
                right: dim_x,
            });
        }
        if first_f + a.nout() > dim_f {
            return Err(Error::ShapeMismatch {
                what: "embedding output",
                left: first_f + a.nout(),
                right: dim_f,
            });
        }
        Ok(Self {
            a,
            first_x,
            dim_x,
            first_f,
            dim_f,
        })
    }
}

impl<T: Scalar> Op<T> for EmbedOp<T> {
    fn nstates(&self) -> usize {
        self.dim_x
    }
    fn nout(&self) -> usize {
        self.dim_f
    }
}

impl<T: Scalar> NonLinearOp<T> for EmbedOp<T> {
    fn call_inplace(&self, x: &DVector<T>, y: &mut DVector<T>) {
        y.fill(T::zero());
        let xs = x.rows(self.first_x, self.a.nstates()).clone_owned();
        let fs = self.a.call(&xs);
        y.rows_mut(self.first_f, self.a.nout()).copy_from(&fs);
    }

    fn jacobian_inplace(&self, x: &DVector<T>, jac: &mut DMatrix<T>) {
        jac.fill(T::zero());
        let xs = x.rows(self.first_x, self.a.nstates()).clone_owned();
        let block = self.a.jacobian(&xs);
        jac.view_mut(
            (self.first_f, self.first_x),
            (self.a.nout(), self.a.nstates()),
        )
        .copy_from(&block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acts_on_the_inner_block_only() {
        let op = EmbedOp::new(OpHandle::identity(2), 1, 4, 0, 3).unwrap();
        let x = DVector::from_vec(vec![9.0, 1.0, 2.0, 9.0]);
        assert_eq!(op.call(&x), DVector::from_vec(vec![1.0, 2.0, 0.0]));
        let jac = op.jacobian(&x);
        assert_eq!(jac[(0, 1)], 1.0);
        assert_eq!(jac[(1, 2)], 1.0);
        assert_eq!(jac.sum(), 2.0);
    }

    #[test]
    fn rejects_overflowing_blocks() {
        let err = EmbedOp::<f64>::new(OpHandle::identity(3), 2, 4, 0, 4).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }
}
