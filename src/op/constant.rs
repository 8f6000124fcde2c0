use std::cell::{Ref, RefCell};
use std::rc::Rc;

use nalgebra::{DMatrix, DVector};
use num_traits::Zero;

use super::{NonLinearOp, Op};
use crate::scalar::Scalar;

/// A shared vector box: evaluates to its stored vector regardless of the
/// input, with a zero Jacobian.
///
/// Cloning shares the storage, so a stepper that keeps one clone and puts
/// another into a residual graph can update the graph through
/// [`ConstantOp::set`]. Mutating the value while an evaluation (or a whole
/// Newton solve) is in flight is not supported; set it before the solve and
/// leave it alone until the solve returns.
pub struct ConstantOp<T: Scalar> {
    value: Rc<RefCell<DVector<T>>>,
}

impl<T: Scalar> Clone for ConstantOp<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
        }
    }
}

impl<T: Scalar> ConstantOp<T> {
    /// The zero vector of length `n`.
    pub fn zeros(n: usize) -> Self {
        Self {
            value: Rc::new(RefCell::new(DVector::zeros(n))),
        }
    }

    pub fn from_vector(value: DVector<T>) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
        }
    }

    /// Overwrite the stored vector. The length is fixed at construction.
    pub fn set(&self, value: &DVector<T>) {
        self.value.borrow_mut().copy_from(value);
    }

    pub fn get(&self) -> Ref<'_, DVector<T>> {
        self.value.borrow()
    }

    fn len(&self) -> usize {
        self.value.borrow().len()
    }
}

impl<T: Scalar> Op<T> for ConstantOp<T> {
    fn nstates(&self) -> usize {
        self.len()
    }
    fn nout(&self) -> usize {
        self.len()
    }
}

impl<T: Scalar> NonLinearOp<T> for ConstantOp<T> {
    fn call_inplace(&self, _x: &DVector<T>, y: &mut DVector<T>) {
        y.copy_from(&self.value.borrow());
    }

    fn jacobian_inplace(&self, _x: &DVector<T>, jac: &mut DMatrix<T>) {
        jac.fill(T::zero());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_to_stored_vector() {
        let c = ConstantOp::from_vector(DVector::from_vec(vec![1.0, 2.0]));
        let x = DVector::from_vec(vec![9.0, 9.0]);
        assert_eq!(c.call(&x), DVector::from_vec(vec![1.0, 2.0]));
        assert!(c.jacobian(&x).amax() == 0.0);

        let shared = c.clone();
        shared.set(&DVector::from_vec(vec![-1.0, 4.0]));
        assert_eq!(c.call(&x), DVector::from_vec(vec![-1.0, 4.0]));
    }
}
