use std::marker::PhantomData;

use nalgebra::{DMatrix, DVector};

use super::{NonLinearOp, Op};
use crate::scalar::Scalar;

/// An operator built from two plain closures: one for the value, one for
/// the Jacobian. For leaves that should derive their Jacobian automatically
/// use [`super::DualOp`] instead.
pub struct Closure<T, F, G>
where
    T: Scalar,
    F: Fn(&DVector<T>, &mut DVector<T>),
    G: Fn(&DVector<T>, &mut DMatrix<T>),
{
    f: F,
    jac: G,
    nstates: usize,
    nout: usize,
    _t: PhantomData<T>,
}

impl<T, F, G> Closure<T, F, G>
where
    T: Scalar,
    F: Fn(&DVector<T>, &mut DVector<T>),
    G: Fn(&DVector<T>, &mut DMatrix<T>),
{
    pub fn new(nstates: usize, nout: usize, f: F, jac: G) -> Self {
        Self {
            f,
            jac,
            nstates,
            nout,
            _t: PhantomData,
        }
    }
}

impl<T, F, G> Op<T> for Closure<T, F, G>
where
    T: Scalar,
    F: Fn(&DVector<T>, &mut DVector<T>),
    G: Fn(&DVector<T>, &mut DMatrix<T>),
{
    fn nstates(&self) -> usize {
        self.nstates
    }
    fn nout(&self) -> usize {
        self.nout
    }
}

impl<T, F, G> NonLinearOp<T> for Closure<T, F, G>
where
    T: Scalar,
    F: Fn(&DVector<T>, &mut DVector<T>),
    G: Fn(&DVector<T>, &mut DMatrix<T>),
{
    fn call_inplace(&self, x: &DVector<T>, y: &mut DVector<T>) {
        (self.f)(x, y);
    }

    fn jacobian_inplace(&self, x: &DVector<T>, jac: &mut DMatrix<T>) {
        (self.jac)(x, jac);
    }
}
