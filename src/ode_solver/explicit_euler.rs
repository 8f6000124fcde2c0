use nalgebra::DVector;
use num_traits::One;

use super::{check_rhs_square, check_state_len, Stepper};
use crate::error::Result;
use crate::op::OpHandle;
use crate::scalar::Scalar;

/// Forward Euler: `y <- y + tau * f(y)`.
pub struct ExplicitEuler<T: Scalar> {
    rhs: OpHandle<T>,
    f: DVector<T>,
}

impl<T: Scalar> ExplicitEuler<T> {
    pub fn new(rhs: OpHandle<T>) -> Result<Self> {
        check_rhs_square(&rhs)?;
        let f = DVector::zeros(rhs.nout());
        Ok(Self { rhs, f })
    }
}

impl<T: Scalar> Stepper<T> for ExplicitEuler<T> {
    fn step(&mut self, tau: T, y: &mut DVector<T>) -> Result<()> {
        check_state_len(self.rhs.nstates(), y)?;
        self.rhs.call_inplace(y, &mut self.f);
        y.axpy(tau, &self.f, T::one());
        Ok(())
    }
}
