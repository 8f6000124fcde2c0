use nalgebra::DVector;
use num_traits::One;

use super::{check_rhs_square, check_state_len, Stepper};
use crate::error::Result;
use crate::op::OpHandle;
use crate::scalar::Scalar;

/// The explicit midpoint rule:
/// `y* = y + (tau/2) f(y)`, then `y <- y + tau * f(y*)`.
pub struct ImprovedEuler<T: Scalar> {
    rhs: OpHandle<T>,
    f: DVector<T>,
    y_mid: DVector<T>,
}

impl<T: Scalar> ImprovedEuler<T> {
    pub fn new(rhs: OpHandle<T>) -> Result<Self> {
        check_rhs_square(&rhs)?;
        let n = rhs.nstates();
        Ok(Self {
            rhs,
            f: DVector::zeros(n),
            y_mid: DVector::zeros(n),
        })
    }
}

impl<T: Scalar> Stepper<T> for ImprovedEuler<T> {
    fn step(&mut self, tau: T, y: &mut DVector<T>) -> Result<()> {
        check_state_len(self.rhs.nstates(), y)?;
        self.rhs.call_inplace(y, &mut self.f);
        self.y_mid.copy_from(y);
        self.y_mid.axpy(tau / T::from(2.0), &self.f, T::one());
        self.rhs.call_inplace(&self.y_mid, &mut self.f);
        y.axpy(tau, &self.f, T::one());
        Ok(())
    }
}
