use nalgebra::DVector;
use num_traits::Zero;

use super::{check_rhs_square, check_state_len, Stepper};
use crate::error::Result;
use crate::nonlinear_solver::Newton;
use crate::op::{ConstantOp, OpHandle, Parameter};
use crate::scalar::Scalar;

/// The trapezoidal rule: solves
/// `y_new - y_old - (tau/2) * (f(y_old) + f(y_new)) = 0`.
///
/// `f(y_old)` is frozen during the solve, so it is captured in a
/// [`ConstantOp`] refreshed before each Newton call.
pub struct CrankNicolson<T: Scalar> {
    rhs: OpHandle<T>,
    residual: OpHandle<T>,
    tau_half: Parameter<T>,
    y_old: ConstantOp<T>,
    f_old: ConstantOp<T>,
    f_buf: DVector<T>,
    newton: Newton<T>,
    x: DVector<T>,
}

impl<T: Scalar> CrankNicolson<T> {
    pub fn new(rhs: OpHandle<T>) -> Result<Self> {
        check_rhs_square(&rhs)?;
        let n = rhs.nstates();
        let tau_half = Parameter::new(T::zero());
        let y_old = ConstantOp::zeros(n);
        let f_old = ConstantOp::zeros(n);
        let residual = OpHandle::identity(n)
            - OpHandle::new(y_old.clone())
            - tau_half.clone() * (OpHandle::new(f_old.clone()) + rhs.clone());

        Ok(Self {
            rhs,
            residual,
            tau_half,
            y_old,
            f_old,
            f_buf: DVector::zeros(n),
            newton: Newton::default(),
            x: DVector::zeros(n),
        })
    }

    pub fn newton(&self) -> &Newton<T> {
        &self.newton
    }

    pub fn newton_mut(&mut self) -> &mut Newton<T> {
        &mut self.newton
    }
}

impl<T: Scalar> Stepper<T> for CrankNicolson<T> {
    fn step(&mut self, tau: T, y: &mut DVector<T>) -> Result<()> {
        check_state_len(self.rhs.nstates(), y)?;
        self.y_old.set(y);
        self.rhs.call_inplace(y, &mut self.f_buf);
        self.f_old.set(&self.f_buf);
        self.tau_half.set(tau / T::from(2.0));
        self.x.copy_from(y);
        self.newton.solve_in_place(&*self.residual, &mut self.x)?;
        y.copy_from(&self.x);
        Ok(())
    }
}
