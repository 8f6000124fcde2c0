use nalgebra::DVector;
use num_traits::Zero;

use super::{check_rhs_square, check_state_len, Stepper};
use crate::error::{Error, Result};
use crate::nonlinear_solver::Newton;
use crate::op::{ConstantOp, OpHandle, Parameter, ProjectionOp};
use crate::scalar::Scalar;

/// Backward Euler: solves `y_new - y_old - tau * f(y_new) = 0` by Newton.
///
/// The residual graph is assembled once at construction; each step only
/// retunes the shared `y_old` and `tau` leaves before handing the system to
/// Newton, starting from the current state. On failure the state vector is
/// left untouched.
pub struct ImplicitEuler<T: Scalar> {
    rhs: OpHandle<T>,
    residual: OpHandle<T>,
    tau: Parameter<T>,
    y_old: ConstantOp<T>,
    newton: Newton<T>,
    x: DVector<T>,
}

impl<T: Scalar> ImplicitEuler<T> {
    pub fn new(rhs: OpHandle<T>) -> Result<Self> {
        Self::with_algebraic(rhs, 0)
    }

    /// Backward Euler for a semi-explicit index-1 system: the trailing
    /// `n_algebraic` components of `f` are constraint residuals rather than
    /// time derivatives.
    ///
    /// For those rows the usual difference equation is replaced by
    /// `f_alg(y_new) = 0`, so the constraints hold exactly (to Newton
    /// tolerance) at every accepted step. Built as
    /// `P_diff o (Id - y_old - tau*f) + P_alg o f` with projections.
    pub fn with_algebraic(rhs: OpHandle<T>, n_algebraic: usize) -> Result<Self> {
        check_rhs_square(&rhs)?;
        let n = rhs.nstates();
        if n_algebraic > n {
            return Err(Error::ShapeMismatch {
                what: "algebraic block",
                left: n_algebraic,
                right: n,
            });
        }

        let tau = Parameter::new(T::zero());
        let y_old = ConstantOp::zeros(n);
        let base = OpHandle::identity(n)
            - OpHandle::new(y_old.clone())
            - tau.clone() * rhs.clone();
        let residual = if n_algebraic == 0 {
            base
        } else {
            let n_diff = n - n_algebraic;
            let p_diff = OpHandle::new(ProjectionOp::new(n, 0, n_diff)?);
            let p_alg = OpHandle::new(ProjectionOp::new(n, n_diff, n)?);
            OpHandle::compose(p_diff, base)? + OpHandle::compose(p_alg, rhs.clone())?
        };

        Ok(Self {
            rhs,
            residual,
            tau,
            y_old,
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

impl<T: Scalar> Stepper<T> for ImplicitEuler<T> {
    fn step(&mut self, tau: T, y: &mut DVector<T>) -> Result<()> {
        check_state_len(self.rhs.nstates(), y)?;
        self.y_old.set(y);
        self.tau.set(tau);
        self.x.copy_from(y);
        self.newton.solve_in_place(&*self.residual, &mut self.x)?;
        y.copy_from(&self.x);
        Ok(())
    }
}
