use nalgebra::DVector;
use num_traits::{One, Zero};

use super::{check_rhs_square, check_state_len, Stepper};
use crate::error::Result;
use crate::nonlinear_solver::Newton;
use crate::op::{ConstantOp, MatVecOp, OpHandle, Parameter};
use crate::scalar::Scalar;
use crate::tableau::Tableau;

/// Fully implicit Runge-Kutta: the `s` stage vectors are packed into one
/// unknown of length `s*n` and solved jointly by Newton on
///
/// `K - Replicate(f, s)(y_rep + tau * (A (x) I) K) = 0`,
///
/// built from the operator combinators so the Jacobian assembly is
/// automatic. After the solve, `y <- y + tau * sum_i b_i K_i`.
pub struct ImplicitRungeKutta<T: Scalar> {
    rhs: OpHandle<T>,
    tableau: Tableau<T>,
    residual: OpHandle<T>,
    y_rep: ConstantOp<T>,
    tau: Parameter<T>,
    newton: Newton<T>,
    k: DVector<T>,
    f0: DVector<T>,
    y_rep_buf: DVector<T>,
}

impl<T: Scalar> ImplicitRungeKutta<T> {
    pub fn new(rhs: OpHandle<T>, tableau: Tableau<T>) -> Result<Self> {
        check_rhs_square(&rhs)?;
        let n = rhs.nstates();
        let s = tableau.stages();

        let y_rep = ConstantOp::zeros(s * n);
        let tau = Parameter::new(T::zero());
        let coupling = OpHandle::new(MatVecOp::new(tableau.a().clone(), n));
        let stage_args = OpHandle::new(y_rep.clone()) + tau.clone() * coupling;
        let stages = OpHandle::compose(rhs.replicate(s), stage_args)?;
        let residual = OpHandle::identity(s * n) - stages;

        Ok(Self {
            rhs,
            tableau,
            residual,
            y_rep,
            tau,
            newton: Newton::default(),
            k: DVector::zeros(s * n),
            f0: DVector::zeros(n),
            y_rep_buf: DVector::zeros(s * n),
        })
    }

    pub fn newton(&self) -> &Newton<T> {
        &self.newton
    }

    pub fn newton_mut(&mut self) -> &mut Newton<T> {
        &mut self.newton
    }
}

impl<T: Scalar> Stepper<T> for ImplicitRungeKutta<T> {
    fn step(&mut self, tau: T, y: &mut DVector<T>) -> Result<()> {
        let n = self.rhs.nstates();
        check_state_len(n, y)?;
        let s = self.tableau.stages();

        // warm start: every stage begins at f(y)
        self.rhs.call_inplace(y, &mut self.f0);
        for i in 0..s {
            self.y_rep_buf.rows_mut(i * n, n).copy_from(y);
            self.k.rows_mut(i * n, n).copy_from(&self.f0);
        }
        self.y_rep.set(&self.y_rep_buf);
        self.tau.set(tau);

        self.newton.solve_in_place(&*self.residual, &mut self.k)?;

        for i in 0..s {
            y.axpy(tau * self.tableau.b()[i], &self.k.rows(i * n, n), T::one());
        }
        Ok(())
    }
}
