use nalgebra::DVector;
use num_traits::{One, Zero};

use super::{check_rhs_square, check_state_len, Stepper};
use crate::error::{Error, Result};
use crate::op::OpHandle;
use crate::scalar::Scalar;
use crate::tableau::Tableau;

/// Explicit Runge-Kutta with a strictly lower-triangular tableau:
/// `k_i = f(y + tau * sum_{j<i} a_ij k_j)`, then
/// `y <- y + tau * sum_i b_i k_i`.
pub struct ExplicitRungeKutta<T: Scalar> {
    rhs: OpHandle<T>,
    tableau: Tableau<T>,
    k: Vec<DVector<T>>,
    y_stage: DVector<T>,
}

impl<T: Scalar> ExplicitRungeKutta<T> {
    pub fn new(rhs: OpHandle<T>, tableau: Tableau<T>) -> Result<Self> {
        check_rhs_square(&rhs)?;
        for i in 0..tableau.stages() {
            for j in i..tableau.stages() {
                if !tableau.a()[(i, j)].is_zero() {
                    return Err(Error::NotExplicit { row: i, col: j });
                }
            }
        }
        let n = rhs.nstates();
        let k = (0..tableau.stages()).map(|_| DVector::zeros(n)).collect();
        Ok(Self {
            rhs,
            tableau,
            k,
            y_stage: DVector::zeros(n),
        })
    }
}

impl<T: Scalar> Stepper<T> for ExplicitRungeKutta<T> {
    fn step(&mut self, tau: T, y: &mut DVector<T>) -> Result<()> {
        check_state_len(self.rhs.nstates(), y)?;
        let s = self.tableau.stages();
        for i in 0..s {
            self.y_stage.copy_from(y);
            for j in 0..i {
                let a_ij = self.tableau.a()[(i, j)];
                if !a_ij.is_zero() {
                    self.y_stage.axpy(tau * a_ij, &self.k[j], T::one());
                }
            }
            self.rhs.call_inplace(&self.y_stage, &mut self.k[i]);
        }
        for i in 0..s {
            y.axpy(tau * self.tableau.b()[i], &self.k[i], T::one());
        }
        Ok(())
    }
}
