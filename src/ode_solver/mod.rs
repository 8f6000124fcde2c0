//! One-step integrators for `y' = f(y)`.
//!
//! Explicit steppers evaluate the right-hand side directly. Implicit
//! steppers build their residual once at construction from the operator
//! combinators, retune the shared [`Parameter`]/[`ConstantOp`] leaves each
//! step and hand the system to Newton; on any solver error the state vector
//! is left exactly as it was before the step.

use nalgebra::DVector;

use crate::error::{Error, Result};
use crate::op::OpHandle;
use crate::scalar::Scalar;

pub mod crank_nicolson;
pub mod explicit_euler;
pub mod explicit_rk;
pub mod implicit_euler;
pub mod implicit_rk;
pub mod improved_euler;

pub use crank_nicolson::CrankNicolson;
pub use explicit_euler::ExplicitEuler;
pub use explicit_rk::ExplicitRungeKutta;
pub use implicit_euler::ImplicitEuler;
pub use implicit_rk::ImplicitRungeKutta;
pub use improved_euler::ImprovedEuler;

/// A one-step method: advances `y` in place by one step of size `tau`.
///
/// A stepper allocates its scratch at construction and is reusable for the
/// whole trajectory.
pub trait Stepper<T: Scalar> {
    fn step(&mut self, tau: T, y: &mut DVector<T>) -> Result<()>;
}

pub(crate) fn check_rhs_square<T: Scalar>(rhs: &OpHandle<T>) -> Result<()> {
    if rhs.nstates() != rhs.nout() {
        return Err(Error::ShapeMismatch {
            what: "ode right-hand side",
            left: rhs.nout(),
            right: rhs.nstates(),
        });
    }
    Ok(())
}

pub(crate) fn check_state_len<T: Scalar>(expected: usize, y: &DVector<T>) -> Result<()> {
    if y.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            got: y.len(),
        });
    }
    Ok(())
}
