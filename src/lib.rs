//! Dual-number automatic differentiation, a composable nonlinear-operator
//! algebra and one-step ODE solvers.
//!
//! The three layers build on each other:
//!
//! - [`dual`] provides forward-mode [`Dual`] scalars; any function body
//!   written against [`DualScalar`] yields values on plain floats and
//!   Jacobians on duals.
//! - [`op`] provides the [`NonLinearOp`] interface plus combinators (sum,
//!   scale, compose, embed, project, replicate, matrix coupling) for
//!   assembling residuals symbolically, with shared mutable
//!   [`Parameter`]/[`ConstantOp`] leaves.
//! - [`ode_solver`] drives `y' = f(y)` forward; the implicit steppers build
//!   residuals like `y - y_old - tau * f(y)` out of the combinators and
//!   solve them with [`Newton`], which linearises through the graph down to
//!   the AD leaves.
//!
//! [`tableau`] derives Gauss-Legendre and Radau IIA Butcher tableaux, and
//! [`mass_spring`] is a small physics front-end showing the intended usage,
//! including index-1 distance constraints via Lagrange multipliers.
//!
//! ```
//! use dualstep::ode_solver::{ImplicitEuler, Stepper};
//! use dualstep::{DualFunction, DualOp, DualScalar, OpHandle};
//! use nalgebra::DVector;
//!
//! struct Pendulum {
//!     length: f64,
//!     gravity: f64,
//! }
//!
//! impl DualFunction<f64> for Pendulum {
//!     fn nstates(&self) -> usize {
//!         2
//!     }
//!     fn nout(&self) -> usize {
//!         2
//!     }
//!     fn eval<S: DualScalar<f64>>(&self, x: &[S], f: &mut [S]) {
//!         f[0] = x[1].clone();
//!         f[1] = -(x[0].sin() * (self.gravity / self.length));
//!     }
//! }
//!
//! let rhs = OpHandle::new(DualOp::new(Pendulum {
//!     length: 1.0,
//!     gravity: 9.81,
//! }));
//! let mut stepper = ImplicitEuler::new(rhs).unwrap();
//! let mut y = DVector::from_vec(vec![0.5, 0.0]);
//! for _ in 0..100 {
//!     stepper.step(0.01, &mut y).unwrap();
//! }
//! assert!(y[0].abs() < 0.5);
//! ```

pub mod dual;
pub mod error;
pub mod linear_solver;
pub mod mass_spring;
pub mod nonlinear_solver;
pub mod ode_solver;
pub mod op;
pub mod scalar;
pub mod tableau;

pub use dual::{vec_norm, Dual, DualScalar};
pub use error::{Error, Result};
pub use linear_solver::LU;
pub use nonlinear_solver::Newton;
pub use ode_solver::{
    CrankNicolson, ExplicitEuler, ExplicitRungeKutta, ImplicitEuler, ImplicitRungeKutta,
    ImprovedEuler, Stepper,
};
pub use op::{
    Closure, ConstantOp, DualFunction, DualOp, NonLinearOp, Op, OpHandle, Parameter,
};
pub use scalar::Scalar;
pub use tableau::{compute_ab_from_c, gauss_legendre_nodes, radau_nodes, Tableau};
