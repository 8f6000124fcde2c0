//! Nonlinear operators and the combinator algebra over them.
//!
//! An operator maps `R^nstates -> R^nout` and can report its dense Jacobian.
//! Operators are composed structurally: nodes hold shared handles to their
//! children, so the same right-hand side can appear in several residual
//! graphs at once. The mutable leaves ([`Parameter`], [`ConstantOp`]) are
//! how a time-stepper injects `tau` and `y_old` into a residual built once
//! at construction.

use std::ops::{Add, Deref, Mul, Sub};
use std::rc::Rc;

use nalgebra::{DMatrix, DVector};
use num_traits::One;

use crate::error::Result;
use crate::scalar::Scalar;

pub mod closure;
pub mod compose;
pub mod constant;
pub mod dual_op;
pub mod embed;
pub mod identity;
pub mod matvec;
pub mod parameter;
pub mod projection;
pub mod replicate;
pub mod scale;
pub mod sum;

pub use closure::Closure;
pub use compose::ComposeOp;
pub use constant::ConstantOp;
pub use dual_op::{DualFunction, DualOp};
pub use embed::EmbedOp;
pub use identity::IdentityOp;
pub use matvec::MatVecOp;
pub use parameter::Parameter;
pub use projection::ProjectionOp;
pub use replicate::ReplicateOp;
pub use scale::ScaleOp;
pub use sum::SumOp;

/// Dimensions of an operator.
pub trait Op<T: Scalar> {
    /// Length of the input vector.
    fn nstates(&self) -> usize;
    /// Length of the output vector.
    fn nout(&self) -> usize;
}

/// A nonlinear operator with a dense Jacobian.
///
/// Implementations must not alias: `x` and `y` (or `x` and `jac`) are
/// distinct storage, and no caller-observable state may change during a
/// call except through [`Parameter`] and [`ConstantOp`] leaves.
pub trait NonLinearOp<T: Scalar>: Op<T> {
    /// Evaluate `f(x)` into `y` (length `nout`).
    fn call_inplace(&self, x: &DVector<T>, y: &mut DVector<T>);

    /// Evaluate the Jacobian `Df(x)` into `jac` (`nout x nstates`).
    fn jacobian_inplace(&self, x: &DVector<T>, jac: &mut DMatrix<T>);

    /// Allocating wrapper around [`NonLinearOp::call_inplace`].
    fn call(&self, x: &DVector<T>) -> DVector<T> {
        let mut y = DVector::zeros(self.nout());
        self.call_inplace(x, &mut y);
        y
    }

    /// Allocating wrapper around [`NonLinearOp::jacobian_inplace`].
    fn jacobian(&self, x: &DVector<T>) -> DMatrix<T> {
        let mut jac = DMatrix::zeros(self.nout(), self.nstates());
        self.jacobian_inplace(x, &mut jac);
        jac
    }
}

/// A cloneable shared handle to an operator node.
///
/// Handles carry the operator sugar: `a + b` and `a - b` build a [`SumOp`],
/// `parameter * a` and `scalar * a` build a [`ScaleOp`]. The operators
/// panic if the operand shapes disagree; use the fallible constructors of
/// the combinator types to handle that case gracefully.
pub struct OpHandle<T: Scalar>(Rc<dyn NonLinearOp<T>>);

impl<T: Scalar> Clone for OpHandle<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Scalar> std::fmt::Debug for OpHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpHandle")
            .field("nstates", &self.0.nstates())
            .field("nout", &self.0.nout())
            .finish()
    }
}

impl<T: Scalar> OpHandle<T> {
    pub fn new(op: impl NonLinearOp<T> + 'static) -> Self {
        Self(Rc::new(op))
    }

    /// The identity on `R^n`.
    pub fn identity(n: usize) -> Self {
        Self::new(IdentityOp::new(n))
    }

    /// `outer(inner(x))`.
    pub fn compose(outer: OpHandle<T>, inner: OpHandle<T>) -> Result<Self> {
        Ok(Self::new(ComposeOp::new(outer, inner)?))
    }

    /// Block-diagonal replication of `self`, `count` times.
    pub fn replicate(&self, count: usize) -> Self {
        Self::new(ReplicateOp::new(self.clone(), count))
    }

    /// Embed `self` into `R^dim_x -> R^dim_f`, acting on the input slice
    /// starting at `first_x` and writing the output slice starting at
    /// `first_f`; everything else is zero.
    pub fn embed(
        &self,
        first_x: usize,
        dim_x: usize,
        first_f: usize,
        dim_f: usize,
    ) -> Result<Self> {
        Ok(Self::new(EmbedOp::new(
            self.clone(),
            first_x,
            dim_x,
            first_f,
            dim_f,
        )?))
    }

    /// Scale by a shared [`Parameter`].
    pub fn scaled(&self, factor: &Parameter<T>) -> Self {
        Self::new(ScaleOp::new(self.clone(), factor.clone()))
    }
}

impl<T: Scalar> Deref for OpHandle<T> {
    type Target = dyn NonLinearOp<T>;
    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl<T: Scalar> Add for OpHandle<T> {
    type Output = OpHandle<T>;
    fn add(self, rhs: OpHandle<T>) -> OpHandle<T> {
        match SumOp::new(self, rhs, T::one(), T::one()) {
            Ok(sum) => OpHandle::new(sum),
            Err(e) => panic!("{e}"),
        }
    }
}

impl<T: Scalar> Sub for OpHandle<T> {
    type Output = OpHandle<T>;
    fn sub(self, rhs: OpHandle<T>) -> OpHandle<T> {
        match SumOp::new(self, rhs, T::one(), -T::one()) {
            Ok(sum) => OpHandle::new(sum),
            Err(e) => panic!("{e}"),
        }
    }
}

impl<T: Scalar> Mul<OpHandle<T>> for Parameter<T> {
    type Output = OpHandle<T>;
    fn mul(self, rhs: OpHandle<T>) -> OpHandle<T> {
        OpHandle::new(ScaleOp::new(rhs, self))
    }
}

impl Mul<OpHandle<f64>> for f64 {
    type Output = OpHandle<f64>;
    fn mul(self, rhs: OpHandle<f64>) -> OpHandle<f64> {
        Parameter::new(self) * rhs
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Central finite differences, the reference every AD Jacobian is
    /// checked against.
    pub(crate) fn finite_difference_jacobian(
        op: &dyn NonLinearOp<f64>,
        x: &DVector<f64>,
    ) -> DMatrix<f64> {
        let eps = 1e-6;
        let mut jac = DMatrix::zeros(op.nout(), op.nstates());
        for j in 0..op.nstates() {
            let mut xl = x.clone();
            let mut xr = x.clone();
            xl[j] -= eps;
            xr[j] += eps;
            let fl = op.call(&xl);
            let fr = op.call(&xr);
            for i in 0..op.nout() {
                jac[(i, j)] = (fr[i] - fl[i]) / (2.0 * eps);
            }
        }
        jac
    }

    #[test]
    fn sum_sugar_builds_the_residual_shape() {
        // R(x) = x - c, evaluated at x = c, must vanish
        let c = ConstantOp::from_vector(DVector::from_vec(vec![1.0, 2.0]));
        let r = OpHandle::identity(2) - OpHandle::new(c.clone());
        let y = r.call(&DVector::from_vec(vec![1.0, 2.0]));
        assert!(y.amax() < 1e-14);
        // mutating the shared leaf is observed by the graph
        c.set(&DVector::from_vec(vec![0.0, 0.0]));
        let y = r.call(&DVector::from_vec(vec![1.0, 2.0]));
        assert_eq!(y, DVector::from_vec(vec![1.0, 2.0]));
    }

    #[test]
    fn scalar_sugar_scales() {
        let r = 3.0 * OpHandle::identity(2);
        let y = r.call(&DVector::from_vec(vec![1.0, -2.0]));
        assert_eq!(y, DVector::from_vec(vec![3.0, -6.0]));
    }

    #[test]
    #[should_panic(expected = "cannot build sum")]
    fn mismatched_sum_panics() {
        let _ = OpHandle::<f64>::identity(2) + OpHandle::identity(3);
    }

    #[test]
    fn combinator_graph_jacobian_matches_finite_differences() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        use crate::DualScalar;

        struct Blend;
        impl DualFunction<f64> for Blend {
            fn nstates(&self) -> usize {
                3
            }
            fn nout(&self) -> usize {
                3
            }
            fn eval<S: DualScalar<f64>>(&self, x: &[S], f: &mut [S]) {
                f[0] = x[0].clone() * x[1].sin();
                f[1] = (x[0].clone() * x[2].clone()).exp();
                f[2] = x[1].clone() + x[2].clone() * x[2].clone();
            }
        }

        // a residual-shaped graph exercising sum, scale, compose, embed,
        // replicate and projection at once
        let leaf = OpHandle::new(DualOp::new(Blend));
        let p = Parameter::new(0.7);
        let affine = p * leaf.clone() + 2.0 * OpHandle::identity(3);
        let composed = OpHandle::compose(affine, leaf.clone()).unwrap();
        let embedded = leaf.embed(0, 4, 1, 4).unwrap();
        let projected = OpHandle::new(ProjectionOp::new(6, 1, 5).unwrap());
        let replicated = OpHandle::compose(leaf.replicate(2), projected).unwrap();

        let graphs: Vec<(OpHandle<f64>, usize)> =
            vec![(composed, 3), (embedded, 4), (replicated, 6)];
        let mut rng = StdRng::seed_from_u64(17);
        for (graph, n) in graphs {
            for _ in 0..4 {
                let x = DVector::from_fn(n, |_, _| rng.gen_range(-1.0..1.0));
                let jac = graph.jacobian(&x);
                let fd = finite_difference_jacobian(&*graph, &x);
                assert!((jac - fd).amax() < 1e-5);
            }
        }
    }
}
