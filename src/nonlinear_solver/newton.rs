use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};
use crate::linear_solver::LU;
use crate::op::NonLinearOp;
use crate::scalar::Scalar;

/// Full-step Newton iteration for `F(x) = 0` on a square operator.
///
/// Convergence is judged on the residual infinity norm: the iterate is
/// accepted once `||F(x)||_inf < tol`. The update norm is not inspected.
pub struct Newton<T: Scalar> {
    tol: T,
    max_iter: usize,
    niter: usize,
    linear_solver: LU<T>,
}

impl<T: Scalar> Default for Newton<T> {
    fn default() -> Self {
        Self::new(T::from(1e-10), 10)
    }
}

impl<T: Scalar> Newton<T> {
    pub fn new(tol: T, max_iter: usize) -> Self {
        Self {
            tol,
            max_iter,
            niter: 0,
            linear_solver: LU::default(),
        }
    }

    pub fn set_tol(&mut self, tol: T) {
        self.tol = tol;
    }

    pub fn set_max_iter(&mut self, max_iter: usize) {
        self.max_iter = max_iter;
    }

    /// Number of iterations taken by the most recent solve.
    pub fn niter(&self) -> usize {
        self.niter
    }

    /// Solve `f(x) = 0`, refining `x` in place.
    ///
    /// On error `x` holds the last iterate; callers that need the original
    /// value back are expected to keep their own copy.
    pub fn solve_in_place(&mut self, f: &dyn NonLinearOp<T>, x: &mut DVector<T>) -> Result<()> {
        self.solve_in_place_with(f, x, |_, _, _| ())
    }

    /// Like [`Newton::solve_in_place`], reporting
    /// `(iteration, iterate, residual_norm)` to `observer` once per
    /// iteration before the update is applied.
    pub fn solve_in_place_with(
        &mut self,
        f: &dyn NonLinearOp<T>,
        x: &mut DVector<T>,
        mut observer: impl FnMut(usize, &DVector<T>, T),
    ) -> Result<()> {
        let n = f.nstates();
        if f.nout() != n {
            return Err(Error::ShapeMismatch {
                what: "newton residual",
                left: f.nout(),
                right: n,
            });
        }
        if x.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                got: x.len(),
            });
        }

        let mut res = DVector::zeros(n);
        self.niter = 0;
        for iter in 0..self.max_iter {
            f.call_inplace(x, &mut res);
            let res_norm = res.amax();
            observer(iter, x, res_norm);
            if !res_norm.is_finite() {
                return Err(Error::NumericDomain);
            }
            if res_norm < self.tol {
                return Ok(());
            }

            self.linear_solver.factorize(f.jacobian(x));
            self.linear_solver
                .solve_in_place(&mut res)
                .map_err(|e| match e {
                    Error::SingularMatrix => Error::NewtonSingularJacobian,
                    other => other,
                })?;
            // res now holds the Newton update delta; x <- x - delta
            *x -= &res;
            self.niter = iter + 1;
        }

        // give the final iterate a chance before declaring divergence
        f.call_inplace(x, &mut res);
        if res.amax() < self.tol {
            return Ok(());
        }
        Err(Error::NewtonDivergence {
            iterations: self.max_iter,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::op::{DualFunction, DualOp};
    use crate::DualScalar;

    // F(x) = (x0^2 + x1^2 - 4, x0 - x1), roots at x0 = x1 = +-sqrt(2)
    struct Circle;
    impl DualFunction<f64> for Circle {
        fn nstates(&self) -> usize {
            2
        }
        fn nout(&self) -> usize {
            2
        }
        fn eval<S: DualScalar<f64>>(&self, x: &[S], f: &mut [S]) {
            f[0] = x[0].clone() * x[0].clone() + x[1].clone() * x[1].clone() - 4.0;
            f[1] = x[0].clone() - x[1].clone();
        }
    }

    #[test]
    fn converges_on_a_smooth_root() {
        let op = DualOp::new(Circle);
        let mut newton = Newton::default();
        let mut x = DVector::from_vec(vec![1.0, 2.0]);
        newton.solve_in_place(&op, &mut x).unwrap();
        let r = 2.0_f64.sqrt();
        assert_relative_eq!(x[0], r, epsilon = 1e-9);
        assert_relative_eq!(x[1], r, epsilon = 1e-9);
        assert!(newton.niter() <= 8);
    }

    #[test]
    fn observer_sees_monotone_iterations() {
        let op = DualOp::new(Circle);
        let mut newton = Newton::default();
        let mut x = DVector::from_vec(vec![1.0, 2.0]);
        let mut iters = Vec::new();
        newton
            .solve_in_place_with(&op, &mut x, |i, _, res| iters.push((i, res)))
            .unwrap();
        assert!(iters.len() >= 2);
        for w in iters.windows(2) {
            assert_eq!(w[1].0, w[0].0 + 1);
        }
        // final reported residual is the smallest
        assert!(iters.last().unwrap().1 <= iters.first().unwrap().1);
    }

    #[test]
    fn reports_singular_jacobians() {
        // F(x) = (x0 + x1, x0 + x1) has a rank-one jacobian everywhere
        struct Degenerate;
        impl DualFunction<f64> for Degenerate {
            fn nstates(&self) -> usize {
                2
            }
            fn nout(&self) -> usize {
                2
            }
            fn eval<S: DualScalar<f64>>(&self, x: &[S], f: &mut [S]) {
                f[0] = x[0].clone() + x[1].clone();
                f[1] = x[0].clone() + x[1].clone();
            }
        }
        let op = DualOp::new(Degenerate);
        let mut newton = Newton::default();
        let mut x = DVector::from_vec(vec![1.0, 1.0]);
        assert_eq!(
            newton.solve_in_place(&op, &mut x),
            Err(Error::NewtonSingularJacobian)
        );
    }

    #[test]
    fn reports_divergence() {
        // F(x) = x^2 + 1 has no real root; the iteration wanders forever
        struct NoRoot;
        impl DualFunction<f64> for NoRoot {
            fn nstates(&self) -> usize {
                1
            }
            fn nout(&self) -> usize {
                1
            }
            fn eval<S: DualScalar<f64>>(&self, x: &[S], f: &mut [S]) {
                f[0] = x[0].clone() * x[0].clone() + 1.0;
            }
        }
        let op = DualOp::new(NoRoot);
        let mut newton = Newton::default();
        let mut x = DVector::from_vec(vec![0.5]);
        assert_eq!(
            newton.solve_in_place(&op, &mut x),
            Err(Error::NewtonDivergence { iterations: 10 })
        );
    }

    #[test]
    fn rejects_wrong_sized_iterates() {
        let op = crate::op::ProjectionOp::new(3, 0, 2).unwrap();
        let mut newton = Newton::default();
        let mut x = DVector::from_vec(vec![0.0, 0.0]);
        assert!(matches!(
            newton.solve_in_place(&op, &mut x),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
