//! Butcher tableaux and the quadrature machinery that derives them.
//!
//! Gauss-Legendre and Radau IIA nodes are located by root-finding on the
//! Legendre three-term recurrence; the recurrence is written against the
//! [`DualScalar`] algebra, so the derivative needed by the Newton polish
//! comes from the crate's own forward-mode AD rather than a hand-derived
//! formula.

use nalgebra::{DMatrix, DVector};
use num_traits::{One, Zero};

use crate::dual::{Dual, DualScalar};
use crate::error::{Error, Result};
use crate::scalar::Scalar;

/// Legendre polynomial `P_n(x)` by the three-term recurrence
/// `(k+1) P_{k+1} = (2k+1) x P_k - k P_{k-1}`, generic over the scalar
/// algebra so it can be differentiated with [`Dual`] inputs.
pub fn legendre<T: Scalar, S: DualScalar<T>>(n: usize, x: S) -> S {
    let mut p0 = S::constant(T::one());
    if n == 0 {
        return p0;
    }
    let mut p1 = x.clone();
    for k in 1..n {
        let kf = T::from(k as f64);
        let alpha = (T::from(2.0) * kf + T::one()) / (kf + T::one());
        let beta = kf / (kf + T::one());
        let p2 = x.clone() * p1.clone() * alpha - p0 * beta;
        p0 = p1;
        p1 = p2;
    }
    p1
}

// value and first derivative of P_n at a plain scalar, via one dual pass
fn legendre_with_deriv<T: Scalar>(n: usize, x: T) -> (T, T) {
    let d = legendre(n, Dual::variable(x, 0, 1));
    (d.value(), d.derivative(0))
}

const NODE_TOL: f64 = 1e-14;

/// Gauss-Legendre collocation nodes and weights on `[0, 1]`, ascending in
/// the node. The nodes are the roots of `P_s` shifted to the unit interval;
/// the weights come from the classical identity
/// `w_i = 2 / ((1 - x_i^2) P_s'(x_i)^2)`.
pub fn gauss_legendre_nodes<T: Scalar>(s: usize) -> Result<(DVector<T>, DVector<T>)> {
    if s == 0 {
        return Err(Error::InvalidTableau("stage count must be at least one"));
    }
    let mut c = DVector::zeros(s);
    let mut b = DVector::zeros(s);
    for i in 0..s {
        // Chebyshev-like initial guess, then Newton on P_s
        let angle = std::f64::consts::PI * (i as f64 + 0.75) / (s as f64 + 0.5);
        let mut t = T::from(angle.cos());
        for _ in 0..100 {
            let (p, dp) = legendre_with_deriv(s, t);
            let step = p / dp;
            t -= step;
            if step.abs() < T::from(NODE_TOL) {
                break;
            }
        }
        let (_, dp) = legendre_with_deriv(s, t);
        // i = 0 finds the largest root, and the mapping (1 - t)/2 both
        // shifts to [0, 1] and makes the sequence ascending
        c[i] = (T::one() - t) / T::from(2.0);
        b[i] = T::one() / ((T::one() - t * t) * dp * dp);
    }
    Ok((c, b))
}

/// Radau IIA collocation nodes and weights on `[0, 1]`, ascending in the
/// node with the rightmost node equal to one.
///
/// The nodes are the roots of `P_s + P_{s-1}` (which always include the
/// left endpoint) mirrored onto the unit interval; the weights use the
/// canonical Radau identities `w = 2/s^2` at the endpoint and
/// `w_i = 1 / ((1 - t_i) P_{s-1}'(t_i)^2)` inside, rather than trusting the
/// tabulation round-trip.
pub fn radau_nodes<T: Scalar>(s: usize) -> Result<(DVector<T>, DVector<T>)> {
    if s == 0 {
        return Err(Error::InvalidTableau("stage count must be at least one"));
    }
    let q = |t: T| -> T { legendre(s, t) + legendre(s - 1, t) };

    // t = -1 is always a root; bracket the s - 1 interior roots by a sign
    // scan and close in with bisection
    let mut roots = vec![-T::one()];
    let grid = 200 * s;
    let mut prev_t = -T::one() + T::from(1e-9);
    let mut prev_q = q(prev_t);
    for g in 1..=grid {
        let x = -1.0 + 1e-9 + (2.0 - 2e-9) * (g as f64) / (grid as f64);
        let t = T::from(x);
        let qt = q(t);
        if prev_q * qt < T::zero() {
            let (mut lo, mut hi) = (prev_t, t);
            let mut qlo = prev_q;
            for _ in 0..80 {
                let mid = (lo + hi) / T::from(2.0);
                let qmid = q(mid);
                if qlo * qmid <= T::zero() {
                    hi = mid;
                } else {
                    lo = mid;
                    qlo = qmid;
                }
                if (hi - lo).abs() < T::from(NODE_TOL) {
                    break;
                }
            }
            roots.push((lo + hi) / T::from(2.0));
        }
        prev_t = t;
        prev_q = qt;
    }
    if roots.len() != s {
        return Err(Error::InvalidTableau("radau node search failed"));
    }

    let mut pairs: Vec<(T, T)> = roots
        .into_iter()
        .map(|t| {
            let weight = if t == -T::one() {
                T::from(2.0) / T::from((s * s) as f64)
            } else {
                let (_, dp) = legendre_with_deriv(s - 1, t);
                T::one() / ((T::one() - t) * dp * dp)
            };
            // mirror onto [0, 1]: the left-endpoint root becomes c = 1
            ((T::one() - t) / T::from(2.0), weight / T::from(2.0))
        })
        .collect();
    pairs.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap_or(std::cmp::Ordering::Equal));

    let c = DVector::from_iterator(s, pairs.iter().map(|p| p.0));
    let b = DVector::from_iterator(s, pairs.iter().map(|p| p.1));
    Ok((c, b))
}

/// Derive the full coefficient set from collocation nodes `c` by solving
/// the Vandermonde systems
/// `sum_j c_j^k a_ij = c_i^{k+1} / (k+1)` and
/// `sum_j c_j^k b_j = 1 / (k+1)` for `k = 0 .. s-1`.
///
/// Fails with [`Error::SingularMatrix`] if the nodes are not pairwise
/// distinct.
pub fn compute_ab_from_c<T: Scalar>(c: &DVector<T>) -> Result<(DMatrix<T>, DVector<T>)> {
    let s = c.len();
    if s == 0 {
        return Err(Error::InvalidTableau("stage count must be at least one"));
    }
    let mut vandermonde = DMatrix::zeros(s, s);
    for j in 0..s {
        let mut power = T::one();
        for k in 0..s {
            vandermonde[(k, j)] = power;
            power *= c[j];
        }
    }
    let lu = vandermonde.lu();

    let rhs_b = DVector::from_fn(s, |k, _| T::one() / T::from((k + 1) as f64));
    let b = lu.solve(&rhs_b).ok_or(Error::SingularMatrix)?;

    let mut a = DMatrix::zeros(s, s);
    for i in 0..s {
        let rhs = DVector::from_fn(s, |k, _| {
            let mut power = T::one();
            for _ in 0..=k {
                power *= c[i];
            }
            // c_i^{k+1} / (k+1)
            power / T::from((k + 1) as f64)
        });
        let row = lu.solve(&rhs).ok_or(Error::SingularMatrix)?;
        for j in 0..s {
            a[(i, j)] = row[j];
        }
    }
    Ok((a, b))
}

/// A Runge-Kutta tableau `(a, b, c)` with `s` stages.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tableau<T: Scalar> {
    a: DMatrix<T>,
    b: DVector<T>,
    c: DVector<T>,
}

impl<T: Scalar> Tableau<T> {
    const CONSISTENCY_TOL: f64 = 1e-8;

    /// Build a tableau, validating the consistency conditions
    /// `c_i = sum_j a_ij` and `sum_i b_i = 1`.
    pub fn new(a: DMatrix<T>, b: DVector<T>, c: DVector<T>) -> Result<Self> {
        let s = c.len();
        if s == 0 {
            return Err(Error::InvalidTableau("stage count must be at least one"));
        }
        if a.nrows() != s || a.ncols() != s || b.len() != s {
            return Err(Error::InvalidTableau("a, b and c must share the stage count"));
        }
        let tol = T::from(Self::CONSISTENCY_TOL);
        for i in 0..s {
            let mut row_sum = T::zero();
            for j in 0..s {
                row_sum += a[(i, j)];
            }
            if (row_sum - c[i]).abs() > tol {
                return Err(Error::InvalidTableau("row sums of a must equal c"));
            }
        }
        if (b.sum() - T::one()).abs() > tol {
            return Err(Error::InvalidTableau("weights must sum to one"));
        }
        Ok(Self { a, b, c })
    }

    pub fn stages(&self) -> usize {
        self.c.len()
    }

    pub fn a(&self) -> &DMatrix<T> {
        &self.a
    }

    pub fn b(&self) -> &DVector<T> {
        &self.b
    }

    pub fn c(&self) -> &DVector<T> {
        &self.c
    }

    /// True if `a` is strictly lower triangular, i.e. every stage depends
    /// only on earlier stages.
    pub fn is_explicit(&self) -> bool {
        for i in 0..self.stages() {
            for j in i..self.stages() {
                if !self.a[(i, j)].is_zero() {
                    return false;
                }
            }
        }
        true
    }

    /// The forward Euler method as a one-stage tableau.
    pub fn explicit_euler() -> Self {
        Self {
            a: DMatrix::zeros(1, 1),
            b: DVector::from_element(1, T::one()),
            c: DVector::zeros(1),
        }
    }

    /// The explicit midpoint method.
    pub fn midpoint() -> Self {
        let half = T::from(0.5);
        let mut a = DMatrix::zeros(2, 2);
        a[(1, 0)] = half;
        Self {
            a,
            b: DVector::from_vec(vec![T::zero(), T::one()]),
            c: DVector::from_vec(vec![T::zero(), half]),
        }
    }

    /// The classic fourth-order method.
    pub fn rk4() -> Self {
        let half = T::from(0.5);
        let sixth = T::one() / T::from(6.0);
        let third = T::one() / T::from(3.0);
        let mut a = DMatrix::zeros(4, 4);
        a[(1, 0)] = half;
        a[(2, 1)] = half;
        a[(3, 2)] = T::one();
        Self {
            a,
            b: DVector::from_vec(vec![sixth, third, third, sixth]),
            c: DVector::from_vec(vec![T::zero(), half, half, T::one()]),
        }
    }

    /// Gauss-Legendre collocation with `s` stages (order `2s`).
    pub fn gauss_legendre(s: usize) -> Result<Self> {
        let (c, b) = gauss_legendre_nodes(s)?;
        let (a, _) = compute_ab_from_c(&c)?;
        Self::new(a, b, c)
    }

    /// Radau IIA collocation with `s` stages (order `2s - 1`).
    pub fn radau_iia(s: usize) -> Result<Self> {
        let (c, b) = radau_nodes(s)?;
        let (a, _) = compute_ab_from_c(&c)?;
        Self::new(a, b, c)
    }

    /// Collocation tableau for arbitrary pairwise-distinct nodes.
    pub fn from_nodes(c: &DVector<T>) -> Result<Self> {
        let (a, b) = compute_ab_from_c(c)?;
        Self::new(a, b, c.clone())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn legendre_values_and_derivatives_via_ad() {
        let d = legendre(2, Dual::variable(0.5_f64, 0, 1));
        assert_relative_eq!(d.value(), -0.125, epsilon = 1e-14);
        assert_relative_eq!(d.derivative(0), 1.5, epsilon = 1e-14);

        let p5 = legendre(5, 0.5_f64);
        assert_relative_eq!(p5, 0.08984375, epsilon = 1e-14);
    }

    #[test]
    fn gauss_legendre_low_orders_match_closed_forms() {
        let (c, b) = gauss_legendre_nodes::<f64>(1).unwrap();
        assert_relative_eq!(c[0], 0.5, epsilon = 1e-13);
        assert_relative_eq!(b[0], 1.0, epsilon = 1e-13);

        let (c, b) = gauss_legendre_nodes::<f64>(2).unwrap();
        let offset = 3.0_f64.sqrt() / 6.0;
        assert_relative_eq!(c[0], 0.5 - offset, epsilon = 1e-13);
        assert_relative_eq!(c[1], 0.5 + offset, epsilon = 1e-13);
        assert_relative_eq!(b[0], 0.5, epsilon = 1e-13);
        assert_relative_eq!(b[1], 0.5, epsilon = 1e-13);

        let (c, b) = gauss_legendre_nodes::<f64>(3).unwrap();
        let offset = 15.0_f64.sqrt() / 10.0;
        assert_relative_eq!(c[0], 0.5 - offset, epsilon = 1e-13);
        assert_relative_eq!(c[1], 0.5, epsilon = 1e-13);
        assert_relative_eq!(c[2], 0.5 + offset, epsilon = 1e-13);
        assert_relative_eq!(b[0], 5.0 / 18.0, epsilon = 1e-13);
        assert_relative_eq!(b[1], 4.0 / 9.0, epsilon = 1e-13);
        assert_relative_eq!(b[2], 5.0 / 18.0, epsilon = 1e-13);
    }

    #[test]
    fn radau_nodes_match_canonical_values() {
        let (c, b) = radau_nodes::<f64>(1).unwrap();
        assert_relative_eq!(c[0], 1.0, epsilon = 1e-13);
        assert_relative_eq!(b[0], 1.0, epsilon = 1e-13);

        let (c, b) = radau_nodes::<f64>(2).unwrap();
        assert_relative_eq!(c[0], 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(c[1], 1.0, epsilon = 1e-13);
        assert_relative_eq!(b[0], 0.75, epsilon = 1e-12);
        assert_relative_eq!(b[1], 0.25, epsilon = 1e-12);

        let (c, b) = radau_nodes::<f64>(3).unwrap();
        let sqrt6 = 6.0_f64.sqrt();
        assert_relative_eq!(c[0], (4.0 - sqrt6) / 10.0, epsilon = 1e-11);
        assert_relative_eq!(c[1], (4.0 + sqrt6) / 10.0, epsilon = 1e-11);
        assert_relative_eq!(c[2], 1.0, epsilon = 1e-13);
        assert_relative_eq!(b[0], (16.0 - sqrt6) / 36.0, epsilon = 1e-11);
        assert_relative_eq!(b[1], (16.0 + sqrt6) / 36.0, epsilon = 1e-11);
        assert_relative_eq!(b[2], 1.0 / 9.0, epsilon = 1e-12);
    }

    #[test]
    fn weights_roundtrip_through_the_vandermonde_solve() {
        for s in 1..=4 {
            let (c, b) = gauss_legendre_nodes::<f64>(s).unwrap();
            let (a, b2) = compute_ab_from_c(&c).unwrap();
            assert!((b.clone() - b2).amax() < 1e-12);
            // row sums reproduce the nodes
            for i in 0..s {
                let row_sum: f64 = (0..s).map(|j| a[(i, j)]).sum();
                assert_relative_eq!(row_sum, c[i], epsilon = 1e-12);
            }
        }
        for s in 1..=4 {
            let (c, b) = radau_nodes::<f64>(s).unwrap();
            let (_, b2) = compute_ab_from_c(&c).unwrap();
            assert!((b.clone() - b2).amax() < 1e-12);
        }
    }

    #[test]
    fn duplicate_nodes_are_singular() {
        let c = DVector::from_vec(vec![0.5, 0.5]);
        assert_eq!(
            compute_ab_from_c(&c).unwrap_err(),
            Error::SingularMatrix
        );
    }

    #[test]
    fn gauss_two_matches_the_standard_tableau() {
        let t = Tableau::<f64>::gauss_legendre(2).unwrap();
        let root3 = 3.0_f64.sqrt();
        assert_relative_eq!(t.a()[(0, 0)], 0.25, epsilon = 1e-12);
        assert_relative_eq!(t.a()[(0, 1)], 0.25 - root3 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(t.a()[(1, 0)], 0.25 + root3 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(t.a()[(1, 1)], 0.25, epsilon = 1e-12);
        assert!(!t.is_explicit());
    }

    #[test]
    fn classic_tableaux_validate_and_classify() {
        assert!(Tableau::<f64>::explicit_euler().is_explicit());
        assert!(Tableau::<f64>::midpoint().is_explicit());
        let rk4 = Tableau::<f64>::rk4();
        assert!(rk4.is_explicit());
        // the constructors produce data new() accepts
        assert!(Tableau::new(rk4.a().clone(), rk4.b().clone(), rk4.c().clone()).is_ok());
        assert!(!Tableau::<f64>::radau_iia(2).unwrap().is_explicit());
    }

    #[test]
    fn new_rejects_inconsistent_data() {
        let a = DMatrix::zeros(1, 1);
        let b = DVector::from_element(1, 1.0);
        let c = DVector::from_element(1, 0.5);
        assert!(matches!(
            Tableau::<f64>::new(a, b, c),
            Err(Error::InvalidTableau(_))
        ));
    }
}
