//! A mass-spring model exposed as a nonlinear operator.
//!
//! The model holds fixed anchors, point masses, springs and distance
//! constraints in `D` spatial dimensions. [`MssForce`] maps positions (and
//! Lagrange multipliers, when constraints are present) to accelerations and
//! constraint residuals; [`MssDynamics`] wraps that into the first-order
//! system a time-stepper consumes. Both provide a single generic evaluator,
//! so their Jacobians come from the dual-number algebra for free.

use std::rc::Rc;

use nalgebra::{DVector, SVector};
use num_traits::Zero;

use crate::dual::{vec_norm, DualScalar};
use crate::op::{DualFunction, DualOp, OpHandle};
use crate::scalar::Scalar;

/// A point a spring or constraint can attach to: either a fixed anchor or a
/// movable mass, by index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Connector {
    Fix(usize),
    Mass(usize),
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fix<T: Scalar, const D: usize> {
    pub pos: SVector<T, D>,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mass<T: Scalar, const D: usize> {
    pub mass: T,
    pub pos: SVector<T, D>,
    pub vel: SVector<T, D>,
    pub acc: SVector<T, D>,
}

impl<T: Scalar, const D: usize> Mass<T, D> {
    /// A mass at rest at `pos`.
    pub fn new(mass: T, pos: SVector<T, D>) -> Self {
        Self {
            mass,
            pos,
            vel: SVector::zeros(),
            acc: SVector::zeros(),
        }
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spring<T: Scalar> {
    /// Rest length.
    pub length: T,
    pub stiffness: T,
    pub connectors: [Connector; 2],
}

/// `|p2 - p1|^2 - length^2 = 0`, enforced through a Lagrange multiplier.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceConstraint<T: Scalar> {
    pub length: T,
    pub connectors: [Connector; 2],
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MassSpringSystem<T: Scalar, const D: usize> {
    fixes: Vec<Fix<T, D>>,
    masses: Vec<Mass<T, D>>,
    springs: Vec<Spring<T>>,
    constraints: Vec<DistanceConstraint<T>>,
    gravity: SVector<T, D>,
}

impl<T: Scalar, const D: usize> Default for MassSpringSystem<T, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar, const D: usize> MassSpringSystem<T, D> {
    pub fn new() -> Self {
        Self {
            fixes: Vec::new(),
            masses: Vec::new(),
            springs: Vec::new(),
            constraints: Vec::new(),
            gravity: SVector::zeros(),
        }
    }

    pub fn set_gravity(&mut self, gravity: SVector<T, D>) {
        self.gravity = gravity;
    }

    pub fn gravity(&self) -> &SVector<T, D> {
        &self.gravity
    }

    pub fn add_fix(&mut self, fix: Fix<T, D>) -> Connector {
        self.fixes.push(fix);
        Connector::Fix(self.fixes.len() - 1)
    }

    pub fn add_mass(&mut self, mass: Mass<T, D>) -> Connector {
        self.masses.push(mass);
        Connector::Mass(self.masses.len() - 1)
    }

    pub fn add_spring(&mut self, spring: Spring<T>) -> usize {
        self.springs.push(spring);
        self.springs.len() - 1
    }

    pub fn add_constraint(&mut self, constraint: DistanceConstraint<T>) -> usize {
        self.constraints.push(constraint);
        self.constraints.len() - 1
    }

    pub fn fixes(&self) -> &[Fix<T, D>] {
        &self.fixes
    }

    pub fn masses(&self) -> &[Mass<T, D>] {
        &self.masses
    }

    pub fn masses_mut(&mut self) -> &mut [Mass<T, D>] {
        &mut self.masses
    }

    pub fn springs(&self) -> &[Spring<T>] {
        &self.springs
    }

    pub fn constraints(&self) -> &[DistanceConstraint<T>] {
        &self.constraints
    }

    /// Number of position coordinates, `D * masses`.
    pub fn n_coords(&self) -> usize {
        D * self.masses.len()
    }

    /// Copy positions, velocities and accelerations into flat vectors laid
    /// out mass-major (`D` entries per mass).
    pub fn get_state(&self, pos: &mut DVector<T>, vel: &mut DVector<T>, acc: &mut DVector<T>) {
        for (i, m) in self.masses.iter().enumerate() {
            for d in 0..D {
                pos[i * D + d] = m.pos[d];
                vel[i * D + d] = m.vel[d];
                acc[i * D + d] = m.acc[d];
            }
        }
    }

    /// Inverse of [`MassSpringSystem::get_state`].
    pub fn set_state(&mut self, pos: &DVector<T>, vel: &DVector<T>, acc: &DVector<T>) {
        for (i, m) in self.masses.iter_mut().enumerate() {
            for d in 0..D {
                m.pos[d] = pos[i * D + d];
                m.vel[d] = vel[i * D + d];
                m.acc[d] = acc[i * D + d];
            }
        }
    }
}

fn connector_pos<T: Scalar, S: DualScalar<T>, const D: usize>(
    system: &MassSpringSystem<T, D>,
    x: &[S],
    connector: Connector,
) -> [S; D] {
    match connector {
        Connector::Fix(i) => std::array::from_fn(|d| S::constant(system.fixes()[i].pos[d])),
        Connector::Mass(i) => std::array::from_fn(|d| x[i * D + d].clone()),
    }
}

/// Positions (and multipliers) to accelerations (and constraint residuals).
///
/// The input is `[q, lambda]` of length `D*M + C`; the output's first `D*M`
/// entries are `(F_gravity + F_spring + sum_c lambda_c grad g_c) / m` and
/// the trailing `C` entries are the constraint residuals
/// `|p2 - p1|^2 - L^2`. The multiplier columns are divided by the mass
/// together with the force rows.
pub struct MssForce<T: Scalar, const D: usize> {
    system: Rc<MassSpringSystem<T, D>>,
}

impl<T: Scalar, const D: usize> MssForce<T, D> {
    pub fn new(system: Rc<MassSpringSystem<T, D>>) -> Self {
        Self { system }
    }

    pub fn system(&self) -> &MassSpringSystem<T, D> {
        &self.system
    }

    /// Wrap into a shared operator with an AD-derived Jacobian.
    pub fn into_op(self) -> OpHandle<T> {
        OpHandle::new(DualOp::new(self))
    }
}

impl<T: Scalar, const D: usize> DualFunction<T> for MssForce<T, D> {
    fn nstates(&self) -> usize {
        self.system.n_coords() + self.system.constraints().len()
    }

    fn nout(&self) -> usize {
        self.nstates()
    }

    fn eval<S: DualScalar<T>>(&self, x: &[S], f: &mut [S]) {
        let sys = &*self.system;
        let nq = sys.n_coords();

        // gravity enters as a force so that the mass division below treats
        // all contributions uniformly
        for (i, m) in sys.masses().iter().enumerate() {
            for d in 0..D {
                f[i * D + d] = S::constant(m.mass * sys.gravity()[d]);
            }
        }

        for spring in sys.springs() {
            let [c1, c2] = spring.connectors;
            let p1 = connector_pos(sys, x, c1);
            let p2 = connector_pos(sys, x, c2);
            let diff: [S; D] = std::array::from_fn(|d| p1[d].clone() - p2[d].clone());
            let dist = vec_norm(&diff);
            let force = (dist.clone() - spring.length) * spring.stiffness;
            // unit vector from p1 towards p2
            let dir: [S; D] =
                std::array::from_fn(|d| (p2[d].clone() - p1[d].clone()) / dist.clone());
            if let Connector::Mass(i) = c1 {
                for d in 0..D {
                    f[i * D + d] += force.clone() * dir[d].clone();
                }
            }
            if let Connector::Mass(i) = c2 {
                for d in 0..D {
                    f[i * D + d] -= force.clone() * dir[d].clone();
                }
            }
        }

        for (c, constraint) in sys.constraints().iter().enumerate() {
            let lambda = x[nq + c].clone();
            let [c1, c2] = constraint.connectors;
            let p1 = connector_pos(sys, x, c1);
            let p2 = connector_pos(sys, x, c2);
            // g = |p2 - p1|^2 - L^2, so grad_p1 g = -2 (p2 - p1) and
            // grad_p2 g = 2 (p2 - p1)
            if let Connector::Mass(i) = c1 {
                for d in 0..D {
                    f[i * D + d] -= lambda.clone()
                        * (p2[d].clone() - p1[d].clone())
                        * T::from(2.0);
                }
            }
            if let Connector::Mass(i) = c2 {
                for d in 0..D {
                    f[i * D + d] += lambda.clone()
                        * (p2[d].clone() - p1[d].clone())
                        * T::from(2.0);
                }
            }
        }

        for (i, m) in sys.masses().iter().enumerate() {
            for d in 0..D {
                f[i * D + d] = f[i * D + d].clone() / m.mass;
            }
        }

        for (c, constraint) in sys.constraints().iter().enumerate() {
            let [c1, c2] = constraint.connectors;
            let p1 = connector_pos(sys, x, c1);
            let p2 = connector_pos(sys, x, c2);
            let mut dist_sq = S::constant(T::zero());
            for d in 0..D {
                let delta = p2[d].clone() - p1[d].clone();
                dist_sq += delta.clone() * delta;
            }
            f[nq + c] = dist_sq - constraint.length * constraint.length;
        }
    }
}

/// The first-order system `(q, v, lambda) -> (v, a(q, lambda), g(q))` of
/// length `2*D*M + C`, ready for the time-steppers. With constraints
/// present the trailing [`MssDynamics::n_algebraic`] components are
/// algebraic and should be integrated with
/// [`crate::ode_solver::ImplicitEuler::with_algebraic`].
pub struct MssDynamics<T: Scalar, const D: usize> {
    force: MssForce<T, D>,
}

impl<T: Scalar, const D: usize> MssDynamics<T, D> {
    pub fn new(system: Rc<MassSpringSystem<T, D>>) -> Self {
        Self {
            force: MssForce::new(system),
        }
    }

    /// Number of trailing algebraic components (one per constraint).
    pub fn n_algebraic(&self) -> usize {
        self.force.system().constraints().len()
    }

    pub fn into_op(self) -> OpHandle<T> {
        OpHandle::new(DualOp::new(self))
    }
}

impl<T: Scalar, const D: usize> DualFunction<T> for MssDynamics<T, D> {
    fn nstates(&self) -> usize {
        2 * self.force.system().n_coords() + self.n_algebraic()
    }

    fn nout(&self) -> usize {
        self.nstates()
    }

    fn eval<S: DualScalar<T>>(&self, x: &[S], f: &mut [S]) {
        let nq = self.force.system().n_coords();
        let nc = self.n_algebraic();

        // q' = v
        for i in 0..nq {
            f[i] = x[nq + i].clone();
        }

        // the force map sees [q, lambda]
        let mut args: Vec<S> = Vec::with_capacity(nq + nc);
        args.extend(x[..nq].iter().cloned());
        args.extend(x[2 * nq..].iter().cloned());
        let mut out = vec![S::constant(T::zero()); nq + nc];
        self.force.eval(&args, &mut out);

        for i in 0..nq {
            f[nq + i] = out[i].clone();
        }
        for c in 0..nc {
            f[2 * nq + c] = out[nq + c].clone();
        }
    }
}
