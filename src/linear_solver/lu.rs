use nalgebra::{DMatrix, DVector, Dyn};

use crate::error::{Error, Result};
use crate::scalar::Scalar;

/// Dense LU factorisation with partial pivoting, the linear solve behind
/// Newton. Factorise once, then solve any number of right-hand sides in
/// place.
pub struct LU<T: Scalar> {
    lu: Option<nalgebra::linalg::LU<T, Dyn, Dyn>>,
}

impl<T: Scalar> Default for LU<T> {
    fn default() -> Self {
        Self { lu: None }
    }
}

impl<T: Scalar> LU<T> {
    pub fn factorize(&mut self, a: DMatrix<T>) {
        self.lu = Some(a.lu());
    }

    /// Solve `A x = b`, overwriting `b` with `x`.
    pub fn solve_in_place(&self, b: &mut DVector<T>) -> Result<()> {
        let lu = self.lu.as_ref().ok_or(Error::LuNotInitialized)?;
        if lu.solve_mut(b) {
            Ok(())
        } else {
            Err(Error::SingularMatrix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_a_dense_system() {
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 2.0]);
        let mut lu = LU::default();
        lu.factorize(a);
        let mut b = DVector::from_vec(vec![2.0, 4.0]);
        lu.solve_in_place(&mut b).unwrap();
        assert_eq!(b, DVector::from_vec(vec![1.0, 2.0]));
    }

    #[test]
    fn reports_singular_matrices() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let mut lu = LU::default();
        lu.factorize(a);
        let mut b = DVector::from_vec(vec![1.0, 0.0]);
        assert_eq!(lu.solve_in_place(&mut b), Err(Error::SingularMatrix));
    }

    #[test]
    fn reports_missing_factorisation() {
        let lu = LU::<f64>::default();
        let mut b = DVector::from_vec(vec![1.0]);
        assert_eq!(lu.solve_in_place(&mut b), Err(Error::LuNotInitialized));
    }
}
