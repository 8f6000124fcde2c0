use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("cannot build {what}: operand dimensions {left} and {right} do not agree")]
    ShapeMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },
    #[error("expected a vector of length {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("tableau is not explicit: a[({row}, {col})] is nonzero")]
    NotExplicit { row: usize, col: usize },
    #[error("invalid Butcher tableau: {0}")]
    InvalidTableau(&'static str),
    #[error("LU not initialized")]
    LuNotInitialized,
    #[error("matrix is singular")]
    SingularMatrix,
    #[error("linear solve failed inside Newton: jacobian is singular")]
    NewtonSingularJacobian,
    #[error("Newton iteration did not converge within {iterations} iterations")]
    NewtonDivergence { iterations: usize },
    #[error("residual is not finite (NaN or infinity encountered)")]
    NumericDomain,
}
