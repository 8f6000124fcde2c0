use nalgebra::RealField;

/// Floating-point scalar the solvers are generic over.
///
/// `From<f64>` is how literal coefficients enter generic code, so in
/// practice this is `f64`.
pub trait Scalar: RealField + Copy + From<f64> + 'static {}

impl Scalar for f64 {}
