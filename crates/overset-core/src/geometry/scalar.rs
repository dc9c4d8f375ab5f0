use num_complex::Complex64;

/// A numeric kind usable for mesh coordinates: either `f64` for the normal
/// path, or `Complex64` for adjoint-differentiated builds that carry a small
/// imaginary perturbation through the assembly.
///
/// Only the real part drives control flow (pruning, comparisons, octree
/// traversal); the imaginary part rides along through every arithmetic
/// operation so a differentiated host solver gets a consistent derivative
/// out of interpolation weights too.
pub trait Scalar:
    Copy
    + Clone
    + std::fmt::Debug
    + std::ops::Add<Output = Self>
    + std::ops::Sub<Output = Self>
    + std::ops::Mul<Output = Self>
    + std::ops::Mul<f64, Output = Self>
    + std::ops::Div<Output = Self>
    + std::ops::Neg<Output = Self>
{
    const ZERO: Self;
    const ONE: Self;

    fn from_f64(x: f64) -> Self;
    fn re(self) -> f64;
    fn abs_re(self) -> f64 {
        self.re().abs()
    }
}

impl Scalar for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    fn from_f64(x: f64) -> Self {
        x
    }

    fn re(self) -> f64 {
        self
    }
}

impl Scalar for Complex64 {
    const ZERO: Self = Complex64::new(0.0, 0.0);
    const ONE: Self = Complex64::new(1.0, 0.0);

    fn from_f64(x: f64) -> Self {
        Complex64::new(x, 0.0)
    }

    fn re(self) -> f64 {
        self.re
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_scalar_roundtrips() {
        assert_eq!(f64::from_f64(3.5).re(), 3.5);
    }

    #[test]
    fn complex_scalar_carries_imaginary_part() {
        let z = Complex64::new(1.0, 2.0);
        assert_eq!(z.re(), 1.0);
        assert_eq!((z * 2.0).im, 4.0);
    }
}
