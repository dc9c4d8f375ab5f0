use super::scalar::Scalar;

/// A 3D position, generic over the numeric kind (see [`Scalar`]).
///
/// Plain value type by design (spec.md §9 "Status keeper is a plain value
/// type"; the same texture applies here): no interior indirection, cheap to
/// copy, contiguous when stored in a `Vec<Point<T>>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<T: Scalar = f64> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T: Scalar> Point<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Point { x, y, z }
    }

    pub fn from_real(p: [f64; 3]) -> Self {
        Point {
            x: T::from_f64(p[0]),
            y: T::from_f64(p[1]),
            z: T::from_f64(p[2]),
        }
    }

    pub fn re(self) -> [f64; 3] {
        [self.x.re(), self.y.re(), self.z.re()]
    }

    pub fn component(&self, axis: usize) -> T {
        match axis {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => panic!("point axis out of range: {axis}"),
        }
    }

    pub fn dot(self, rhs: Self) -> T {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn scale(self, s: f64) -> Self {
        Point::new(self.x * s, self.y * s, self.z * s)
    }

    /// Squared Euclidean distance, taken on the real part only — used for
    /// pruning and ordering during spatial queries.
    pub fn distance_squared_re(self, rhs: Self) -> f64 {
        let d = self.re();
        let r = rhs.re();
        let dx = d[0] - r[0];
        let dy = d[1] - r[1];
        let dz = d[2] - r[2];
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance_re(self, rhs: Self) -> f64 {
        self.distance_squared_re(rhs).sqrt()
    }
}

impl<T: Scalar> std::ops::Add for Point<T> {
    type Output = Point<T>;
    fn add(self, rhs: Self) -> Self {
        Point::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl<T: Scalar> std::ops::Sub for Point<T> {
    type Output = Point<T>;
    fn sub(self, rhs: Self) -> Self {
        Point::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl<T: Scalar> std::ops::Mul<f64> for Point<T> {
    type Output = Point<T>;
    fn mul(self, rhs: f64) -> Self {
        self.scale(rhs)
    }
}

impl Point<f64> {
    pub fn to_nalgebra(self) -> nalgebra::Point3<f64> {
        nalgebra::Point3::new(self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn real_point_distance() {
        let a = Point::<f64>::new(0.0, 0.0, 0.0);
        let b = Point::<f64>::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance_re(b), 5.0);
    }

    #[test]
    fn complex_point_real_part_drives_distance() {
        let a = Point::<Complex64>::from_real([0.0, 0.0, 0.0]);
        let b = Point::<Complex64>::new(
            Complex64::new(3.0, 1e-12),
            Complex64::new(4.0, -1e-12),
            Complex64::new(0.0, 0.0),
        );
        assert!((a.distance_re(b) - 5.0).abs() < 1e-9);
    }
}
