use std::ops::{Add, Sub, Neg, Mul, Div, BitXor};
use std::ops::{AddAssign, SubAssign, MulAssign, DivAssign};
use std::ops::{Deref, DerefMut};

use super::Matrix3;

/// A 3-dimensional vector type, used for positions, bond vectors and forces.
///
/// `a * b` is the dot product and `a ^ b` the cross product of two vectors.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[repr(transparent)]
pub struct Vector3D([f64; 3]);

impl Vector3D {
    /// Create a new `Vector3D` with components `x`, `y`, `z`
    pub const fn new(x: f64, y: f64, z: f64) -> Vector3D {
        Vector3D([x, y, z])
    }

    /// Create a new `Vector3D` with all components set to 0
    pub const fn zero() -> Vector3D {
        Vector3D([0.0, 0.0, 0.0])
    }

    /// Squared euclidean norm of the vector
    #[inline]
    pub fn norm2(&self) -> f64 {
        self * self
    }

    /// Euclidean norm of the vector
    #[inline]
    pub fn norm(&self) -> f64 {
        f64::sqrt(self.norm2())
    }

    /// Get a normalized version of this vector. The result contains NaN if
    /// the vector has zero norm.
    #[inline]
    pub fn normalized(&self) -> Vector3D {
        self / self.norm()
    }

    /// Tensor (outer) product of `self` and `other`, with
    /// `result[i][j] = self[i] * other[j]`.
    pub fn tensor_product(&self, other: Vector3D) -> Matrix3 {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                result[i][j] = self[i] * other[j];
            }
        }
        return result;
    }
}

impl From<[f64; 3]> for Vector3D {
    fn from(array: [f64; 3]) -> Vector3D {
        Vector3D(array)
    }
}

impl From<Vector3D> for [f64; 3] {
    fn from(vector: Vector3D) -> [f64; 3] {
        vector.0
    }
}

impl Deref for Vector3D {
    type Target = [f64; 3];
    #[inline]
    fn deref(&self) -> &[f64; 3] {
        &self.0
    }
}

impl DerefMut for Vector3D {
    #[inline]
    fn deref_mut(&mut self) -> &mut [f64; 3] {
        &mut self.0
    }
}

impl_arithmetic!(
    Vector3D, Vector3D, Add, add, Vector3D, self, other,
    Vector3D::new(self[0] + other[0], self[1] + other[1], self[2] + other[2])
);

impl_arithmetic!(
    Vector3D, Vector3D, Sub, sub, Vector3D, self, other,
    Vector3D::new(self[0] - other[0], self[1] - other[1], self[2] - other[2])
);

// dot product
impl_arithmetic!(
    Vector3D, Vector3D, Mul, mul, f64, self, other,
    self[0] * other[0] + self[1] * other[1] + self[2] * other[2]
);

// cross product
impl_arithmetic!(
    Vector3D, Vector3D, BitXor, bitxor, Vector3D, self, other,
    Vector3D::new(
        self[1] * other[2] - self[2] * other[1],
        self[2] * other[0] - self[0] * other[2],
        self[0] * other[1] - self[1] * other[0],
    )
);

lhs_scalar_arithmetic!(
    Vector3D, Mul, mul, Vector3D, self, other,
    Vector3D::new(self[0] * other, self[1] * other, self[2] * other)
);

lhs_scalar_arithmetic!(
    Vector3D, Div, div, Vector3D, self, other,
    Vector3D::new(self[0] / other, self[1] / other, self[2] / other)
);

rhs_scalar_arithmetic!(
    Vector3D, Mul, mul, Vector3D, self, other,
    Vector3D::new(self * other[0], self * other[1], self * other[2])
);

impl_inplace_arithmetic!(
    Vector3D, Vector3D, AddAssign, add_assign, self, other,
    {
        self[0] += other[0];
        self[1] += other[1];
        self[2] += other[2];
    }
);

impl_inplace_arithmetic!(
    Vector3D, Vector3D, SubAssign, sub_assign, self, other,
    {
        self[0] -= other[0];
        self[1] -= other[1];
        self[2] -= other[2];
    }
);

impl MulAssign<f64> for Vector3D {
    #[inline]
    fn mul_assign(&mut self, other: f64) {
        self[0] *= other;
        self[1] *= other;
        self[2] *= other;
    }
}

impl DivAssign<f64> for Vector3D {
    #[inline]
    fn div_assign(&mut self, other: f64) {
        self[0] /= other;
        self[1] /= other;
        self[2] /= other;
    }
}

impl Neg for Vector3D {
    type Output = Vector3D;
    #[inline]
    fn neg(self) -> Vector3D {
        Vector3D::new(-self[0], -self[1], -self[2])
    }
}

impl<'a> Neg for &'a Vector3D {
    type Output = Vector3D;
    #[inline]
    fn neg(self) -> Vector3D {
        Vector3D::new(-self[0], -self[1], -self[2])
    }
}

impl std::iter::Sum for Vector3D {
    fn sum<I: Iterator<Item = Vector3D>>(iter: I) -> Vector3D {
        iter.fold(Vector3D::zero(), |acc, v| acc + v)
    }
}

impl approx::AbsDiffEq for Vector3D {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Vector3D, epsilon: f64) -> bool {
        f64::abs_diff_eq(&self[0], &other[0], epsilon) &&
        f64::abs_diff_eq(&self[1], &other[1], epsilon) &&
        f64::abs_diff_eq(&self[2], &other[2], epsilon)
    }
}

impl approx::RelativeEq for Vector3D {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Vector3D, epsilon: f64, max_relative: f64) -> bool {
        f64::relative_eq(&self[0], &other[0], epsilon, max_relative) &&
        f64::relative_eq(&self[1], &other[1], epsilon, max_relative) &&
        f64::relative_eq(&self[2], &other[2], epsilon, max_relative)
    }
}

impl approx::UlpsEq for Vector3D {
    fn default_max_ulps() -> u32 {
        f64::default_max_ulps()
    }

    fn ulps_eq(&self, other: &Vector3D, epsilon: f64, max_ulps: u32) -> bool {
        f64::ulps_eq(&self[0], &other[0], epsilon, max_ulps) &&
        f64::ulps_eq(&self[1], &other[1], epsilon, max_ulps) &&
        f64::ulps_eq(&self[2], &other[2], epsilon, max_ulps)
    }
}
