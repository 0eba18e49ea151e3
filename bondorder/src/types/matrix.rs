use std::ops::{Add, Sub, Mul, Index, IndexMut};
use std::ops::{AddAssign, SubAssign, MulAssign};

use super::Vector3D;

/// A 3x3 matrix type, stored in row-major order. Used for unit cells and
/// virial tensors.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Matrix3([[f64; 3]; 3]);

impl Matrix3 {
    /// Create a new `Matrix3` from the given rows
    pub const fn new(data: [[f64; 3]; 3]) -> Matrix3 {
        Matrix3(data)
    }

    /// Create a new `Matrix3` with all components set to 0
    pub const fn zero() -> Matrix3 {
        Matrix3([[0.0; 3]; 3])
    }

    /// Create the identity matrix
    pub const fn one() -> Matrix3 {
        Matrix3([
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ])
    }

    /// Sum of the diagonal elements
    pub fn trace(&self) -> f64 {
        self[0][0] + self[1][1] + self[2][2]
    }

    /// Determinant of the matrix
    pub fn determinant(&self) -> f64 {
        let m = &self.0;
        m[0][0] * (m[1][1] * m[2][2] - m[2][1] * m[1][2]) -
        m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0]) +
        m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Transposed copy of the matrix
    pub fn transposed(&self) -> Matrix3 {
        let m = &self.0;
        Matrix3([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }

    /// Inverse of the matrix. The result contains infinite or NaN values if
    /// the matrix is not invertible.
    pub fn inverse(&self) -> Matrix3 {
        let m = &self.0;
        let inv_det = 1.0 / self.determinant();

        let mut result = Matrix3::zero();
        result[0][0] = (m[1][1] * m[2][2] - m[2][1] * m[1][2]) * inv_det;
        result[0][1] = (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det;
        result[0][2] = (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det;
        result[1][0] = (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det;
        result[1][1] = (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det;
        result[1][2] = (m[1][0] * m[0][2] - m[0][0] * m[1][2]) * inv_det;
        result[2][0] = (m[1][0] * m[2][1] - m[2][0] * m[1][1]) * inv_det;
        result[2][1] = (m[2][0] * m[0][1] - m[0][0] * m[2][1]) * inv_det;
        result[2][2] = (m[0][0] * m[1][1] - m[1][0] * m[0][1]) * inv_det;
        return result;
    }

    /// Symmetric part of the matrix, `(M + M^T) / 2`
    pub fn symmetrized(&self) -> Matrix3 {
        (self + self.transposed()) * 0.5
    }
}

impl From<[[f64; 3]; 3]> for Matrix3 {
    fn from(data: [[f64; 3]; 3]) -> Matrix3 {
        Matrix3(data)
    }
}

impl From<Matrix3> for [[f64; 3]; 3] {
    fn from(matrix: Matrix3) -> [[f64; 3]; 3] {
        matrix.0
    }
}

impl Index<usize> for Matrix3 {
    type Output = [f64; 3];
    #[inline]
    fn index(&self, index: usize) -> &[f64; 3] {
        &self.0[index]
    }
}

impl IndexMut<usize> for Matrix3 {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut [f64; 3] {
        &mut self.0[index]
    }
}

impl_arithmetic!(
    Matrix3, Matrix3, Add, add, Matrix3, self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                result[i][j] = self[i][j] + other[i][j];
            }
        }
        result
    }
);

impl_arithmetic!(
    Matrix3, Matrix3, Sub, sub, Matrix3, self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                result[i][j] = self[i][j] - other[i][j];
            }
        }
        result
    }
);

impl_arithmetic!(
    Matrix3, Matrix3, Mul, mul, Matrix3, self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                for k in 0..3 {
                    result[i][j] += self[i][k] * other[k][j];
                }
            }
        }
        result
    }
);

impl_arithmetic!(
    Matrix3, Vector3D, Mul, mul, Vector3D, self, vector,
    Vector3D::new(
        self[0][0] * vector[0] + self[0][1] * vector[1] + self[0][2] * vector[2],
        self[1][0] * vector[0] + self[1][1] * vector[1] + self[1][2] * vector[2],
        self[2][0] * vector[0] + self[2][1] * vector[1] + self[2][2] * vector[2],
    )
);

lhs_scalar_arithmetic!(
    Matrix3, Mul, mul, Matrix3, self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                result[i][j] = self[i][j] * other;
            }
        }
        result
    }
);

impl_inplace_arithmetic!(
    Matrix3, Matrix3, AddAssign, add_assign, self, other,
    {
        for i in 0..3 {
            for j in 0..3 {
                self[i][j] += other[i][j];
            }
        }
    }
);

impl_inplace_arithmetic!(
    Matrix3, Matrix3, SubAssign, sub_assign, self, other,
    {
        for i in 0..3 {
            for j in 0..3 {
                self[i][j] -= other[i][j];
            }
        }
    }
);

impl MulAssign<f64> for Matrix3 {
    fn mul_assign(&mut self, other: f64) {
        for i in 0..3 {
            for j in 0..3 {
                self[i][j] *= other;
            }
        }
    }
}

impl approx::AbsDiffEq for Matrix3 {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Matrix3, epsilon: f64) -> bool {
        (0..3).all(|i| (0..3).all(|j| f64::abs_diff_eq(&self[i][j], &other[i][j], epsilon)))
    }
}

impl approx::RelativeEq for Matrix3 {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Matrix3, epsilon: f64, max_relative: f64) -> bool {
        (0..3).all(|i| (0..3).all(|j| {
            f64::relative_eq(&self[i][j], &other[i][j], epsilon, max_relative)
        }))
    }
}

impl approx::UlpsEq for Matrix3 {
    fn default_max_ulps() -> u32 {
        f64::default_max_ulps()
    }

    fn ulps_eq(&self, other: &Matrix3, epsilon: f64, max_ulps: u32) -> bool {
        (0..3).all(|i| (0..3).all(|j| {
            f64::ulps_eq(&self[i][j], &other[i][j], epsilon, max_ulps)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn determinant() {
        let a = Matrix3::new([[1.0, 2.0, 3.0], [0.0, 1.0, 4.0], [5.0, 6.0, 0.0]]);
        assert_eq!(a.determinant(), 1.0);
        assert_eq!(Matrix3::one().determinant(), 1.0);
        assert_eq!(Matrix3::zero().determinant(), 0.0);
    }

    #[test]
    fn inverse() {
        let a = Matrix3::new([[1.0, 2.0, 3.0], [0.0, 1.0, 4.0], [5.0, 6.0, 0.0]]);
        let expected = Matrix3::new([[-24.0, 18.0, 5.0], [20.0, -15.0, -4.0], [-5.0, 4.0, 1.0]]);
        assert_relative_eq!(a.inverse(), expected, epsilon = 1e-12);
        assert_relative_eq!(a * a.inverse(), Matrix3::one(), epsilon = 1e-12);
    }

    #[test]
    fn transpose_and_products() {
        let a = Matrix3::new([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let t = a.transposed();
        assert_eq!(t[0], [1.0, 4.0, 7.0]);
        assert_eq!(t[2], [3.0, 6.0, 9.0]);
        assert_eq!(a.trace(), 15.0);

        let v = Vector3D::new(1.0, 0.0, -1.0);
        assert_eq!(a * v, Vector3D::new(-2.0, -2.0, -2.0));

        let sym = a.symmetrized();
        assert_eq!(sym, sym.transposed());
        assert_eq!(sym[0][1], 3.0);
    }
}
