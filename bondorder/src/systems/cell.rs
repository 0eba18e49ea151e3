//! The `UnitCell` type represents the periodic box around a system of atoms.
use crate::{Matrix3, Vector3D};

/// The shape of a cell determines how periodic boundary conditions are
/// applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellShape {
    /// Infinite unit cell, with no periodicity
    Infinite,
    /// Orthorhombic unit cell, with cuboid shape
    Orthorhombic,
    /// Triclinic unit cell, with arbitrary parallelepiped shape
    Triclinic,
}

/// A `UnitCell` defines the periodic boundaries of a system.
///
/// The cell vectors are the rows of the cell matrix, so a cell shift `[a, b,
/// c]` corresponds to the Cartesian displacement `a * H[0] + b * H[1] + c *
/// H[2]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    /// cell matrix, one cell vector per row
    matrix: Matrix3,
    /// inverse of the transposed cell matrix, used to get fractional
    /// coordinates
    inverse_transpose: Matrix3,
    shape: CellShape,
}

impl From<Matrix3> for UnitCell {
    fn from(matrix: Matrix3) -> UnitCell {
        assert!(matrix.determinant() > 1e-6, "cell matrix is not invertible or is left-handed");

        let is_diagonal = (0..3).all(|i| (0..3).all(|j| i == j || matrix[i][j].abs() < 1e-6));
        let shape = if is_diagonal {
            CellShape::Orthorhombic
        } else {
            CellShape::Triclinic
        };

        return UnitCell {
            matrix: matrix,
            inverse_transpose: matrix.transposed().inverse(),
            shape: shape,
        };
    }
}

impl UnitCell {
    /// Create an infinite unit cell, for systems without periodicity
    pub fn infinite() -> UnitCell {
        UnitCell {
            matrix: Matrix3::zero(),
            inverse_transpose: Matrix3::zero(),
            shape: CellShape::Infinite,
        }
    }

    /// Create an orthorhombic unit cell, with side lengths `a, b, c`.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> UnitCell {
        assert!(a > 0.0 && b > 0.0 && c > 0.0, "cell lengths must be positive");
        return UnitCell::from(Matrix3::new([
            [a, 0.0, 0.0],
            [0.0, b, 0.0],
            [0.0, 0.0, c],
        ]));
    }

    /// Create a cubic unit cell, with side lengths `length, length, length`.
    pub fn cubic(length: f64) -> UnitCell {
        UnitCell::orthorhombic(length, length, length)
    }

    /// Get the cell shape
    pub fn shape(&self) -> CellShape {
        self.shape
    }

    /// Check if this unit cell is infinite, *i.e.* if it does not have
    /// periodic boundary conditions.
    pub fn is_infinite(&self) -> bool {
        self.shape == CellShape::Infinite
    }

    /// Get the matrix representation of the unit cell, with one cell vector
    /// per row
    pub fn matrix(&self) -> Matrix3 {
        self.matrix
    }

    /// Get the volume of the cell, 0 for infinite cells
    pub fn volume(&self) -> f64 {
        if self.is_infinite() {
            return 0.0;
        }
        return self.matrix.determinant();
    }

    /// Get the distances between opposite faces of the unit cell
    pub fn distances_between_faces(&self) -> Vector3D {
        if self.is_infinite() {
            return Vector3D::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        }

        let a = Vector3D::from(self.matrix[0]);
        let b = Vector3D::from(self.matrix[1]);
        let c = Vector3D::from(self.matrix[2]);

        let volume = self.volume();
        return Vector3D::new(
            volume / (b ^ c).norm(),
            volume / (c ^ a).norm(),
            volume / (a ^ b).norm(),
        );
    }

    /// Get the fractional representation of the Cartesian `vector` in this
    /// cell
    pub fn fractional(&self, vector: Vector3D) -> Vector3D {
        return self.inverse_transpose * vector;
    }

    /// Get the Cartesian representation of the `fractional` vector in this
    /// cell
    pub fn cartesian(&self, fractional: Vector3D) -> Vector3D {
        return self.matrix.transposed() * fractional;
    }

    /// Get the Cartesian displacement corresponding to the given integer cell
    /// shift
    pub fn shift_vector(&self, shift: [i32; 3]) -> Vector3D {
        let fractional = Vector3D::new(shift[0] as f64, shift[1] as f64, shift[2] as f64);
        return self.cartesian(fractional);
    }

    /// Apply the homogeneous deformation `1 + strain` to this cell. Infinite
    /// cells are not changed.
    pub fn deformed(&self, strain: &Matrix3) -> UnitCell {
        if self.is_infinite() {
            return *self;
        }
        let deformation = Matrix3::one() + strain;
        // cell vectors are rows, so they transform as h' = h (1 + e)^T
        return UnitCell::from(self.matrix * deformation.transposed());
    }
}
