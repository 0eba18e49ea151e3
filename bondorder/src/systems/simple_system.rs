use crate::Error;

use super::{UnitCell, System, Vector3D, Pair};

use super::neighbors::NeighborsList;

/// A simple implementation of `System` to use when no other is available
#[derive(Clone, Debug)]
pub struct SimpleSystem {
    cell: UnitCell,
    types: Vec<i32>,
    positions: Vec<Vector3D>,
    neighbors: Option<NeighborsList>,
}

impl SimpleSystem {
    /// Create a new empty system with the given unit cell
    pub fn new(cell: UnitCell) -> SimpleSystem {
        SimpleSystem {
            cell: cell,
            types: Vec::new(),
            positions: Vec::new(),
            neighbors: None,
        }
    }

    /// Add an atom with the given atomic type and position to this system
    pub fn add_atom(&mut self, atomic_type: i32, position: Vector3D) {
        // adding atoms invalidates the neighbor list
        self.neighbors = None;
        self.types.push(atomic_type);
        self.positions.push(position);
    }

    /// Get mutable access to the positions of the atoms
    pub fn positions_mut(&mut self) -> &mut [Vector3D] {
        // any position access invalidates the neighbor list
        self.neighbors = None;
        return &mut self.positions;
    }

    /// Change the unit cell of this system, keeping the atoms where they are
    pub fn set_cell(&mut self, cell: UnitCell) {
        self.neighbors = None;
        self.cell = cell;
    }

    /// Apply the homogeneous deformation `1 + strain` to both the unit cell
    /// and the atomic positions
    pub fn deform(&mut self, strain: &crate::Matrix3) {
        let deformation = crate::Matrix3::one() + strain;
        for position in self.positions_mut() {
            *position = deformation * *position;
        }
        self.cell = self.cell.deformed(strain);
    }

    /// Build a `nx * ny * nz` periodic supercell of this system. Atoms of
    /// the image `(a, b, c)` come after all atoms of the images before it, in
    /// the same order as in the original system.
    pub fn supercell(&self, repetitions: [usize; 3]) -> Result<SimpleSystem, Error> {
        if self.cell.is_infinite() {
            return Err(Error::InvalidParameter(
                "can not create a supercell of a system without periodic cell".into()
            ));
        }

        let mut matrix = self.cell.matrix();
        for (row, &n) in repetitions.iter().enumerate() {
            if n == 0 {
                return Err(Error::InvalidParameter(
                    "supercell repetitions must be positive".into()
                ));
            }
            for value in &mut matrix[row] {
                *value *= n as f64;
            }
        }

        let mut supercell = SimpleSystem::new(UnitCell::from(matrix));
        for a in 0..repetitions[0] {
            for b in 0..repetitions[1] {
                for c in 0..repetitions[2] {
                    let shift = self.cell.shift_vector([a as i32, b as i32, c as i32]);
                    for (&atomic_type, &position) in self.types.iter().zip(&self.positions) {
                        supercell.add_atom(atomic_type, position + shift);
                    }
                }
            }
        }

        return Ok(supercell);
    }
}

impl System for SimpleSystem {
    fn size(&self) -> Result<usize, Error> {
        Ok(self.types.len())
    }

    fn positions(&self) -> Result<&[Vector3D], Error> {
        Ok(&self.positions)
    }

    fn types(&self) -> Result<&[i32], Error> {
        Ok(&self.types)
    }

    fn cell(&self) -> Result<UnitCell, Error> {
        Ok(self.cell)
    }

    #[allow(clippy::float_cmp)]
    fn compute_neighbors(&mut self, cutoff: f64) -> Result<(), Error> {
        if !(cutoff > 0.0 && cutoff.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "neighbor list cutoff must be positive and finite, got {}", cutoff
            )));
        }

        // re-use already computed NL is possible
        if let Some(ref nl) = self.neighbors {
            if nl.cutoff == cutoff {
                return Ok(());
            }
        }

        self.neighbors = Some(NeighborsList::new(&self.positions, self.cell, cutoff));
        Ok(())
    }

    fn pairs(&self) -> Result<&[Pair], Error> {
        let neighbors = self.neighbors.as_ref().ok_or_else(|| Error::Internal(
            "neighbor list is not initialized".into()
        ))?;
        Ok(&neighbors.pairs)
    }

    fn pairs_containing(&self, atom: usize) -> Result<&[Pair], Error> {
        let neighbors = self.neighbors.as_ref().ok_or_else(|| Error::Internal(
            "neighbor list is not initialized".into()
        ))?;
        Ok(&neighbors.pairs_by_atom[atom])
    }
}
