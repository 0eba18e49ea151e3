use std::ops::Range;

use crate::{Error, System, Vector3D};
use crate::systems::Pair;
use crate::potentials::PotentialFunctions;

use super::arena::Arena;

/// Pairs of atoms closer than this distance (in Å) are numerically
/// degenerate and can not form a bond
pub const MIN_BOND_LENGTH: f64 = 1e-6;

/// A directed bond from `first` to `second`, with all the geometric data and
/// cutoff values needed by the other stages of the kernel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bond {
    /// index of the atom owning this bond
    pub first: usize,
    /// index of the neighbor atom
    pub second: usize,
    /// element index of the first atom
    pub first_element: usize,
    /// element index of the second atom
    pub second_element: usize,
    /// periodic cell shift applied to the second atom
    pub cell_shift: [i32; 3],
    /// vector from the first to the second atom
    pub vector: Vector3D,
    /// length of the bond
    pub distance: f64,
    /// unit vector along the bond
    pub direction: Vector3D,
    /// value of the pair energy cutoff function
    pub cutoff: f64,
    /// derivative of the pair energy cutoff function
    pub cutoff_gradient: f64,
    /// value of the bond order cutoff function
    pub bond_order_cutoff: f64,
    /// derivative of the bond order cutoff function
    pub bond_order_cutoff_gradient: f64,
    /// index of the reverse bond, going from `second` to `first`
    pub reverse: usize,
}

/// A candidate neighbor of a given atom, seen from this atom
#[derive(Debug, Clone, Copy)]
pub(crate) struct Neighbor {
    pub atom: usize,
    pub cell_shift: [i32; 3],
    pub vector: Vector3D,
    pub distance: f64,
}

fn negate(shift: [i32; 3]) -> [i32; 3] {
    [-shift[0], -shift[1], -shift[2]]
}

/// Iterate over all candidate neighbors of `atom`, given the pairs containing
/// this atom. Pairs between an atom and its own periodic image give two
/// neighbors, one for each direction.
pub(crate) fn neighbors_of(atom: usize, pairs: &[Pair]) -> impl Iterator<Item = Neighbor> + '_ {
    pairs.iter().flat_map(move |pair| {
        let forward = Neighbor {
            atom: pair.second,
            cell_shift: pair.cell_shift_indices,
            vector: pair.vector,
            distance: pair.distance,
        };

        let backward = Neighbor {
            atom: pair.first,
            cell_shift: negate(pair.cell_shift_indices),
            vector: -pair.vector,
            distance: pair.distance,
        };

        let (first, second) = if pair.first == pair.second {
            (forward, Some(backward))
        } else if pair.first == atom {
            (forward, None)
        } else {
            (backward, None)
        };

        std::iter::once(first).chain(second)
    })
}

/// Dense list of directed bonds, ordered by owning atom.
///
/// Every bond `i -> j` is stored together with its reverse `j -> i`. The
/// storage persists across calculations, and only grows.
#[derive(Debug, Clone)]
pub struct BondList {
    bonds: Arena<Bond>,
    /// bonds owned by atom `i` are `bonds[offsets[i]..offsets[i + 1]]`
    offsets: Vec<usize>,
}

impl BondList {
    pub(crate) fn new() -> BondList {
        BondList {
            bonds: Arena::new("bonds"),
            offsets: vec![0],
        }
    }

    /// Get all the bonds in this list
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Get the number of bonds in this list
    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    /// Check if this list contains no bonds
    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    /// Current capacity of the bond storage
    pub fn capacity(&self) -> usize {
        self.bonds.capacity()
    }

    /// Get the number of atoms in the system used to build this list
    pub fn atoms_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Get the range of indexes of the bonds owned by `atom`
    pub fn atom_bonds(&self, atom: usize) -> Range<usize> {
        self.offsets[atom]..self.offsets[atom + 1]
    }

    pub(crate) fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub(crate) fn start(&mut self, initial: usize, maximum: usize, max_growth_steps: usize) {
        self.bonds.start(initial, maximum, max_growth_steps);
    }

    /// Build the list of bonds from the candidate pairs of the system. Atoms
    /// for which `excluded` is `true` do not form any bond.
    ///
    /// Returns the number of pairs that were ignored because the two atoms
    /// are closer than [`MIN_BOND_LENGTH`].
    #[time_graph::instrument(name = "BondList::build")]
    pub(crate) fn build(
        &mut self,
        functions: &dyn PotentialFunctions,
        system: &dyn System,
        elements: &[usize],
        excluded: Option<&[bool]>,
    ) -> Result<usize, Error> {
        let is_excluded = |atom: usize| excluded.map_or(false, |mask| mask[atom]);

        let degenerate = 'restart: loop {
            self.bonds.clear();
            self.offsets.clear();
            self.offsets.push(0);

            let mut degenerate = 0;
            for center in 0..elements.len() {
                if is_excluded(center) {
                    self.offsets.push(self.bonds.len());
                    continue;
                }

                for neighbor in neighbors_of(center, system.pairs_containing(center)?) {
                    if is_excluded(neighbor.atom) {
                        continue;
                    }

                    let first_element = elements[center];
                    let second_element = elements[neighbor.atom];
                    if neighbor.distance >= functions.max_cutoff(first_element, second_element) {
                        continue;
                    }

                    if neighbor.distance < MIN_BOND_LENGTH {
                        degenerate += 1;
                        continue;
                    }

                    let (cutoff, cutoff_gradient) = functions.cutoff(first_element, second_element, neighbor.distance);
                    let (bond_order_cutoff, bond_order_cutoff_gradient) = functions.bond_order_cutoff(
                        first_element, second_element, neighbor.distance
                    );

                    let bond = Bond {
                        first: center,
                        second: neighbor.atom,
                        first_element: first_element,
                        second_element: second_element,
                        cell_shift: neighbor.cell_shift,
                        vector: neighbor.vector,
                        distance: neighbor.distance,
                        direction: neighbor.vector / neighbor.distance,
                        cutoff: cutoff,
                        cutoff_gradient: cutoff_gradient,
                        bond_order_cutoff: bond_order_cutoff,
                        bond_order_cutoff_gradient: bond_order_cutoff_gradient,
                        reverse: usize::MAX,
                    };

                    if self.bonds.push(bond).is_err() {
                        let required = self.bonds.len() + 1;
                        self.bonds.grow(required)?;
                        continue 'restart;
                    }
                }
                self.offsets.push(self.bonds.len());
            }

            break degenerate;
        };

        self.link_reverse_bonds()?;

        log::debug!("built {} bonds for {} atoms", self.bonds.len(), elements.len());
        return Ok(degenerate);
    }

    /// Find the reverse of every bond
    fn link_reverse_bonds(&mut self) -> Result<(), Error> {
        for index in 0..self.bonds.len() {
            let bond = self.bonds[index];
            let shift = negate(bond.cell_shift);

            let reverse = self.atom_bonds(bond.second).find(|&other| {
                let other = &self.bonds[other];
                other.second == bond.first && other.cell_shift == shift
            });

            match reverse {
                Some(reverse) => self.bonds[index].reverse = reverse,
                None => {
                    return Err(Error::InvalidParameter(format!(
                        "the neighbor list is not symmetric: missing bond from atom {} to atom {} (cell shift {:?})",
                        bond.second, bond.first, shift
                    )));
                }
            }
        }
        return Ok(());
    }
}
