use log::warn;
use ndarray::Array3;

use crate::Vector3D;
use super::{UnitCell, Pair};

/// Maximal number of bins in the cell list, to keep memory use bounded for
/// small cutoffs in large boxes
const MAX_NUMBER_OF_BINS: f64 = 1e5;

/// Atoms closer than this distance (in Å) produce a warning
const CLOSE_ATOMS_WARNING: f64 = 0.5;

/// Atom stored in one of the bins of the `CellList`
#[derive(Debug, Clone, Copy)]
struct BinnedAtom {
    /// index of the atom in the system
    index: usize,
    /// how many cell vectors were added to the atom position to bring it
    /// inside the unit cell
    shift: [i32; 3],
}

/// Candidate pair produced by the cell list. The vector between the atoms is
/// `position[second] - position[first] + cell.shift_vector(shift)`.
#[derive(Debug, Clone, Copy)]
struct CandidatePair {
    first: usize,
    second: usize,
    shift: [i32; 3],
}

/// Bins atoms in a regular grid of sub-cells, and generates candidate pairs
/// from atoms in neighboring bins.
#[derive(Debug, Clone)]
struct CellList {
    /// how many bins to look at in each direction to find all neighbors
    /// below the cutoff
    n_search: [i32; 3],
    bins: Array3<Vec<BinnedAtom>>,
    cell: UnitCell,
    /// for infinite cells, the lower corner and size of the bounding box
    bounding_box: Option<(Vector3D, Vector3D)>,
}

impl CellList {
    fn new(positions: &[Vector3D], cell: UnitCell, cutoff: f64) -> CellList {
        let (box_size, bounding_box) = if cell.is_infinite() {
            let mut lower = Vector3D::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
            let mut upper = -lower;
            for position in positions {
                for xyz in 0..3 {
                    lower[xyz] = f64::min(lower[xyz], position[xyz]);
                    upper[xyz] = f64::max(upper[xyz], position[xyz]);
                }
            }
            if positions.is_empty() {
                lower = Vector3D::zero();
                upper = Vector3D::zero();
            }
            // make sure the atoms on the upper boundary are inside the box
            let size = upper - lower + Vector3D::new(1e-6, 1e-6, 1e-6);
            (size, Some((lower, size)))
        } else {
            (cell.distances_between_faces(), None)
        };

        let mut n_bins = [0.0; 3];
        for xyz in 0..3 {
            n_bins[xyz] = f64::clamp(f64::trunc(box_size[xyz] / cutoff), 1.0, f64::INFINITY);
        }

        let n_bins_total = n_bins[0] * n_bins[1] * n_bins[2];
        if n_bins_total > MAX_NUMBER_OF_BINS {
            let scaling = f64::cbrt(MAX_NUMBER_OF_BINS / n_bins_total);
            for n in &mut n_bins {
                *n = f64::max(f64::trunc(*n * scaling), 1.0);
            }
        }

        let mut n_search = [0; 3];
        for xyz in 0..3 {
            n_search[xyz] = f64::ceil(cutoff * n_bins[xyz] / box_size[xyz]) as i32;
            if n_search[xyz] < 1 {
                n_search[xyz] = 1;
            }

            // without periodic images, bins past the last one are always
            // empty. This also handles flat systems, where `box_size` is
            // only the 1e-6 padding along some axis
            if cell.is_infinite() {
                n_search[xyz] = i32::min(n_search[xyz], n_bins[xyz] as i32 - 1);
            }
        }

        let shape = [n_bins[0] as usize, n_bins[1] as usize, n_bins[2] as usize];
        let mut cell_list = CellList {
            n_search: n_search,
            bins: Array3::from_elem(shape, Vec::new()),
            cell: cell,
            bounding_box: bounding_box,
        };

        for (index, &position) in positions.iter().enumerate() {
            cell_list.add_atom(index, position);
        }

        return cell_list;
    }

    fn add_atom(&mut self, index: usize, position: Vector3D) {
        let fractional = if let Some((lower, size)) = self.bounding_box {
            let delta = position - lower;
            Vector3D::new(delta[0] / size[0], delta[1] / size[1], delta[2] / size[2])
        } else {
            self.cell.fractional(position)
        };

        let shape = self.bins.shape();
        let shape = [shape[0], shape[1], shape[2]];

        let bin = [
            f64::floor(fractional[0] * shape[0] as f64) as i32,
            f64::floor(fractional[1] * shape[1] as f64) as i32,
            f64::floor(fractional[2] * shape[2] as f64) as i32,
        ];

        let (shift, bin) = if self.cell.is_infinite() {
            let bin = [
                i32::clamp(bin[0], 0, shape[0] as i32 - 1) as usize,
                i32::clamp(bin[1], 0, shape[1] as i32 - 1) as usize,
                i32::clamp(bin[2], 0, shape[2] as i32 - 1) as usize,
            ];
            ([0, 0, 0], bin)
        } else {
            let (quotient, bin) = divmod_vec(bin, shape);
            // the atom is moved inside the cell by removing `quotient` cell
            // vectors from its position
            ([-quotient[0], -quotient[1], -quotient[2]], bin)
        };

        self.bins[bin].push(BinnedAtom {
            index: index,
            shift: shift,
        });
    }

    /// Get all candidate pairs as a half list (`first <= second`). Pairs
    /// between an atom and its own periodic images are included once.
    fn candidates(&self) -> Vec<CandidatePair> {
        let mut candidates = Vec::new();

        let shape = self.bins.shape();
        let shape = [shape[0], shape[1], shape[2]];

        for ((bin_x, bin_y, bin_z), atoms) in self.bins.indexed_iter() {
            for delta_x in -self.n_search[0]..=self.n_search[0] {
                for delta_y in -self.n_search[1]..=self.n_search[1] {
                    for delta_z in -self.n_search[2]..=self.n_search[2] {
                        let neighbor = [
                            bin_x as i32 + delta_x,
                            bin_y as i32 + delta_y,
                            bin_z as i32 + delta_z,
                        ];

                        let (bin_shift, neighbor) = divmod_vec(neighbor, shape);
                        if self.cell.is_infinite() && bin_shift != [0, 0, 0] {
                            continue;
                        }

                        for atom_i in atoms {
                            for atom_j in &self.bins[neighbor] {
                                if atom_i.index > atom_j.index {
                                    continue;
                                }

                                let shift = [
                                    bin_shift[0] + atom_j.shift[0] - atom_i.shift[0],
                                    bin_shift[1] + atom_j.shift[1] - atom_i.shift[1],
                                    bin_shift[2] + atom_j.shift[2] - atom_i.shift[2],
                                ];

                                if atom_i.index == atom_j.index && !is_positive_half_space(shift) {
                                    continue;
                                }

                                candidates.push(CandidatePair {
                                    first: atom_i.index,
                                    second: atom_j.index,
                                    shift: shift,
                                });
                            }
                        }
                    }
                }
            }
        }

        return candidates;
    }
}

/// Pairs between an atom and its own image appear twice with opposite
/// shifts (and once with a zero shift). Only keep the shifts that are
/// strictly in the positive half space, ordering by `z`, then `y`, then `x`.
fn is_positive_half_space(shift: [i32; 3]) -> bool {
    if shift[2] != 0 {
        return shift[2] > 0;
    }
    if shift[1] != 0 {
        return shift[1] > 0;
    }
    return shift[0] > 0;
}

/// Quotient and remainder of `a / b`, with the remainder always positive
fn divmod(a: i32, b: usize) -> (i32, usize) {
    debug_assert!(b < (i32::MAX as usize));
    let b = b as i32;
    let quotient = a.div_euclid(b);
    let remainder = a.rem_euclid(b);
    return (quotient, remainder as usize);
}

fn divmod_vec(a: [i32; 3], b: [usize; 3]) -> ([i32; 3], [usize; 3]) {
    let (qx, rx) = divmod(a[0], b[0]);
    let (qy, ry) = divmod(a[1], b[1]);
    let (qz, rz) = divmod(a[2], b[2]);
    return ([qx, qy, qz], [rx, ry, rz]);
}

/// Cell-list based neighbor list, usable with any system
#[derive(Clone, Debug)]
pub struct NeighborsList {
    /// the cutoff used to create this neighbor list
    pub cutoff: f64,
    /// all pairs in the system, each pair is included once
    pub pairs: Vec<Pair>,
    /// all pairs containing a given atom. A pair between an atom and one of
    /// its periodic images is included once in the list of this atom.
    pub pairs_by_atom: Vec<Vec<Pair>>,
}

impl NeighborsList {
    #[time_graph::instrument(name = "NeighborsList")]
    pub fn new(positions: &[Vector3D], cell: UnitCell, cutoff: f64) -> NeighborsList {
        let cell_list = CellList::new(positions, cell, cutoff);
        let cutoff2 = cutoff * cutoff;

        let mut pairs = Vec::new();
        let mut pairs_by_atom = vec![Vec::new(); positions.len()];

        for candidate in cell_list.candidates() {
            let vector = positions[candidate.second] - positions[candidate.first] + cell.shift_vector(candidate.shift);

            let distance2 = vector.norm2();
            if distance2 >= cutoff2 {
                continue;
            }

            if distance2 < CLOSE_ATOMS_WARNING * CLOSE_ATOMS_WARNING {
                warn!(
                    "atoms {} and {} are very close to one another ({} A)",
                    candidate.first, candidate.second, distance2.sqrt()
                );
            }

            let pair = Pair {
                first: candidate.first,
                second: candidate.second,
                distance: distance2.sqrt(),
                vector: vector,
                cell_shift_indices: candidate.shift,
            };

            pairs.push(pair);
            pairs_by_atom[pair.first].push(pair);
            if pair.first != pair.second {
                pairs_by_atom[pair.second].push(pair);
            }
        }

        // sort the pairs to get a reproducible order independent of the
        // binning
        let key = |pair: &Pair| (pair.first, pair.second, pair.cell_shift_indices);
        pairs.sort_unstable_by_key(key);
        for pairs in &mut pairs_by_atom {
            pairs.sort_unstable_by_key(key);
        }

        return NeighborsList {
            cutoff: cutoff,
            pairs: pairs,
            pairs_by_atom: pairs_by_atom,
        };
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_ulps_eq;

    use crate::Matrix3;
    use super::*;

    #[test]
    fn non_periodic() {
        let positions = [
            Vector3D::new(0.134, 1.282, 1.701),
            Vector3D::new(-0.273, 1.026, -1.471),
            Vector3D::new(1.922, -0.124, 1.900),
            Vector3D::new(1.400, -0.464, 0.480),
            Vector3D::new(0.149, 1.865, 0.635),
        ];

        let neighbors = NeighborsList::new(&positions, UnitCell::infinite(), 3.42);

        let reference = [
            (0, 1, 3.2082345612501593),
            (0, 2, 2.283282943482914),
            (0, 3, 2.4783286706972505),
            (0, 4, 1.215100818862369),
            (1, 3, 2.9707625283755013),
            (1, 4, 2.3059143522689647),
            (2, 3, 1.550639867925496),
            (2, 4, 2.9495550511899244),
            (3, 4, 2.6482573515427084),
        ];

        assert_eq!(neighbors.pairs.len(), reference.len());
        for (pair, reference) in neighbors.pairs.iter().zip(&reference) {
            assert_eq!(pair.first, reference.0);
            assert_eq!(pair.second, reference.1);
            assert_ulps_eq!(pair.distance, reference.2);
            assert_eq!(pair.cell_shift_indices, [0, 0, 0]);
        }

        assert_eq!(neighbors.pairs_by_atom[0].len(), 4);
        assert_eq!(neighbors.pairs_by_atom[2].len(), 3);
    }

    #[test]
    fn spread_out_cluster() {
        // atoms far apart in a non periodic system use more than one bin
        let positions = [
            Vector3D::new(0.0, 0.0, 0.0),
            Vector3D::new(1.5, 0.0, 0.0),
            Vector3D::new(20.0, 0.0, 0.0),
            Vector3D::new(21.0, 0.0, 0.0),
            Vector3D::new(20.0, 14.0, 9.0),
        ];
        let neighbors = NeighborsList::new(&positions, UnitCell::infinite(), 2.0);

        assert_eq!(neighbors.pairs.len(), 2);
        assert_eq!((neighbors.pairs[0].first, neighbors.pairs[0].second), (0, 1));
        assert_eq!((neighbors.pairs[1].first, neighbors.pairs[1].second), (2, 3));
        assert!(neighbors.pairs_by_atom[4].is_empty());
    }

    #[test]
    fn linear_and_flat_systems() {
        // dimer along z, all atoms share the same x and y
        let positions = [Vector3D::new(0.0, 0.0, 0.0), Vector3D::new(0.0, 0.0, 2.35)];
        let cell_list = CellList::new(&positions, UnitCell::infinite(), 3.0);
        assert_eq!(cell_list.n_search, [0, 0, 0]);

        let neighbors = NeighborsList::new(&positions, UnitCell::infinite(), 3.0);
        assert_eq!(neighbors.pairs.len(), 1);
        assert_ulps_eq!(neighbors.pairs[0].distance, 2.35);

        // atoms in the z = 0 plane, spread over more than one bin along x
        let positions = [
            Vector3D::new(0.0, 0.0, 0.0),
            Vector3D::new(2.0, 0.0, 0.0),
            Vector3D::new(4.0, 0.0, 0.0),
            Vector3D::new(6.0, 1.0, 0.0),
            Vector3D::new(8.0, 1.0, 0.0),
        ];
        let cell_list = CellList::new(&positions, UnitCell::infinite(), 2.1);
        assert_eq!(cell_list.bins.shape(), [3, 1, 1]);
        assert_eq!(cell_list.n_search, [1, 0, 0]);

        let neighbors = NeighborsList::new(&positions, UnitCell::infinite(), 2.1);
        let pairs = neighbors.pairs.iter()
            .map(|pair| (pair.first, pair.second))
            .collect::<Vec<_>>();
        assert_eq!(pairs, [(0, 1), (1, 2), (3, 4)]);
    }

    #[test]
    fn empty_system() {
        let cell_list = CellList::new(&[], UnitCell::infinite(), 3.0);
        assert_eq!(cell_list.n_search, [0, 0, 0]);

        let neighbors = NeighborsList::new(&[], UnitCell::infinite(), 3.0);
        assert!(neighbors.pairs.is_empty());
        assert!(neighbors.pairs_by_atom.is_empty());
    }

    #[test]
    fn fcc_cell() {
        let cell = UnitCell::from(Matrix3::new([
            [0.0, 1.5, 1.5],
            [1.5, 0.0, 1.5],
            [1.5, 1.5, 0.0],
        ]));
        let positions = [Vector3D::new(0.0, 0.0, 0.0)];
        let neighbors = NeighborsList::new(&positions, cell, 3.0);

        // 12 nearest neighbors, each self-image pair is included once
        assert_eq!(neighbors.pairs.len(), 6);
        assert_eq!(neighbors.pairs_by_atom[0].len(), 6);
        for pair in &neighbors.pairs {
            assert_eq!(pair.first, 0);
            assert_eq!(pair.second, 0);
            assert_ulps_eq!(pair.distance, 2.1213203435596424);
            assert!(is_positive_half_space(pair.cell_shift_indices));
        }
    }

    #[test]
    fn small_cell_large_cutoff() {
        let cell = UnitCell::cubic(0.5);
        let positions = [Vector3D::new(0.0, 0.0, 0.0)];
        let neighbors = NeighborsList::new(&positions, cell, 0.6);

        let expected = [
            (Vector3D::new(0.5, 0.0, 0.0), [1, 0, 0]),
            (Vector3D::new(0.0, 0.5, 0.0), [0, 1, 0]),
            (Vector3D::new(0.0, 0.0, 0.5), [0, 0, 1]),
        ];

        assert_eq!(neighbors.pairs.len(), 3);
        let mut pairs = neighbors.pairs.clone();
        pairs.sort_by_key(|pair| [pair.cell_shift_indices[2], pair.cell_shift_indices[1], pair.cell_shift_indices[0]]);
        for (pair, (vector, shifts)) in pairs.iter().zip(&expected) {
            assert_ulps_eq!(pair.distance, 0.5);
            assert_ulps_eq!(pair.vector, vector);
            assert_eq!(&pair.cell_shift_indices, shifts);
        }
    }

    #[test]
    fn atoms_outside_of_the_cell() {
        let cell = UnitCell::cubic(54.0);
        let positions = [
            Vector3D::new(0.0, 0.0, 0.0),
            Vector3D::new(0.0, 2.0, 0.0),
            Vector3D::new(0.0, 0.0, 2.0),
            Vector3D::new(-6.0, 0.0, 0.0),
            Vector3D::new(-6.0, -2.0, 0.0),
            Vector3D::new(-6.0, 0.0, -2.0),
            // across the periodic boundary from atom 0
            Vector3D::new(53.0, 0.0, 0.0),
        ];

        let neighbors = NeighborsList::new(&positions, cell, 2.1);

        let expected = [
            (0, 1, [0, 0, 0]),
            (0, 2, [0, 0, 0]),
            (0, 6, [-1, 0, 0]),
            (3, 4, [0, 0, 0]),
            (3, 5, [0, 0, 0]),
        ];

        assert_eq!(neighbors.pairs.len(), expected.len());
        for (pair, expected) in neighbors.pairs.iter().zip(&expected) {
            assert_eq!(pair.first, expected.0);
            assert_eq!(pair.second, expected.1);
            assert_eq!(pair.cell_shift_indices, expected.2);
        }
        assert_ulps_eq!(neighbors.pairs[2].distance, 1.0);
    }

    #[test]
    fn triclinic_cell() {
        let cell = UnitCell::from(Matrix3::new([
            [4.26, -2.45951215, 0.0],
            [2.13, 1.22975607, 0.0],
            [0.0, 0.0, 50.0],
        ]));
        let positions = [
            Vector3D::new(1.42, 0.0, 0.0),
            Vector3D::new(2.84, 0.0, 0.0),
            Vector3D::new(3.55, -1.22975607, 0.0),
            Vector3D::new(4.97, -1.22975607, 0.0),
        ];
        let neighbors = NeighborsList::new(&positions, cell, 6.4);
        assert_eq!(neighbors.pairs.len(), 90);

        for missing in [(0, 3, [-2, 0, 0]), (0, 3, [-2, 1, 0]), (0, 3, [-2, 2, 0])] {
            let found = neighbors.pairs.iter().any(|pair| {
                pair.first == missing.0 && pair.second == missing.1 && pair.cell_shift_indices == missing.2
            });
            assert!(found, "could not find pair {:?}", missing);
        }
    }
}
