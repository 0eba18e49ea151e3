use std::ops::Range;

use rayon::prelude::*;

use crate::{Error, System, Vector3D};
use crate::systems::Pair;
use crate::potentials::ScreeningParameters;

use super::arena::Arena;
use super::bonds::{Bond, BondList, neighbors_of, MIN_BOND_LENGTH};

/// A third atom partially screening a bond
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreeningRecord {
    /// index of the screening atom `k`
    pub atom: usize,
    /// vector from the first atom of the bond to `k`
    pub r_ik: Vector3D,
    /// vector from the second atom of the bond to `k`
    pub r_jk: Vector3D,
    /// value of the screening metric
    pub metric: f64,
    /// screening factor of this atom, strictly between 0 and 1
    pub factor: f64,
    /// gradient of the factor with respect to the bond vector `r_ij`
    pub gradient_ij: Vector3D,
    /// gradient of the factor with respect to `r_ik`
    pub gradient_ik: Vector3D,
    /// gradient of the factor with respect to `r_jk`
    pub gradient_jk: Vector3D,
}

/// Screening of all the bonds of a single atom, before they are committed to
/// the screening list
#[derive(Debug, Default)]
struct AtomScreening {
    factors: Vec<f64>,
    counts: Vec<usize>,
    records: Vec<ScreeningRecord>,
}

/// Screening factors of all bonds, together with the third atoms
/// contributing to each of them.
///
/// Third atoms which do not screen a bond (factor of 1) are not stored. A
/// bond screened entirely by at least one atom has a factor of 0 and no
/// records, since all derivatives vanish there.
#[derive(Debug, Clone)]
pub struct ScreeningList {
    records: Arena<ScreeningRecord>,
    /// records for bond `b` are `records[offsets[b]..offsets[b + 1]]`
    offsets: Vec<usize>,
    /// total screening factor for each bond
    factors: Vec<f64>,
}

impl ScreeningList {
    pub(crate) fn new() -> ScreeningList {
        ScreeningList {
            records: Arena::new("screening"),
            offsets: vec![0],
            factors: Vec::new(),
        }
    }

    /// Get the total screening factor of all bonds
    pub fn factors(&self) -> &[f64] {
        &self.factors
    }

    /// Get the range of records for the given bond
    pub fn bond_records(&self, bond: usize) -> Range<usize> {
        self.offsets[bond]..self.offsets[bond + 1]
    }

    /// Get all the records in this list
    pub fn records(&self) -> &[ScreeningRecord] {
        &self.records
    }

    /// Current capacity of the record storage
    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    pub(crate) fn start(&mut self, initial: usize, maximum: usize, max_growth_steps: usize) {
        self.records.start(initial, maximum, max_growth_steps);
        self.offsets.clear();
        self.offsets.push(0);
        self.factors.clear();
    }

    /// Compute the screening of all bonds in `bonds` by third atoms from the
    /// candidate pairs of the system. Atoms for which `excluded` is `true` do
    /// not screen any bond.
    #[time_graph::instrument(name = "ScreeningList::resolve")]
    pub(crate) fn resolve(
        &mut self,
        parameters: &ScreeningParameters,
        bonds: &BondList,
        system: &dyn System,
        excluded: Option<&[bool]>,
    ) -> Result<(), Error> {
        let all_bonds = bonds.bonds();
        let screening = (0..bonds.atoms_count()).into_par_iter().map(|center| -> Result<AtomScreening, Error> {
            let range = bonds.atom_bonds(center);
            let mut screening = AtomScreening {
                factors: Vec::with_capacity(range.len()),
                counts: Vec::with_capacity(range.len()),
                records: Vec::new(),
            };

            if range.is_empty() {
                return Ok(screening);
            }

            let pairs = system.pairs_containing(center)?;
            for bond in &all_bonds[range] {
                let start = screening.records.len();
                let factor = screen_bond(parameters, bond, pairs, excluded, &mut screening.records);
                screening.factors.push(factor);
                screening.counts.push(screening.records.len() - start);
            }

            Ok(screening)
        }).collect::<Result<Vec<_>, Error>>()?;

        self.commit(screening)
    }

    /// Copy the screening of all atoms in the arena, growing it as needed
    fn commit(&mut self, screening: Vec<AtomScreening>) -> Result<(), Error> {
        let required = screening.iter().map(|atom| atom.records.len()).sum();
        self.records.clear();
        self.records.grow(required)?;

        self.offsets.clear();
        self.offsets.push(0);
        self.factors.clear();
        for atom in screening {
            let mut records = atom.records.into_iter();
            for (factor, count) in atom.factors.into_iter().zip(atom.counts) {
                self.factors.push(factor);
                for record in records.by_ref().take(count) {
                    if self.records.push(record).is_err() {
                        return Err(Error::Internal("screening arena is too small after growth".into()));
                    }
                }
                self.offsets.push(self.records.len());
            }
        }

        log::debug!("found {} screening records for {} bonds", self.records.len(), self.factors.len());
        return Ok(());
    }
}

/// Compute the screening of a single bond, pushing the partially screening
/// atoms in `records`. Returns the total screening factor of the bond.
fn screen_bond(
    parameters: &ScreeningParameters,
    bond: &Bond,
    pairs: &[Pair],
    excluded: Option<&[bool]>,
    records: &mut Vec<ScreeningRecord>,
) -> f64 {
    let start = records.len();
    let search_radius = parameters.search_radius(bond.distance);

    let mut factor = 1.0;
    for neighbor in neighbors_of(bond.first, pairs) {
        if neighbor.distance > search_radius {
            continue;
        }

        if neighbor.atom == bond.second && neighbor.cell_shift == bond.cell_shift {
            continue;
        }

        if excluded.map_or(false, |mask| mask[neighbor.atom]) {
            continue;
        }

        let r_jk = neighbor.vector - bond.vector;
        let distance_jk = r_jk.norm();
        if distance_jk < MIN_BOND_LENGTH || neighbor.distance < MIN_BOND_LENGTH {
            continue;
        }

        let metric = parameters.metric.compute(bond.distance, neighbor.distance, distance_jk);
        let (value, gradient) = parameters.factor(metric.value);
        if value >= 1.0 {
            continue;
        } else if value <= 0.0 {
            records.truncate(start);
            return 0.0;
        }

        factor *= value;
        records.push(ScreeningRecord {
            atom: neighbor.atom,
            r_ik: neighbor.vector,
            r_jk: r_jk,
            metric: metric.value,
            factor: value,
            gradient_ij: (gradient * metric.d_rij) * bond.direction,
            gradient_ik: (gradient * metric.d_rik / neighbor.distance) * neighbor.vector,
            gradient_jk: (gradient * metric.d_rjk / distance_jk) * r_jk,
        });
    }

    return factor;
}
