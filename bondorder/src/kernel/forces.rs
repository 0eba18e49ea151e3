use std::cell::RefCell;

use rayon::prelude::*;
use thread_local::ThreadLocal;

use crate::{Matrix3, Vector3D};
use crate::potentials::PotentialFunctions;

use super::bonds::BondList;
use super::bond_order::{BondOrder, Triplet, contributes_to_bond_order};
use super::screening::ScreeningList;
use super::split_by_offsets;

/// Energy owned by a directed bond, together with the derivative of the
/// total energy with respect to the screening factor of this bond
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BondEnergy {
    pub energy: f64,
    pub screening_gradient: f64,
}

/// Private accumulator for energy, forces and virial. Each worker thread
/// gets its own, and they are summed together at the end of the
/// calculation.
#[derive(Debug, Clone)]
pub(crate) struct Accumulator {
    pub energy: f64,
    pub forces: Vec<Vector3D>,
    pub virial: Matrix3,
    pub atom_energies: Option<Vec<f64>>,
    pub atom_virials: Option<Vec<Matrix3>>,
}

impl Accumulator {
    pub fn new(n_atoms: usize, per_atom: bool) -> Accumulator {
        Accumulator {
            energy: 0.0,
            forces: vec![Vector3D::zero(); n_atoms],
            virial: Matrix3::zero(),
            atom_energies: if per_atom { Some(vec![0.0; n_atoms]) } else { None },
            atom_virials: if per_atom { Some(vec![Matrix3::zero(); n_atoms]) } else { None },
        }
    }

    #[inline]
    fn add_energy(&mut self, atom: usize, energy: f64) {
        self.energy += energy;
        if let Some(ref mut atom_energies) = self.atom_energies {
            atom_energies[atom] += energy;
        }
    }

    /// Add the contribution of the derivative `gradient` of the energy with
    /// respect to `vector`, which goes from atom `first` to atom `second`.
    #[inline]
    fn deposit(&mut self, first: usize, second: usize, vector: Vector3D, gradient: Vector3D) {
        self.forces[first] += gradient;
        self.forces[second] -= gradient;

        let virial = gradient.tensor_product(vector);
        self.virial -= virial;
        if let Some(ref mut atom_virials) = self.atom_virials {
            let half = virial * 0.5;
            atom_virials[first] -= half;
            atom_virials[second] -= half;
        }
    }

    fn merge(&mut self, other: &Accumulator) {
        self.energy += other.energy;
        for (force, other) in self.forces.iter_mut().zip(&other.forces) {
            *force += *other;
        }
        self.virial += other.virial;

        if let (Some(energies), Some(other)) = (&mut self.atom_energies, &other.atom_energies) {
            for (energy, other) in energies.iter_mut().zip(other) {
                *energy += *other;
            }
        }

        if let (Some(virials), Some(other)) = (&mut self.atom_virials, &other.atom_virials) {
            for (virial, other) in virials.iter_mut().zip(other) {
                *virial += *other;
            }
        }
    }
}

/// Thread-local accumulators used during one calculation
pub(crate) struct Accumulators {
    n_atoms: usize,
    per_atom: bool,
    accumulators: ThreadLocal<RefCell<Accumulator>>,
}

impl Accumulators {
    pub fn new(n_atoms: usize, per_atom: bool) -> Accumulators {
        Accumulators {
            n_atoms: n_atoms,
            per_atom: per_atom,
            accumulators: ThreadLocal::new(),
        }
    }

    fn local(&self) -> std::cell::RefMut<'_, Accumulator> {
        self.accumulators.get_or(|| {
            RefCell::new(Accumulator::new(self.n_atoms, self.per_atom))
        }).borrow_mut()
    }

    /// Sum the accumulators of all threads together
    #[time_graph::instrument(name = "forces::reduce")]
    pub fn reduce(self) -> Accumulator {
        let mut total = Accumulator::new(self.n_atoms, self.per_atom);
        for accumulator in self.accumulators {
            total.merge(&accumulator.into_inner());
        }
        return total;
    }
}

/// Everything the force accumulation needs to know about the current
/// calculation
pub(crate) struct BondData<'a> {
    pub functions: &'a dyn PotentialFunctions,
    pub bonds: &'a BondList,
    pub bond_orders: &'a [BondOrder],
    pub screening: Option<&'a ScreeningList>,
    /// weight of the energy owned by each atom, 0 for masked atoms
    pub weights: &'a [f64],
}

/// First pass of the accumulation: pair energies and their derivatives,
/// including the derivatives going through the bond orders. This also
/// computes the derivative of the energy with respect to the screening
/// factor of each bond in `bond_energies`.
#[time_graph::instrument(name = "forces::accumulate_bonds")]
pub(crate) fn accumulate_bonds(
    data: &BondData<'_>,
    bond_energies: &mut Vec<BondEnergy>,
    accumulators: &Accumulators,
) {
    let BondData { functions, bonds, bond_orders, screening, weights } = *data;
    let all_bonds = bonds.bonds();
    let screening_factor = |bond: usize| screening.map_or(1.0, |screening| screening.factors()[bond]);

    bond_energies.clear();
    bond_energies.resize(all_bonds.len(), BondEnergy::default());

    split_by_offsets(bond_energies, bonds.offsets()).into_par_iter().enumerate().for_each(|(center, output)| {
        let range = bonds.atom_bonds(center);
        if range.is_empty() {
            return;
        }

        let mut accumulator = accumulators.local();
        let weight = weights[center];
        for (local_ij, bond_ij) in range.clone().enumerate() {
            let bond = &all_bonds[bond_ij];
            if bond.cutoff == 0.0 && bond.cutoff_gradient == 0.0 {
                continue;
            }

            let screening_ij = screening_factor(bond_ij);
            let screening_ji = screening_factor(bond.reverse);
            let first = bond.first_element;
            let second = bond.second_element;

            let (repulsive, repulsive_gradient) = functions.repulsive(first, second, bond.distance);
            let (attractive, attractive_gradient) = functions.attractive(first, second, bond.distance);

            let bond_order = bond_orders[bond_ij];
            let mean_bond_order = 0.5 * (bond_order.value + bond_orders[bond.reverse].value);
            let pair = repulsive + mean_bond_order * attractive;

            let energy = 0.5 * weight * bond.cutoff * screening_ij * pair;
            output[local_ij].energy = energy;
            output[local_ij].screening_gradient += 0.5 * weight * bond.cutoff * pair;
            accumulator.add_energy(center, energy);

            let pair_gradient = 0.5 * weight * screening_ij * (
                bond.cutoff_gradient * pair + bond.cutoff * (repulsive_gradient + mean_bond_order * attractive_gradient)
            );
            accumulator.deposit(center, bond.second, bond.vector, pair_gradient * bond.direction);

            // b_ij enters the energy of both i -> j and j -> i
            let bond_order_gradient = 0.25 * bond.cutoff * attractive * (
                weight * screening_ij + weights[bond.second] * screening_ji
            );
            let coefficient = bond_order_gradient * bond_order.derivative;
            if coefficient == 0.0 {
                continue;
            }

            let u_ij = bond.direction;
            for (local_ik, bond_ik) in range.clone().enumerate() {
                if bond_ik == bond_ij {
                    continue;
                }

                let other = &all_bonds[bond_ik];
                let screening_ik = screening_factor(bond_ik);
                if !contributes_to_bond_order(other, screening_ik) {
                    continue;
                }

                let triplet = Triplet::new(functions, bond, other);
                let u_ik = other.direction;
                let cos_gradient_ij = (u_ik - triplet.cos_theta * u_ij) / bond.distance;
                let cos_gradient_ik = (u_ij - triplet.cos_theta * u_ik) / other.distance;

                let cutoff_ik = other.bond_order_cutoff;
                let scale = coefficient * screening_ik;

                let gradient_ij = scale * cutoff_ik * (
                    triplet.angular_gradient * triplet.length * cos_gradient_ij
                    + triplet.angular * triplet.length_gradient_ij * u_ij
                );
                let gradient_ik = scale * (
                    triplet.angular_gradient * triplet.length * cutoff_ik * cos_gradient_ik
                    + triplet.angular * (
                        triplet.length_gradient_ik * cutoff_ik
                        + triplet.length * other.bond_order_cutoff_gradient
                    ) * u_ik
                );

                accumulator.deposit(center, bond.second, bond.vector, gradient_ij);
                accumulator.deposit(center, other.second, other.vector, gradient_ik);

                output[local_ik].screening_gradient += coefficient * triplet.angular * triplet.length * cutoff_ik;
            }
        }
    });
}

/// Second pass of the accumulation: forces coming from the dependency of the
/// screening factors on the position of the screening atoms.
#[time_graph::instrument(name = "forces::accumulate_screening")]
pub(crate) fn accumulate_screening(
    bonds: &BondList,
    screening: &ScreeningList,
    bond_energies: &[BondEnergy],
    accumulators: &Accumulators,
) {
    let all_bonds = bonds.bonds();
    let all_records = screening.records();

    (0..bonds.atoms_count()).into_par_iter().for_each(|center| {
        let range = bonds.atom_bonds(center);
        if range.is_empty() {
            return;
        }

        let mut accumulator = accumulators.local();
        // products of the factors of all records after a given one
        let mut suffix = Vec::new();
        for bond_ij in range {
            let screening_gradient = bond_energies[bond_ij].screening_gradient;
            let records = &all_records[screening.bond_records(bond_ij)];
            if screening_gradient == 0.0 || records.is_empty() {
                continue;
            }

            suffix.clear();
            suffix.resize(records.len() + 1, 1.0);
            for (index, record) in records.iter().enumerate().rev() {
                suffix[index] = suffix[index + 1] * record.factor;
            }

            let bond = &all_bonds[bond_ij];
            let mut prefix = 1.0;
            for (index, record) in records.iter().enumerate() {
                let scale = screening_gradient * prefix * suffix[index + 1];
                accumulator.deposit(center, bond.second, bond.vector, scale * record.gradient_ij);
                accumulator.deposit(center, record.atom, record.r_ik, scale * record.gradient_ik);
                accumulator.deposit(bond.second, record.atom, record.r_jk, scale * record.gradient_jk);
                prefix *= record.factor;
            }
        }
    });
}
