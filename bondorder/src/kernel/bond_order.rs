use rayon::prelude::*;

use crate::potentials::PotentialFunctions;

use super::bonds::{Bond, BondList};
use super::split_by_offsets;

/// Bond order of a single directed bond
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BondOrder {
    /// value of the three-body sum `z_ij`
    pub z: f64,
    /// bond order `b_ij = B(z_ij)`
    pub value: f64,
    /// derivative of the bond order with respect to `z_ij`
    pub derivative: f64,
}

/// Contribution of bond `i -> k` to the three-body sum of bond `i -> j`,
/// excluding the cutoff and screening of the `i -> k` bond
#[derive(Debug, Clone, Copy)]
pub(crate) struct Triplet {
    pub cos_theta: f64,
    pub angular: f64,
    pub angular_gradient: f64,
    pub length: f64,
    pub length_gradient_ij: f64,
    pub length_gradient_ik: f64,
}

impl Triplet {
    #[inline]
    pub(crate) fn new(functions: &dyn PotentialFunctions, bond_ij: &Bond, bond_ik: &Bond) -> Triplet {
        let center = bond_ij.first_element;
        let cos_theta = bond_ij.direction * bond_ik.direction;
        // rounding can push the cosine slightly outside of [-1, 1] for
        // collinear atoms
        let cos_theta = f64::clamp(cos_theta, -1.0, 1.0);

        let (angular, angular_gradient) = functions.angular(
            center, bond_ij.second_element, bond_ik.second_element, cos_theta
        );
        let (length, length_gradient_ij, length_gradient_ik) = functions.length_term(
            center, bond_ij.second_element, bond_ik.second_element, bond_ij.distance, bond_ik.distance
        );

        Triplet {
            cos_theta,
            angular,
            angular_gradient,
            length,
            length_gradient_ij,
            length_gradient_ik,
        }
    }
}

/// Check if a bond can contribute to the bond order sums of other bonds
#[inline]
pub(crate) fn contributes_to_bond_order(bond: &Bond, screening: f64) -> bool {
    let in_range = bond.bond_order_cutoff != 0.0 || bond.bond_order_cutoff_gradient != 0.0;
    return in_range && screening != 0.0;
}

/// Evaluate the bond order of all bonds in `bonds`, storing the results in
/// `bond_orders`. `screening` contains the screening factor of all bonds, if
/// screening is enabled.
#[time_graph::instrument(name = "bond_order::evaluate")]
pub(crate) fn evaluate(
    functions: &dyn PotentialFunctions,
    bonds: &BondList,
    screening: Option<&[f64]>,
    bond_orders: &mut Vec<BondOrder>,
) {
    let all_bonds = bonds.bonds();
    let screening_factor = |bond: usize| screening.map_or(1.0, |factors| factors[bond]);

    bond_orders.clear();
    bond_orders.resize(all_bonds.len(), BondOrder::default());

    split_by_offsets(bond_orders, bonds.offsets()).into_par_iter().enumerate().for_each(|(center, output)| {
        let range = bonds.atom_bonds(center);
        for (bond_ij, output) in range.clone().zip(output.iter_mut()) {
            let bond = &all_bonds[bond_ij];

            let mut z = 0.0;
            for bond_ik in range.clone() {
                if bond_ik == bond_ij {
                    continue;
                }

                let other = &all_bonds[bond_ik];
                let screening_ik = screening_factor(bond_ik);
                if !contributes_to_bond_order(other, screening_ik) {
                    continue;
                }

                let triplet = Triplet::new(functions, bond, other);
                z += triplet.angular * triplet.length * other.bond_order_cutoff * screening_ik;
            }

            let (value, derivative) = functions.bond_order(bond.first_element, bond.second_element, z);
            *output = BondOrder { z, value, derivative };
        }
    });
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::System;
    use crate::potentials::{Tersoff, TersoffParameters};
    use crate::systems::test_utils::{test_system, trimer};

    fn compute_bond_orders(system: &mut crate::SimpleSystem) -> (BondList, Vec<BondOrder>) {
        let tersoff = Tersoff::new(TersoffParameters::silicon()).unwrap();
        system.compute_neighbors(3.0).unwrap();

        let elements = vec![0; system.size().unwrap()];
        let mut bonds = BondList::new();
        bonds.start(16, usize::MAX, 10);
        bonds.build(&tersoff, &*system, &elements, None).unwrap();

        let mut bond_orders = Vec::new();
        evaluate(&tersoff, &bonds, None, &mut bond_orders);
        return (bonds, bond_orders);
    }

    #[test]
    fn diamond() {
        let mut system = test_system("Si-diamond");
        let (bonds, bond_orders) = compute_bond_orders(&mut system);
        assert_eq!(bond_orders.len(), bonds.len());

        // all bonds in the perfect crystal have the same bond order, with
        // three neighbors at the tetrahedral angle
        let tersoff = Tersoff::new(TersoffParameters::silicon()).unwrap();
        let (g, _) = tersoff.angular(0, 0, 0, -1.0 / 3.0);
        let (expected, _) = tersoff.bond_order(0, 0, 3.0 * g);
        for bond_order in &bond_orders {
            assert_relative_eq!(bond_order.z, 3.0 * g, max_relative = 1e-10);
            assert_relative_eq!(bond_order.value, expected, max_relative = 1e-10);
        }
    }

    #[test]
    fn isolated_bond() {
        let mut system = test_system("Si2");
        let (bonds, bond_orders) = compute_bond_orders(&mut system);
        assert_eq!(bonds.len(), 2);
        for bond_order in &bond_orders {
            assert_eq!(bond_order.z, 0.0);
            assert_eq!(bond_order.value, 1.0);
        }
    }

    #[test]
    fn angle_dependence() {
        // for cos θ < h, the Tersoff angular term increases with the angle, so
        // the bond order decreases when opening the angle towards 180°
        let tersoff = Tersoff::new(TersoffParameters::silicon()).unwrap();
        let mut previous = 0.0;
        for step in 0..=10 {
            let theta = 0.72 * std::f64::consts::PI + 0.028 * std::f64::consts::PI * step as f64;
            let (_, angular_gradient) = tersoff.angular(0, 0, 0, f64::cos(theta));
            assert!(angular_gradient < 0.0);

            let mut system = trimer(14, 2.3, 2.3, theta);
            let (bonds, bond_orders) = compute_bond_orders(&mut system);

            let bond = bonds.atom_bonds(0).find(|&b| bonds.bonds()[b].second == 1).unwrap();
            assert!(bond_orders[bond].z > previous);
            previous = bond_orders[bond].z;
        }
    }
}
